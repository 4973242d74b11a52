//! Tests for schema introspection of the migrated target database.

use keydate_sync::db::Database;

/// Helper to create a fresh in-memory database for testing.
fn setup_db() -> Database {
    Database::open_in_memory().expect("Failed to create in-memory database")
}

#[test]
fn migrations_create_all_target_tables() {
    let db = setup_db();
    let schema = db.get_schema().expect("Failed to get schema");

    let names: Vec<&str> = schema.tables.iter().map(|t| t.name.as_str()).collect();
    assert_eq!(names, vec!["base_plan", "key_dates", "project", "version"]);
}

#[test]
fn refinery_bookkeeping_is_hidden() {
    let db = setup_db();
    let schema = db.get_schema().expect("Failed to get schema");
    assert!(schema.tables.iter().all(|t| !t.name.starts_with("refinery_")));
}

#[test]
fn base_number_is_unique_per_project() {
    let db = setup_db();
    let schema = db.get_schema().expect("Failed to get schema");

    let base_plan = schema.table("base_plan").expect("base_plan table");
    assert!(base_plan.has_unique(&["project_id", "base_number"]));
    assert!(!base_plan.has_unique(&["base_number"]));

    let project = schema.table("project").expect("project table");
    assert!(project.has_unique(&["uuid"]));
}

#[test]
fn column_details_are_reported() {
    let db = setup_db();
    let schema = db.get_schema().expect("Failed to get schema");

    let key_dates = schema.table("key_dates").expect("key_dates table");
    let id = key_dates.column("id").expect("id column");
    assert!(id.primary_key);
    assert_eq!(id.data_type, "INTEGER");

    let name = key_dates.column("name").expect("name column");
    assert!(!name.nullable);

    let updated = key_dates.column("updated_at").expect("updated_at column");
    assert!(updated.nullable);
}

#[test]
fn versions_reference_parent_and_base_plan() {
    let db = setup_db();
    let schema = db.get_schema().expect("Failed to get schema");

    let version = schema.table("version").expect("version table");
    let targets: Vec<(&str, &str)> = version
        .foreign_keys
        .iter()
        .map(|fk| (fk.from_column.as_str(), fk.to_table.as_str()))
        .collect();
    assert!(targets.contains(&("parent_version_id", "version")));
    assert!(targets.contains(&("base_plan_id", "base_plan")));
    assert!(targets.contains(&("project_id", "project")));
}
