//! Project lookups and inserts.

use super::uuid_named;
use crate::error::MigrationResult;
use crate::mapping::required;
use crate::types::{NewProject, Project};
use rusqlite::{Connection, OptionalExtension, Row, params};
use uuid::Uuid;

pub fn parse_project_row(row: &Row) -> rusqlite::Result<Project> {
    Ok(Project {
        id: row.get("id")?,
        name: row.get("name")?,
        uuid: uuid_named(row, "uuid")?,
        is_active: row.get("is_active")?,
        start_date: row.get("start_date")?,
        finish_date: row.get("finish_date")?,
    })
}

/// Find the migrated project for a legacy project UUID.
pub fn exists_project(conn: &Connection, uuid: Uuid) -> MigrationResult<Option<Project>> {
    let project = conn
        .query_row(
            "SELECT * FROM project WHERE uuid = ?1",
            params![uuid.to_string()],
            parse_project_row,
        )
        .optional()?;
    Ok(project)
}

pub fn get_project(conn: &Connection, id: i64) -> MigrationResult<Option<Project>> {
    let project = conn
        .query_row("SELECT * FROM project WHERE id = ?1", params![id], parse_project_row)
        .optional()?;
    Ok(project)
}

pub fn list_projects(conn: &Connection) -> MigrationResult<Vec<Project>> {
    let mut stmt = conn.prepare("SELECT * FROM project ORDER BY id")?;
    let projects = stmt
        .query_map([], parse_project_row)?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(projects)
}

pub fn insert_project(conn: &Connection, draft: &NewProject) -> MigrationResult<Project> {
    let name = required(draft.name.clone(), "Project", "name")?;
    let uuid = required(draft.uuid, "Project", "uuid")?;

    conn.execute(
        "INSERT INTO project (name, uuid, is_active, start_date, finish_date)
         VALUES (?1, ?2, ?3, ?4, ?5)",
        params![
            name,
            uuid.to_string(),
            draft.is_active,
            draft.start_date,
            draft.finish_date,
        ],
    )?;

    Ok(Project {
        id: conn.last_insert_rowid(),
        name,
        uuid,
        is_active: draft.is_active,
        start_date: draft.start_date,
        finish_date: draft.finish_date,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::Database;
    use crate::error::MigrationError;
    use crate::mapping::MappingError;

    fn draft(uuid: Uuid) -> NewProject {
        NewProject {
            name: Some("Terminal".into()),
            uuid: Some(uuid),
            ..Default::default()
        }
    }

    #[test]
    fn insert_then_lookup_by_uuid() {
        let db = Database::open_in_memory().unwrap();
        db.with_conn(|conn| {
            let uuid = Uuid::from_u128(11);
            assert!(exists_project(conn, uuid)?.is_none());

            let created = insert_project(conn, &draft(uuid))?;
            let found = exists_project(conn, uuid)?.unwrap();
            assert_eq!(found, created);
            assert!(found.is_active);
            assert_eq!(list_projects(conn)?.len(), 1);
            assert_eq!(get_project(conn, created.id)?, Some(created));
            Ok::<_, MigrationError>(())
        })
        .unwrap();
    }

    #[test]
    fn duplicate_uuid_is_rejected() {
        let db = Database::open_in_memory().unwrap();
        let uuid = Uuid::from_u128(12);
        db.with_conn(|conn| insert_project(conn, &draft(uuid))).unwrap();
        let err = db
            .with_conn(|conn| insert_project(conn, &draft(uuid)))
            .unwrap_err();
        assert!(matches!(err, MigrationError::Database(_)));
    }

    #[test]
    fn missing_name_is_a_mapping_error() {
        let db = Database::open_in_memory().unwrap();
        let err = db
            .with_conn(|conn| {
                insert_project(
                    conn,
                    &NewProject {
                        uuid: Some(Uuid::from_u128(13)),
                        ..Default::default()
                    },
                )
            })
            .unwrap_err();
        assert!(matches!(
            err,
            MigrationError::Mapping(MappingError::MissingField { field: "name", .. })
        ));
    }
}
