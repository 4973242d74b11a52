//! Version lookups and inserts.

use crate::error::{MigrationError, MigrationResult};
use crate::types::{NewVersion, Version};
use rusqlite::{Connection, OptionalExtension, Row, params};

pub fn parse_version_row(row: &Row) -> rusqlite::Result<Version> {
    Ok(Version {
        id: row.get("id")?,
        migration_date: row.get("migration_date")?,
        base_plan_id: row.get("base_plan_id")?,
        project_id: row.get("project_id")?,
        parent_version_id: row.get("parent_version_id")?,
    })
}

/// The most recently created version of a project, if any.
pub fn get_last_version(conn: &Connection, project_id: i64) -> MigrationResult<Option<Version>> {
    let version = conn
        .query_row(
            "SELECT * FROM version WHERE project_id = ?1 ORDER BY id DESC LIMIT 1",
            params![project_id],
            parse_version_row,
        )
        .optional()?;
    Ok(version)
}

/// The parentless root version of a base plan.
pub fn get_main_version(conn: &Connection, project_id: i64, base_plan_id: i64) -> MigrationResult<Version> {
    conn.query_row(
        "SELECT * FROM version
         WHERE project_id = ?1 AND base_plan_id = ?2 AND parent_version_id IS NULL
         ORDER BY id LIMIT 1",
        params![project_id, base_plan_id],
        parse_version_row,
    )
    .optional()?
    .ok_or(MigrationError::RootVersionNotFound {
        project_id,
        base_plan_id,
    })
}

pub fn list_versions_for_base_plan(conn: &Connection, base_plan_id: i64) -> MigrationResult<Vec<Version>> {
    let mut stmt = conn.prepare("SELECT * FROM version WHERE base_plan_id = ?1 ORDER BY id")?;
    let versions = stmt
        .query_map(params![base_plan_id], parse_version_row)?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(versions)
}

pub fn insert_version(conn: &Connection, new: &NewVersion) -> MigrationResult<Version> {
    conn.execute(
        "INSERT INTO version (migration_date, base_plan_id, project_id, parent_version_id)
         VALUES (?1, ?2, ?3, ?4)",
        params![
            new.migration_date,
            new.base_plan_id,
            new.project_id,
            new.parent_version_id,
        ],
    )?;

    Ok(Version {
        id: conn.last_insert_rowid(),
        migration_date: new.migration_date,
        base_plan_id: new.base_plan_id,
        project_id: new.project_id,
        parent_version_id: new.parent_version_id,
    })
}
