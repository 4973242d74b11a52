//! Key date rows: inserts, in-place updates and per-version / per-base-plan reads.

use super::uuid_named;
use crate::error::MigrationResult;
use crate::mapping::required;
use crate::types::{KeyDates, NewKeyDates};
use rusqlite::{Connection, Row, params};
use std::collections::HashMap;
use uuid::Uuid;

pub fn parse_key_dates_row(row: &Row) -> rusqlite::Result<KeyDates> {
    Ok(KeyDates {
        id: row.get("id")?,
        name: row.get("name")?,
        task_start_date: row.get("task_start_date")?,
        task_finish_date: row.get("task_finish_date")?,
        task_uuid: uuid_named(row, "task_uuid")?,
        task_name: row.get("task_name")?,
        version_id: row.get("version_id")?,
        base_plan_id: row.get("base_plan_id")?,
        project_id: row.get("project_id")?,
        updated_at: row.get("updated_at")?,
    })
}

pub fn insert_key_dates(conn: &Connection, draft: &NewKeyDates) -> MigrationResult<KeyDates> {
    const ENTITY: &str = "KeyDates";
    let row = KeyDates {
        id: 0,
        name: required(draft.name.clone(), ENTITY, "name")?,
        task_start_date: required(draft.task_start_date, ENTITY, "task_start_date")?,
        task_finish_date: required(draft.task_finish_date, ENTITY, "task_finish_date")?,
        task_uuid: required(draft.task_uuid, ENTITY, "task_uuid")?,
        task_name: draft.task_name.clone(),
        version_id: required(draft.version_id, ENTITY, "version_id")?,
        base_plan_id: draft.base_plan_id,
        project_id: required(draft.project_id, ENTITY, "project_id")?,
        updated_at: draft.updated_at,
    };

    conn.execute(
        "INSERT INTO key_dates (
            name, task_start_date, task_finish_date, task_uuid, task_name,
            version_id, base_plan_id, project_id, updated_at
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
        params![
            row.name,
            row.task_start_date,
            row.task_finish_date,
            row.task_uuid.to_string(),
            row.task_name,
            row.version_id,
            row.base_plan_id,
            row.project_id,
            row.updated_at,
        ],
    )?;

    Ok(KeyDates {
        id: conn.last_insert_rowid(),
        ..row
    })
}

/// Persist the mutable columns of an existing row.
pub fn update_key_dates(conn: &Connection, row: &KeyDates) -> MigrationResult<()> {
    conn.execute(
        "UPDATE key_dates
         SET name = ?1, task_start_date = ?2, task_finish_date = ?3,
             task_uuid = ?4, task_name = ?5, updated_at = ?6
         WHERE id = ?7",
        params![
            row.name,
            row.task_start_date,
            row.task_finish_date,
            row.task_uuid.to_string(),
            row.task_name,
            row.updated_at,
            row.id,
        ],
    )?;
    Ok(())
}

pub fn list_for_version(conn: &Connection, version_id: i64) -> MigrationResult<Vec<KeyDates>> {
    let mut stmt = conn.prepare("SELECT * FROM key_dates WHERE version_id = ?1 ORDER BY id")?;
    let rows = stmt
        .query_map(params![version_id], parse_key_dates_row)?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(rows)
}

pub fn list_for_base_plan(conn: &Connection, base_plan_id: i64) -> MigrationResult<Vec<KeyDates>> {
    let mut stmt = conn.prepare("SELECT * FROM key_dates WHERE base_plan_id = ?1 ORDER BY id")?;
    let rows = stmt
        .query_map(params![base_plan_id], parse_key_dates_row)?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(rows)
}

/// Live row per task UUID within a base plan: the most recently inserted one.
pub fn live_for_base_plan(conn: &Connection, base_plan_id: i64) -> MigrationResult<HashMap<Uuid, KeyDates>> {
    let mut live = HashMap::new();
    for row in list_for_base_plan(conn, base_plan_id)? {
        live.insert(row.task_uuid, row);
    }
    Ok(live)
}
