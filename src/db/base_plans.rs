//! Base plan lookups and inserts.

use crate::error::{MigrationError, MigrationResult};
use crate::mapping::required;
use crate::types::{BasePlan, NewBasePlan};
use chrono::NaiveDateTime;
use rusqlite::{Connection, OptionalExtension, Row, params};

pub fn parse_base_plan_row(row: &Row) -> rusqlite::Result<BasePlan> {
    Ok(BasePlan {
        id: row.get("id")?,
        created_at: row.get("created_at")?,
        base_number: row.get("base_number")?,
        project_id: row.get("project_id")?,
        base_plan_start_date: row.get("base_plan_start_date")?,
        base_plan_finish_date: row.get("base_plan_finish_date")?,
        updated_at: row.get("updated_at")?,
    })
}

/// Fetch a base plan the caller knows exists; absence is an invariant violation.
pub fn get_base_plan(conn: &Connection, project_id: i64, base_number: i64) -> MigrationResult<BasePlan> {
    conn.query_row(
        "SELECT * FROM base_plan WHERE project_id = ?1 AND base_number = ?2",
        params![project_id, base_number],
        parse_base_plan_row,
    )
    .optional()?
    .ok_or(MigrationError::BasePlanNotFound {
        project_id,
        base_number,
    })
}

pub fn list_base_plans(conn: &Connection, project_id: i64) -> MigrationResult<Vec<BasePlan>> {
    let mut stmt = conn.prepare("SELECT * FROM base_plan WHERE project_id = ?1 ORDER BY id")?;
    let plans = stmt
        .query_map(params![project_id], parse_base_plan_row)?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(plans)
}

/// Baseline numbers already migrated for a project.
pub fn base_numbers(conn: &Connection, project_id: i64) -> MigrationResult<Vec<i64>> {
    let mut stmt =
        conn.prepare("SELECT base_number FROM base_plan WHERE project_id = ?1 ORDER BY id")?;
    let numbers = stmt
        .query_map(params![project_id], |row| row.get(0))?
        .collect::<rusqlite::Result<Vec<i64>>>()?;
    Ok(numbers)
}

pub fn insert_base_plan(conn: &Connection, draft: &NewBasePlan) -> MigrationResult<BasePlan> {
    const ENTITY: &str = "BasePlan";
    let plan = BasePlan {
        id: 0,
        created_at: required(draft.created_at, ENTITY, "created_at")?,
        base_number: required(draft.base_number, ENTITY, "base_number")?,
        project_id: required(draft.project_id, ENTITY, "project_id")?,
        base_plan_start_date: required(draft.base_plan_start_date, ENTITY, "base_plan_start_date")?,
        base_plan_finish_date: required(draft.base_plan_finish_date, ENTITY, "base_plan_finish_date")?,
        updated_at: draft.updated_at,
    };

    conn.execute(
        "INSERT INTO base_plan (
            created_at, base_number, project_id,
            base_plan_start_date, base_plan_finish_date, updated_at
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        params![
            plan.created_at,
            plan.base_number,
            plan.project_id,
            plan.base_plan_start_date,
            plan.base_plan_finish_date,
            plan.updated_at,
        ],
    )?;

    Ok(BasePlan {
        id: conn.last_insert_rowid(),
        ..plan
    })
}

/// Stamp a base plan's last-updated timestamp.
pub fn touch_base_plan(conn: &Connection, base_plan_id: i64, now: NaiveDateTime) -> MigrationResult<()> {
    conn.execute(
        "UPDATE base_plan SET updated_at = ?1 WHERE id = ?2",
        params![now, base_plan_id],
    )?;
    Ok(())
}
