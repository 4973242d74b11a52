//! Creation of projects, base plans, versions and key dates.

use super::ChangeSummary;
use super::groups::BaselineGroup;
use crate::db::{base_plans, key_dates, projects, versions};
use crate::error::MigrationResult;
use crate::mapping::{FieldValue, map_new};
use crate::source::{SourceProject, SourceTask};
use crate::types::{BasePlan, NewBasePlan, NewKeyDates, NewProject, NewVersion, Project, Version};
use chrono::NaiveDateTime;
use rusqlite::Transaction;
use tracing::debug;

pub(crate) fn create_project(tx: &Transaction<'_>, source: &SourceProject) -> MigrationResult<Project> {
    let draft: NewProject = map_new(source, vec![])?;
    let project = projects::insert_project(tx, &draft)?;
    debug!(project = %project.uuid, id = project.id, "created project");
    Ok(project)
}

/// Create a version and one key-dates row per task under it.
pub(crate) fn create_version_with_tasks(
    tx: &Transaction<'_>,
    project_id: i64,
    base_plan_id: Option<i64>,
    parent_version_id: Option<i64>,
    tasks: &[&SourceTask],
    now: NaiveDateTime,
    summary: &mut ChangeSummary,
) -> MigrationResult<Version> {
    let version = versions::insert_version(
        tx,
        &NewVersion {
            migration_date: now,
            base_plan_id,
            project_id,
            parent_version_id,
        },
    )?;
    summary.versions_created += 1;

    for task in tasks {
        add_key_dates(tx, task, project_id, base_plan_id, version.id, now, summary)?;
    }

    debug!(
        version = version.id,
        parent = ?parent_version_id,
        tasks = tasks.len(),
        "created version"
    );
    Ok(version)
}

/// Map a source task onto a new key-dates row attached to `version_id`,
/// stamped as last updated at `now`.
pub(crate) fn add_key_dates(
    tx: &Transaction<'_>,
    task: &SourceTask,
    project_id: i64,
    base_plan_id: Option<i64>,
    version_id: i64,
    now: NaiveDateTime,
    summary: &mut ChangeSummary,
) -> MigrationResult<()> {
    let draft: NewKeyDates = map_new(
        task,
        vec![
            ("project_id", FieldValue::Int(project_id)),
            ("base_plan_id", base_plan_id.into()),
            ("version_id", FieldValue::Int(version_id)),
            ("updated_at", FieldValue::DateTime(now)),
        ],
    )?;
    key_dates::insert_key_dates(tx, &draft)?;
    summary.key_dates_created += 1;
    Ok(())
}

/// Materialize one baseline group: base plan, root version and its key dates.
pub(crate) fn create_group(
    tx: &Transaction<'_>,
    project: &Project,
    group: &BaselineGroup<'_>,
    now: NaiveDateTime,
    summary: &mut ChangeSummary,
) -> MigrationResult<BasePlan> {
    let (start, finish) = group.date_range(project.uuid)?;
    let draft: NewBasePlan = map_new(
        group.first,
        vec![
            ("created_at", FieldValue::Date(group.key.earliest_date)),
            ("project_id", FieldValue::Int(project.id)),
            ("base_plan_start_date", FieldValue::DateTime(start)),
            ("base_plan_finish_date", FieldValue::DateTime(finish)),
            ("updated_at", FieldValue::DateTime(now)),
        ],
    )?;
    let base_plan = base_plans::insert_base_plan(tx, &draft)?;
    summary.base_plans_created += 1;

    debug!(
        project = %project.uuid,
        base_number = base_plan.base_number,
        created_at = %base_plan.created_at,
        "created base plan"
    );

    create_version_with_tasks(
        tx,
        project.id,
        Some(base_plan.id),
        None,
        &group.tasks,
        now,
        summary,
    )?;
    Ok(base_plan)
}
