//! Reconciliation of a project that was migrated by an earlier run.

use super::ChangeSummary;
use super::create::{add_key_dates, create_group, create_version_with_tasks};
use super::groups::{group_baselines, key_date_baselines, tasks_by_number};
use crate::db::{base_plans, key_dates, versions};
use crate::error::MigrationResult;
use crate::mapping::map_onto;
use crate::source::{SourceProject, SourceTask};
use crate::types::{Project, Version};
use chrono::NaiveDateTime;
use rusqlite::Transaction;
use std::collections::HashMap;
use tracing::{debug, info, warn};
use uuid::Uuid;

pub(crate) fn update_project(
    tx: &Transaction<'_>,
    project: &Project,
    source: &SourceProject,
    now: NaiveDateTime,
) -> MigrationResult<ChangeSummary> {
    let mut summary = ChangeSummary::default();
    let baselines = key_date_baselines(source);
    let last_version = versions::get_last_version(tx, project.id)?;

    let known = base_plans::base_numbers(tx, project.id)?;
    for group in group_baselines(&baselines, |n| !known.contains(&n)) {
        info!(
            project = %project.uuid,
            base_number = group.key.number,
            "new baseline detected"
        );
        create_group(tx, project, &group, now, &mut summary)?;
    }

    for (number, tasks) in tasks_by_number(&baselines) {
        sync_baseline_tasks(tx, project, number, &tasks, now, &mut summary)?;
    }

    match last_version {
        Some(last) => detect_drift(tx, project, source, &last, now, &mut summary)?,
        None => warn!(
            project = %project.uuid,
            "project has no versions; skipping drift detection"
        ),
    }

    Ok(summary)
}

/// Compare one baseline's source tasks with the live key dates of its base plan.
fn sync_baseline_tasks(
    tx: &Transaction<'_>,
    project: &Project,
    number: i64,
    tasks: &[&SourceTask],
    now: NaiveDateTime,
    summary: &mut ChangeSummary,
) -> MigrationResult<()> {
    let base_plan = base_plans::get_base_plan(tx, project.id, number)?;
    let root = versions::get_main_version(tx, project.id, base_plan.id)?;
    let mut live = key_dates::live_for_base_plan(tx, base_plan.id)?;

    let mut touched = false;
    for task in tasks {
        match live.get_mut(&task.uid) {
            Some(row) if same_dates(task, row.task_start_date, row.task_finish_date) => {}
            Some(row) => {
                debug!(
                    project = %project.uuid,
                    task = %task.uid,
                    base_number = number,
                    "key date moved"
                );
                map_onto(row, *task)?;
                row.updated_at = Some(now);
                key_dates::update_key_dates(tx, row)?;
                summary.key_dates_updated += 1;
            }
            None => {
                debug!(
                    project = %project.uuid,
                    task = %task.uid,
                    base_number = number,
                    "task joined baseline"
                );
                add_key_dates(
                    tx,
                    task,
                    project.id,
                    Some(base_plan.id),
                    root.id,
                    now,
                    summary,
                )?;
                touched = true;
            }
        }
    }

    if touched {
        base_plans::touch_base_plan(tx, base_plan.id, now)?;
    }
    Ok(())
}

/// Snapshot the project's key-date tasks into a child of `last` when any of
/// them is missing from it or carries different dates.
fn detect_drift(
    tx: &Transaction<'_>,
    project: &Project,
    source: &SourceProject,
    last: &Version,
    now: NaiveDateTime,
    summary: &mut ChangeSummary,
) -> MigrationResult<()> {
    let linked: HashMap<Uuid, (NaiveDateTime, NaiveDateTime)> = key_dates::list_for_version(tx, last.id)?
        .into_iter()
        .map(|row| (row.task_uuid, row.dates()))
        .collect();

    let current: Vec<&SourceTask> = source.key_date_tasks().collect();
    let drifted = current.iter().find(|task| match linked.get(&task.uid) {
        Some((start, finish)) => !same_dates(task, *start, *finish),
        None => true,
    });

    if let Some(task) = drifted {
        info!(
            project = %project.uuid,
            task = %task.uid,
            parent = last.id,
            tasks = current.len(),
            "schedule drift detected; creating version"
        );
        create_version_with_tasks(
            tx,
            project.id,
            last.base_plan_id,
            Some(last.id),
            &current,
            now,
            summary,
        )?;
    }
    Ok(())
}

fn same_dates(task: &SourceTask, start: NaiveDateTime, finish: NaiveDateTime) -> bool {
    task.start_date == Some(start) && task.finish_date == Some(finish)
}
