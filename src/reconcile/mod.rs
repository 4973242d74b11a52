//! Reconciliation of one legacy project against the target store.
//!
//! A project the target has never seen is created from its key-date baselines.
//! A known project is brought up to date: new baselines become base plans,
//! tasks that joined or moved within a baseline are merged into its base plan,
//! and any divergence from the most recent version is captured as a new child
//! version. Every write goes through the caller's transaction; committing or
//! rolling back is the caller's decision.

mod create;
mod existing;
pub mod groups;

use crate::db::projects;
use crate::error::MigrationResult;
use crate::source::SourceProject;
use chrono::NaiveDateTime;
use rusqlite::Transaction;
use serde::Serialize;
use tracing::{debug, info};

/// Rows written while reconciling one project.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ChangeSummary {
    pub base_plans_created: usize,
    pub versions_created: usize,
    pub key_dates_created: usize,
    pub key_dates_updated: usize,
}

impl ChangeSummary {
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

/// What happened to a project during a run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum ProjectOutcome {
    /// First migration of the project.
    Created(ChangeSummary),
    /// Known project with at least one change written.
    Updated(ChangeSummary),
    Unchanged,
    /// New project without any key-date baseline; nothing written.
    Skipped,
}

pub fn reconcile_project(
    tx: &Transaction<'_>,
    source: &SourceProject,
    now: NaiveDateTime,
) -> MigrationResult<ProjectOutcome> {
    match projects::exists_project(tx, source.uid)? {
        Some(project) => {
            debug!(project = %source.uid, id = project.id, "reconciling existing project");
            let summary = existing::update_project(tx, &project, source, now)?;
            if summary.is_empty() {
                Ok(ProjectOutcome::Unchanged)
            } else {
                info!(project = %source.uid, ?summary, "project updated");
                Ok(ProjectOutcome::Updated(summary))
            }
        }
        None => create_new_project(tx, source, now),
    }
}

fn create_new_project(
    tx: &Transaction<'_>,
    source: &SourceProject,
    now: NaiveDateTime,
) -> MigrationResult<ProjectOutcome> {
    let baselines = groups::key_date_baselines(source);
    if baselines.is_empty() {
        debug!(project = %source.uid, "no key-date baselines; skipping");
        return Ok(ProjectOutcome::Skipped);
    }

    let mut summary = ChangeSummary::default();
    let project = create::create_project(tx, source)?;
    for group in groups::group_baselines(&baselines, |_| true) {
        create::create_group(tx, &project, &group, now, &mut summary)?;
    }

    info!(project = %source.uid, id = project.id, ?summary, "project created");
    Ok(ProjectOutcome::Created(summary))
}
