//! Migration runs: every legacy project reconciled in its own transaction.

use crate::db::Database;
use crate::error::{MigrationError, MigrationResult};
use crate::reconcile::{ChangeSummary, ProjectOutcome, reconcile_project};
use crate::source::{SourceProject, SourceReader};
use chrono::NaiveDateTime;
use serde::Serialize;
use std::sync::Arc;
use tracing::{error, info, warn};
use uuid::Uuid;

/// A project whose transaction was rolled back.
#[derive(Debug, Clone, Serialize)]
pub struct ProjectFailure {
    pub uuid: Uuid,
    pub name: Option<String>,
    pub error: String,
}

/// Outcome of one migration run.
#[derive(Debug, Clone, Default, Serialize)]
pub struct MigrationReport {
    pub started_at: Option<NaiveDateTime>,
    pub projects_seen: usize,
    pub created: usize,
    pub updated: usize,
    pub unchanged: usize,
    pub skipped: usize,
    pub changes: ChangeSummary,
    pub failed: Vec<ProjectFailure>,
}

impl MigrationReport {
    /// True when every project completed or was cleanly skipped.
    pub fn is_success(&self) -> bool {
        self.failed.is_empty()
    }

    fn record(&mut self, outcome: &ProjectOutcome) {
        let summary = match outcome {
            ProjectOutcome::Created(summary) => {
                self.created += 1;
                summary
            }
            ProjectOutcome::Updated(summary) => {
                self.updated += 1;
                summary
            }
            ProjectOutcome::Unchanged => {
                self.unchanged += 1;
                return;
            }
            ProjectOutcome::Skipped => {
                self.skipped += 1;
                return;
            }
        };
        self.changes.base_plans_created += summary.base_plans_created;
        self.changes.versions_created += summary.versions_created;
        self.changes.key_dates_created += summary.key_dates_created;
        self.changes.key_dates_updated += summary.key_dates_updated;
    }
}

/// Reconcile one project inside a fresh transaction, committing on success.
fn migrate_project(
    target: &Database,
    project: &SourceProject,
    now: NaiveDateTime,
) -> MigrationResult<ProjectOutcome> {
    target.with_conn_mut(|conn| {
        let tx = conn.transaction()?;
        let outcome = reconcile_project(&tx, project, now)?;
        tx.commit()?;
        Ok(outcome)
    })
}

/// Run a full migration. Only a failure to list source projects aborts the run;
/// per-project failures are rolled back, logged and reported.
pub fn run_migration(
    source: &dyn SourceReader,
    target: &Database,
    now: NaiveDateTime,
) -> MigrationResult<MigrationReport> {
    let projects = source.get_all_projects()?;
    info!(projects = projects.len(), "starting migration");

    let mut report = MigrationReport {
        started_at: Some(now),
        projects_seen: projects.len(),
        ..Default::default()
    };

    for project in &projects {
        match migrate_project(target, project, now) {
            Ok(outcome) => report.record(&outcome),
            Err(e) => {
                error!(project = %project.uid, error = %e, "project migration rolled back");
                report.failed.push(ProjectFailure {
                    uuid: project.uid,
                    name: project.name.clone(),
                    error: e.to_string(),
                });
            }
        }
    }

    if report.is_success() {
        info!(
            created = report.created,
            updated = report.updated,
            unchanged = report.unchanged,
            skipped = report.skipped,
            "migration finished"
        );
    } else {
        warn!(
            failed = report.failed.len(),
            projects = report.projects_seen,
            "migration finished with failures"
        );
    }
    Ok(report)
}

/// Run a migration on the blocking pool.
pub async fn run_migration_async(
    source: Arc<dyn SourceReader>,
    target: Database,
) -> MigrationResult<MigrationReport> {
    tokio::task::spawn_blocking(move || run_migration(source.as_ref(), &target, crate::db::now()))
        .await
        .map_err(|e| MigrationError::Aborted(e.to_string()))?
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::{SourceBaseline, SourceTask};
    use chrono::NaiveDate;

    fn ts(day: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 10, day)
            .unwrap()
            .and_hms_opt(14, 0, 0)
            .unwrap()
    }

    fn project(n: u128) -> SourceProject {
        let task = SourceTask::new(Uuid::from_u128(n * 100), "Commissioning", ts(2), ts(5))
            .with_key_date("Go-live");
        SourceProject::new(Uuid::from_u128(n), format!("Project {n}"))
            .with_task(task.clone())
            .with_baseline(SourceBaseline::new(0, ts(1), task))
    }

    struct Unreachable;

    impl SourceReader for Unreachable {
        fn get_all_projects(&self) -> MigrationResult<Vec<SourceProject>> {
            Err(MigrationError::InvalidSource("legacy store offline".into()))
        }
    }

    #[test]
    fn report_counts_outcomes() {
        let db = Database::open_in_memory().unwrap();
        let source = vec![project(1), project(2)];

        let first = run_migration(&source, &db, ts(10)).unwrap();
        assert!(first.is_success());
        assert_eq!(first.created, 2);
        assert_eq!(first.changes.key_dates_created, 2);

        let second = run_migration(&source, &db, ts(11)).unwrap();
        assert_eq!(second.unchanged, 2);
        assert!(second.changes.is_empty());
    }

    #[test]
    fn listing_failure_aborts_run() {
        let db = Database::open_in_memory().unwrap();
        assert!(run_migration(&Unreachable, &db, ts(10)).is_err());
    }

    #[tokio::test]
    async fn async_trigger_runs_on_blocking_pool() {
        let db = Database::open_in_memory().unwrap();
        let source: Arc<dyn SourceReader> = Arc::new(vec![project(1)]);
        let report = run_migration_async(source, db.clone()).await.unwrap();
        assert_eq!(report.created, 1);
        assert_eq!(db.table_counts().unwrap().projects, 1);
    }
}
