//! Read-only views over migrated data for the HTTP API and CLI listings.

use super::{Database, base_plans, key_dates, projects, versions};
use crate::error::MigrationResult;
use crate::types::{BasePlan, KeyDates, Project, Version};
use serde::Serialize;

/// A base plan with its versions (no key dates).
#[derive(Debug, Clone, Serialize)]
pub struct BasePlanVersions {
    #[serde(flatten)]
    pub base_plan: BasePlan,
    pub versions: Vec<Version>,
}

/// A project with each base plan's version chain.
#[derive(Debug, Clone, Serialize)]
pub struct ProjectOverview {
    #[serde(flatten)]
    pub project: Project,
    pub base_plans: Vec<BasePlanVersions>,
}

/// A version together with the key dates it captured.
#[derive(Debug, Clone, Serialize)]
pub struct VersionDetail {
    #[serde(flatten)]
    pub version: Version,
    pub tasks: Vec<KeyDates>,
}

/// A base plan with its key dates and every version's key dates.
#[derive(Debug, Clone, Serialize)]
pub struct BasePlanDetail {
    #[serde(flatten)]
    pub base_plan: BasePlan,
    pub tasks: Vec<KeyDates>,
    pub versions: Vec<VersionDetail>,
}

impl Database {
    /// All projects with their base plans and versions.
    pub fn project_overviews(&self) -> MigrationResult<Vec<ProjectOverview>> {
        self.with_conn(|conn| {
            let mut out = Vec::new();
            for project in projects::list_projects(conn)? {
                let mut plans = Vec::new();
                for base_plan in base_plans::list_base_plans(conn, project.id)? {
                    let versions = versions::list_versions_for_base_plan(conn, base_plan.id)?;
                    plans.push(BasePlanVersions {
                        base_plan,
                        versions,
                    });
                }
                out.push(ProjectOverview {
                    project,
                    base_plans: plans,
                });
            }
            Ok(out)
        })
    }

    /// Base plans of one project in full detail. `None` when the project is unknown.
    pub fn base_plan_details(&self, project_id: i64) -> MigrationResult<Option<Vec<BasePlanDetail>>> {
        self.with_conn(|conn| {
            if projects::get_project(conn, project_id)?.is_none() {
                return Ok(None);
            }

            let mut out = Vec::new();
            for base_plan in base_plans::list_base_plans(conn, project_id)? {
                let tasks = key_dates::list_for_base_plan(conn, base_plan.id)?;
                let mut details = Vec::new();
                for version in versions::list_versions_for_base_plan(conn, base_plan.id)? {
                    let tasks = key_dates::list_for_version(conn, version.id)?;
                    details.push(VersionDetail { version, tasks });
                }
                out.push(BasePlanDetail {
                    base_plan,
                    tasks,
                    versions: details,
                });
            }
            Ok(Some(out))
        })
    }
}
