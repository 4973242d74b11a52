//! Output formatting utilities for markdown and JSON.

use crate::db::reports::{BasePlanDetail, ProjectOverview};
use crate::migrate::MigrationReport;
use crate::types::KeyDates;
use anyhow::Result;
use chrono::NaiveDateTime;
use clap::ValueEnum;
use serde::Serialize;

/// Output format for CLI listings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum OutputFormat {
    #[default]
    Json,
    #[value(alias = "md")]
    Markdown,
}

impl OutputFormat {
    /// Pretty JSON of `value`, or the markdown produced by `markdown`.
    pub fn render<T, F>(self, value: &T, markdown: F) -> Result<String>
    where
        T: Serialize + ?Sized,
        F: FnOnce(&T) -> String,
    {
        match self {
            OutputFormat::Json => Ok(serde_json::to_string_pretty(value)?),
            OutputFormat::Markdown => Ok(markdown(value)),
        }
    }
}

fn day(ts: NaiveDateTime) -> String {
    ts.format("%Y-%m-%d").to_string()
}

/// Format migrated projects with their base plans and version counts.
pub fn format_projects_markdown(projects: &[ProjectOverview]) -> String {
    let mut md = String::new();

    md.push_str(&format!("# Projects ({})\n\n", projects.len()));

    for overview in projects {
        let project = &overview.project;
        md.push_str(&format!("## {}\n", project.name));
        md.push_str(&format!("- **id**: {}\n", project.id));
        md.push_str(&format!("- **uuid**: `{}`\n", project.uuid));
        if let (Some(start), Some(finish)) = (project.start_date, project.finish_date) {
            md.push_str(&format!("- **schedule**: {} .. {}\n", day(start), day(finish)));
        }
        if !project.is_active {
            md.push_str("- **inactive**\n");
        }

        for entry in &overview.base_plans {
            let plan = &entry.base_plan;
            md.push_str(&format!(
                "- baseline {} (created {}): {} .. {}, {} version(s)\n",
                plan.base_number,
                plan.created_at,
                day(plan.base_plan_start_date),
                day(plan.base_plan_finish_date),
                entry.versions.len(),
            ));
        }
        md.push('\n');
    }

    md
}

fn format_key_date_line(row: &KeyDates) -> String {
    let task = row
        .task_name
        .as_deref()
        .map(|n| format!(" ({})", n))
        .unwrap_or_default();
    format!(
        "- **{}**{}: {} .. {} `{}`\n",
        row.name,
        task,
        day(row.task_start_date),
        day(row.task_finish_date),
        row.task_uuid,
    )
}

/// Format the base plans of one project, each with its versions.
pub fn format_base_plans_markdown(project_id: i64, plans: &[BasePlanDetail]) -> String {
    let mut md = String::new();

    md.push_str(&format!("# Baselines of project {} ({})\n\n", project_id, plans.len()));

    for detail in plans {
        let plan = &detail.base_plan;
        md.push_str(&format!("## Baseline {}\n", plan.base_number));
        md.push_str(&format!("- **created**: {}\n", plan.created_at));
        md.push_str(&format!(
            "- **range**: {} .. {}\n",
            day(plan.base_plan_start_date),
            day(plan.base_plan_finish_date)
        ));
        if let Some(updated) = plan.updated_at {
            md.push_str(&format!("- **updated**: {}\n", updated));
        }
        md.push('\n');

        for version in &detail.versions {
            let kind = match version.version.parent_version_id {
                None => "root".to_string(),
                Some(parent) => format!("child of {}", parent),
            };
            md.push_str(&format!(
                "### Version {} ({}, {})\n",
                version.version.id,
                kind,
                version.version.migration_date
            ));
            for row in &version.tasks {
                md.push_str(&format_key_date_line(row));
            }
            md.push('\n');
        }
    }

    md
}

/// Format a migration report.
pub fn format_report_markdown(report: &MigrationReport) -> String {
    let mut md = String::new();

    let status = if report.is_success() { "ok" } else { "failed" };
    md.push_str(&format!("# Migration {}\n\n", status));
    md.push_str(&format!("- **projects**: {}\n", report.projects_seen));
    md.push_str(&format!(
        "- **created / updated / unchanged / skipped**: {} / {} / {} / {}\n",
        report.created, report.updated, report.unchanged, report.skipped
    ));
    md.push_str(&format!(
        "- **rows**: {} base plan(s), {} version(s), {} key date(s) created, {} updated\n",
        report.changes.base_plans_created,
        report.changes.versions_created,
        report.changes.key_dates_created,
        report.changes.key_dates_updated,
    ));

    if !report.failed.is_empty() {
        md.push_str("\n## Failures\n\n");
        for failure in &report.failed {
            md.push_str(&format!(
                "- `{}` {}: {}\n",
                failure.uuid,
                failure.name.as_deref().unwrap_or(""),
                failure.error
            ));
        }
    }

    md
}
