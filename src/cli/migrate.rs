//! Migrate subcommand: one reconciliation run from the command line.

use super::{open_source, open_target};
use crate::config::Config;
use crate::db;
use crate::format::{OutputFormat, format_report_markdown};
use crate::migrate::{MigrationReport, run_migration};
use anyhow::Result;
use clap::Args;

/// Arguments for the migrate subcommand
#[derive(Args, Debug, Default)]
pub struct MigrateArgs {
    /// Report format
    #[arg(short, long, value_enum, default_value_t = OutputFormat::Markdown)]
    pub format: OutputFormat,
}

/// Run a migration and print its report. Returns the report so the caller
/// can pick an exit status.
pub fn run_migrate(config: &Config, args: &MigrateArgs) -> Result<MigrationReport> {
    let source = open_source(config)?;
    let target = open_target(config)?;

    let report = run_migration(&source, &target, db::now())?;
    println!("{}", args.format.render(&report, format_report_markdown)?);
    Ok(report)
}
