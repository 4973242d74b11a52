//! CLI command definitions for keydate-sync
//!
//! This module defines the CLI structure using clap's derive macros.
//! The main entry point is the `Cli` struct which contains subcommands.

pub mod migrate;
pub mod serve;
pub mod show;

use crate::config::Config;
use crate::db::Database;
use crate::source::SourceDb;
use anyhow::Result;
use clap::{Parser, Subcommand};
use migrate::MigrateArgs;
use serve::ServeArgs;
use show::{BaselinesArgs, ListArgs};
use std::path::PathBuf;
use tracing::info;

/// Key-date migration from a legacy scheduling database
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Path to configuration file
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Path to the legacy source database (overrides config)
    #[arg(short, long, global = true)]
    pub source: Option<PathBuf>,

    /// Path to the target database (overrides config)
    #[arg(short, long, global = true)]
    pub target: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Logging output: 0/off, 1/stdout, 2/stderr (default), or filename
    #[arg(short, long, default_value = "2", global = true)]
    pub log: String,

    #[command(subcommand)]
    pub command: Option<Command>,
}

impl Cli {
    /// Apply path flags on top of the resolved configuration.
    pub fn apply_overrides(&self, config: &mut Config) {
        if let Some(source) = &self.source {
            config.source.db_path = source.clone();
        }
        if let Some(target) = &self.target {
            config.target.db_path = target.clone();
        }
    }
}

/// Available subcommands
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Start the HTTP API (default if no subcommand given)
    Serve(ServeArgs),

    /// Run one migration and print the report
    Migrate(MigrateArgs),

    /// List migrated projects with their base plans
    Projects(ListArgs),

    /// Show the base plans, versions and key dates of one project
    Baselines(BaselinesArgs),

    /// Describe the target database schema
    Schema(ListArgs),
}

/// Open (and migrate) the target database named by the configuration.
pub fn open_target(config: &Config) -> Result<Database> {
    config.ensure_target_dir()?;
    let db = Database::open(&config.target.db_path)?;
    info!("Target database: {:?}", config.target.db_path);
    Ok(db)
}

/// Open the legacy database read-only.
pub fn open_source(config: &Config) -> Result<SourceDb> {
    let source = SourceDb::open(&config.source.db_path, config.source.key_date_field_uid.clone())?;
    info!(
        key_date_field = source.key_date_field_uid(),
        "Source database: {:?}", config.source.db_path
    );
    Ok(source)
}
