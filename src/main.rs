//! keydate-sync
//!
//! Incrementally migrates project baselines and key dates from a legacy
//! scheduling database into a normalized target store.

use anyhow::Result;
use clap::Parser;
use keydate_sync::cli::{Cli, Command, migrate, serve, show};
use keydate_sync::config::{Config, ConfigPaths};
use keydate_sync::logging::init_logging;
use tracing::{info, warn};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    init_logging(&cli.log, cli.verbose)?;

    let (mut config, config_path) = Config::resolve(cli.config.as_deref(), &ConfigPaths::discover())?;
    cli.apply_overrides(&mut config);
    match &config_path {
        Some(path) => info!("Config: {:?}", path),
        None => info!("Config: defaults"),
    }

    match cli.command {
        Some(Command::Migrate(args)) => {
            let report = migrate::run_migrate(&config, &args)?;
            if !report.is_success() {
                warn!("{} project(s) failed", report.failed.len());
                std::process::exit(1);
            }
        }
        Some(Command::Projects(args)) => show::run_projects(&config, &args)?,
        Some(Command::Baselines(args)) => show::run_baselines(&config, &args)?,
        Some(Command::Schema(args)) => show::run_schema(&config, &args)?,
        Some(Command::Serve(args)) => serve::run_serve(config, &args).await?,
        None => serve::run_serve(config, &serve::ServeArgs::default()).await?,
    }

    Ok(())
}
