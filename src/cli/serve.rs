//! Serve subcommand: run the HTTP API until interrupted.

use super::{open_source, open_target};
use crate::api::{ApiState, start_server};
use crate::config::Config;
use anyhow::Result;
use clap::Args;
use std::sync::Arc;
use tracing::info;

/// Arguments for the serve subcommand
#[derive(Args, Debug, Default)]
pub struct ServeArgs {
    /// Address to bind (overrides config)
    #[arg(long)]
    pub host: Option<String>,

    /// Port to bind (overrides config)
    #[arg(short, long)]
    pub port: Option<u16>,
}

impl ServeArgs {
    pub fn apply(&self, config: &mut Config) {
        if let Some(host) = &self.host {
            config.server.host = host.clone();
        }
        if let Some(port) = self.port {
            config.server.port = port;
        }
    }
}

pub async fn run_serve(mut config: Config, args: &ServeArgs) -> Result<()> {
    args.apply(&mut config);

    info!("Starting keydate-sync v{}", env!("CARGO_PKG_VERSION"));
    let source = open_source(&config)?;
    let target = open_target(&config)?;
    let state = ApiState::new(Arc::new(source), target);

    let (shutdown_tx, addr) = start_server(state, &config.server.host, config.server.port).await?;
    info!("Serving on http://{}", addr);

    tokio::signal::ctrl_c().await?;
    let _ = shutdown_tx.send(());
    Ok(())
}
