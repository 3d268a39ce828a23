//! Daemon entrypoint: wire the HTTP-backed platform clients into the core
//! and run until interrupted.

use anyhow::Context;
use clap::Parser;
use ftrack_accsyn_sync::config::IntegrationConfig;
use ftrack_accsyn_sync::infrastructure::tracking::FtrackApi;
use ftrack_accsyn_sync::infrastructure::transfer::AccsynApi;
use ftrack_accsyn_sync::Core;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "accsyn-syncd", about = "ftrack to accsyn staging sync daemon")]
struct Args {
    /// Transfer-service workspace domain
    #[arg(long, env = "ACCSYN_DOMAIN")]
    accsyn_domain: String,

    #[arg(long, env = "ACCSYN_API_USER")]
    accsyn_api_user: String,

    #[arg(long, env = "ACCSYN_API_KEY", hide_env_values = true)]
    accsyn_api_key: String,

    /// Asset-tracking server URL
    #[arg(long, env = "FTRACK_SERVER")]
    ftrack_server: String,

    #[arg(long, env = "FTRACK_API_USER")]
    ftrack_api_user: String,

    #[arg(long, env = "FTRACK_API_KEY", hide_env_values = true)]
    ftrack_api_key: String,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let args = Args::parse();

    let config = IntegrationConfig {
        accsyn_domain: args.accsyn_domain,
        accsyn_api_user: args.accsyn_api_user,
        accsyn_api_key: args.accsyn_api_key,
        ftrack_server_url: args.ftrack_server,
        ftrack_api_user: args.ftrack_api_user,
        ftrack_api_key: args.ftrack_api_key,
    };

    let tracking = Arc::new(FtrackApi::new(
        config.ftrack_server_url.clone(),
        config.ftrack_api_user.clone(),
        config.ftrack_api_key.clone(),
    ));
    let transfer = Arc::new(AccsynApi::new(
        config.accsyn_domain.clone(),
        config.accsyn_api_user.clone(),
        config.accsyn_api_key.clone(),
    ));

    let vars: HashMap<String, String> = std::env::vars().collect();
    let core = Core::bootstrap(config, &vars, tracking, transfer)
        .await
        .context("integration failed to start")?;

    info!(
        location = %core.location().name,
        "Integration running, press ctrl-c to stop"
    );

    tokio::signal::ctrl_c().await?;
    core.shutdown();

    Ok(())
}
