//! binddiag service entry point

use anyhow::Context;
use clap::Parser;
use std::sync::Arc;

use binddiag::config::AppConfig;
use binddiag::probe::IpProbe;
use binddiag::resolution::CredentialResolver;
use binddiag::server::AppState;
use binddiag::{create_authority, server};

#[derive(Parser)]
#[command(name = "binddiag")]
#[command(about = "Service-binding credential and IP-routing diagnostics")]
#[command(version)]
struct Cli {
    /// Listen address override (default 0.0.0.0:$PORT)
    #[arg(short, long)]
    listen: Option<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    let cli = Cli::parse();
    let cfg = AppConfig::from_env();
    let listen = cli.listen.unwrap_or_else(|| cfg.listen.clone());

    let authority = create_authority(cfg.authority_mode.as_str(), cfg.credhub_api.as_deref())?;
    tracing::info!(
        authority = authority.name(),
        offering = %cfg.offering,
        listen = %listen,
        "starting binddiag"
    );

    let state = AppState {
        resolver: Arc::new(CredentialResolver::new(authority)),
        probe: Arc::new(IpProbe::new()?),
        offering: cfg.offering,
    };

    let listener = tokio::net::TcpListener::bind(&listen)
        .await
        .with_context(|| format!("failed to bind {listen}"))?;

    server::serve(listener, state, shutdown_signal()).await?;
    Ok(())
}

async fn shutdown_signal() {
    let _ = tokio::signal::ctrl_c().await;
    tracing::info!("shutdown signal received");
}
