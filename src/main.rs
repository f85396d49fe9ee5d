//! clawproxy server entry point.
//!
//! Starts the Axum HTTP server with the WebSocket relay endpoint.

use clap::Parser;
use tracing_subscriber::EnvFilter;

use clawproxy::app_state::AppState;
use clawproxy::config::RelayConfig;
use clawproxy::server;

/// WebSocket proxy for openclaw agent command execution.
#[derive(Debug, Parser)]
#[command(name = "clawproxy", version, about)]
struct Cli {
    /// HTTP listen address (overrides `LISTEN_ADDR`), e.g. `:8080`.
    #[arg(long)]
    addr: Option<String>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    // Load configuration
    let mut config = RelayConfig::from_env()?;
    if let Some(addr) = cli.addr.as_deref() {
        config = config.with_listen_addr(addr)?;
    }

    let state = AppState::from_config(&config);

    let shutdown = state.shutdown.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::info!("shutdown signal received");
            shutdown.cancel();
        }
    });

    server::run(&config, state).await?;

    Ok(())
}
