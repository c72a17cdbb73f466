//! # Mtaa Node
//!
//! Survival planner API server.

use mtaa_node::{api, AppState, MtaaConfig};
use tokio::net::TcpListener;
use tracing::info;
use tracing_subscriber::EnvFilter;

/// Run the Mtaa node server.
async fn run_server(config: MtaaConfig) -> anyhow::Result<()> {
    let state = AppState::from_config(&config).await?;
    let app = api::router(state);

    info!("Listening on http://{}", config.server.addr);

    let listener = TcpListener::bind(config.server.addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = MtaaConfig::from_env()?;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.server.log_level));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    info!("Mtaa node starting...");
    run_server(config).await
}
