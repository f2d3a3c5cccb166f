use anyhow::Context;
use axum::Router;
use std::time::Duration;
use tracing::{info, warn, Level};

mod models;
mod routes;
mod state;
mod utils;

use ecg_viewer::HttpDataSource;

use crate::state::app_state::AppState;
use crate::utils::conf_helper::{config_path, init_config_and_bind, read_config};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = read_config(&config_path()).await?;

    let level = config.log_level.parse::<Level>().unwrap_or(Level::INFO);
    tracing_subscriber::fmt().with_max_level(level).init();

    let source = HttpDataSource::new(
        config.api_base_url.clone(),
        Duration::from_secs(config.request_timeout_secs),
    )
    .context("HTTP client init failed")?;
    info!("Record service: {}", source.base_url());

    let state = AppState::new(source);

    // === CONFIG + LISTENER ===
    let listener = init_config_and_bind(config).await?;
    let addr = listener.local_addr().context("Addr error")?;
    info!("Server initialized on {}", addr);

    // initial catalog; the service may come up later, so only warn
    if let Err(e) = state.session.refresh_catalog().await {
        warn!("Initial catalog load failed: {}", e);
    }

    let app = Router::new()
        .merge(routes::info_routes::health_routes())
        .merge(routes::catalog_routes::catalog_routes(state.clone()))
        .merge(routes::session_routes::session_routes(state.clone()))
        .merge(routes::playback_routes::playback_routes(state));

    axum::serve(listener, app).await.context("Server error")?;

    Ok(())
}
