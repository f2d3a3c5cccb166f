use anyhow::{anyhow, Context, Result};
use std::sync::OnceLock;
use tokio::fs;
use tokio::net::TcpListener;
use tracing::info;

use crate::models::config_model::ViewerConfig;

static CONFIG_CACHE: OnceLock<ViewerConfig> = OnceLock::new();

const DEFAULT_CONFIG_PATH: &str = "viewer.json";
const CONFIG_PATH_ENV: &str = "ECG_VIEWER_CONFIG";

pub fn config_path() -> String {
    std::env::var(CONFIG_PATH_ENV).unwrap_or_else(|_| DEFAULT_CONFIG_PATH.to_string())
}

pub async fn read_config(file_path: &str) -> Result<ViewerConfig> {
    let data = fs::read_to_string(file_path)
        .await
        .with_context(|| format!("File read error: {file_path}"))?;

    serde_json::from_str(&data).context("JSON parse error")
}

/// Binds the configured address and caches the config with the actual port.
pub async fn init_config_and_bind(mut config: ViewerConfig) -> Result<TcpListener> {
    let bind_addr = format!("{}:{}", config.connection.ip, config.connection.port);

    let listener = TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("Bind failed: {bind_addr}"))?;

    let actual_port = listener.local_addr().context("Addr error")?.port();

    // port 0 means "any"; report the real one
    config.connection.port = actual_port;

    CONFIG_CACHE
        .set(config)
        .map_err(|_| anyhow!("Config already initialized"))?;

    info!("Config initialized with port: {}", actual_port);

    Ok(listener)
}

pub fn get_cached_config() -> Option<&'static ViewerConfig> {
    CONFIG_CACHE.get()
}
