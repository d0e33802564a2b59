//! Caption Server
//!
//! An HTTP service that looks up the caption tracks of a video through a
//! chain of interchangeable upstream providers, picks one track by language
//! priority, and returns it as a `[MM:SS] text` transcript.

mod caption;
mod config;
mod config_file;
mod error;
mod http;
#[cfg(test)]
mod integration;
mod provider;
mod service;
mod state;
mod subtitle;

use std::net::SocketAddr;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::{ProviderKind, ServerConfig};
use crate::error::{CaptionError, Result};
use crate::http::create_router;
use crate::state::AppState;

/// Application version
const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Application name
const APP_NAME: &str = "caption-server";

#[tokio::main]
async fn main() -> Result<()> {
    // `--init-config [path]` writes a default config file and exits
    let mut args = std::env::args().skip(1);
    let first_arg = args.next();
    if first_arg.as_deref() == Some("--init-config") {
        let path = args.next().unwrap_or_else(|| "config.toml".to_string());
        crate::config_file::generate_default_config(&path)
            .map_err(|e| CaptionError::Config(format!("cannot write {}: {}", path, e)))?;
        println!("Wrote default configuration to {}", path);
        return Ok(());
    }

    // Load configuration
    let config_path = first_arg.unwrap_or_else(|| "config.toml".to_string());
    let (mut config, load_error) = if std::path::Path::new(&config_path).exists() {
        match crate::config_file::ConfigFile::from_file(&config_path) {
            Ok(cf) => (cf.into_server_config(), None),
            Err(e) => (ServerConfig::default(), Some(e.to_string())),
        }
    } else {
        (ServerConfig::default(), None)
    };
    config.apply_env_overrides();

    // Initialize logging
    init_logging(&config);

    tracing::info!("{} v{} starting", APP_NAME, VERSION);
    if let Some(e) = load_error {
        tracing::warn!(
            "Failed to load config file {}: {}. Using defaults.",
            config_path,
            e
        );
    }
    let provider_names: Vec<&str> = config
        .providers
        .order
        .iter()
        .map(ProviderKind::as_str)
        .collect();
    tracing::info!(
        providers = ?provider_names,
        api_keys = config.providers.api_keys.len(),
        timeout_secs = config.providers.timeout_secs,
        "Configuration loaded"
    );

    // Create application state
    let state = Arc::new(AppState::new(config.clone())?);

    // Build router
    let app = create_router(state);

    // Start server
    let addr: SocketAddr = config
        .socket_addr()
        .parse()
        .map_err(|e| CaptionError::Config(format!("bad listen address: {}", e)))?;
    tracing::info!("Starting HTTP server on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

/// Initialize logging with tracing
fn init_logging(config: &ServerConfig) {
    let default_filter = format!("caption_server={},tower_http=debug", config.log_level);
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| default_filter.into());

    let registry = tracing_subscriber::registry().with(filter);
    if config.log_format.eq_ignore_ascii_case("json") {
        registry.with(tracing_subscriber::fmt::layer().json()).init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }
}
