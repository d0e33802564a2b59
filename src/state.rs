//! Application state management
//!
//! Holds the server configuration and the shared HTTP client. Nothing about
//! a request outlives it: each request builds its own provider chain.

use crate::config::ServerConfig;
use crate::error::{CaptionError, Result};
use crate::provider::build_chain;
use crate::service::{CaptionService, ServiceOptions};

/// Shared application state
pub struct AppState {
    pub config: ServerConfig,
    /// Upstream client; carries the configured timeout and user agent
    pub client: reqwest::Client,
}

impl AppState {
    /// Create application state
    pub fn new(config: ServerConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(config.providers.timeout())
            .user_agent(config.providers.user_agent.as_str())
            .build()
            .map_err(|e| CaptionError::Config(format!("HTTP client: {}", e)))?;
        Ok(Self { config, client })
    }

    /// Provider chain and options for one request
    pub fn caption_service(&self, request_api_key: Option<&str>) -> CaptionService {
        CaptionService::new(
            build_chain(&self.config.providers, &self.client, request_api_key),
            self.client.clone(),
            ServiceOptions::from_config(&self.config),
        )
    }
}
