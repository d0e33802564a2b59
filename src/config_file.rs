//! Configuration file support
//!
//! Loads server configuration from sectioned TOML files.

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::config::{DebugConfig, ProviderConfig, ServerConfig, TranscriptConfig};

/// Configuration file format
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfigFile {
    /// Server settings
    pub server: ServerSettings,
    /// Logging settings
    pub logging: Option<LoggingSettings>,
    /// Upstream provider settings
    pub providers: Option<ProviderConfig>,
    /// Transcript settings
    pub transcript: Option<TranscriptConfig>,
    /// Debug surface settings
    pub debug: Option<DebugConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerSettings {
    /// Host address to bind to
    pub host: String,
    /// Port to listen on
    pub port: u16,
    /// Enable CORS
    pub cors_enabled: Option<bool>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingSettings {
    /// Log level (trace, debug, info, warn, error)
    pub level: String,
    /// Output format (json, pretty)
    pub format: Option<String>,
}

impl ConfigFile {
    /// Load configuration from a TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, Box<dyn std::error::Error>> {
        let content = std::fs::read_to_string(path.as_ref())?;
        let config: ConfigFile = toml::from_str(&content)?;
        Ok(config)
    }

    /// Save configuration to a TOML file
    pub fn to_file<P: AsRef<Path>>(&self, path: P) -> Result<(), Box<dyn std::error::Error>> {
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path.as_ref(), content)?;
        Ok(())
    }

    /// Generate default configuration file
    pub fn default_config() -> Self {
        Self {
            server: ServerSettings {
                host: "0.0.0.0".to_string(),
                port: 3000,
                cors_enabled: Some(true),
            },
            logging: Some(LoggingSettings {
                level: "info".to_string(),
                format: Some("pretty".to_string()),
            }),
            providers: Some(ProviderConfig::default()),
            transcript: Some(TranscriptConfig::default()),
            debug: Some(DebugConfig::default()),
        }
    }

    /// Convert to ServerConfig
    pub fn into_server_config(self) -> ServerConfig {
        let (log_level, log_format) = match self.logging {
            Some(l) => (l.level, l.format.unwrap_or_else(|| "pretty".to_string())),
            None => ("info".to_string(), "pretty".to_string()),
        };
        ServerConfig {
            host: self.server.host,
            port: self.server.port,
            cors_enabled: self.server.cors_enabled.unwrap_or(true),
            log_level,
            log_format,
            providers: self.providers.unwrap_or_default(),
            transcript: self.transcript.unwrap_or_default(),
            debug: self.debug.unwrap_or_default(),
        }
    }
}

/// Generate default configuration file at the specified path
pub fn generate_default_config<P: AsRef<Path>>(path: P) -> Result<(), Box<dyn std::error::Error>> {
    let config = ConfigFile::default_config();
    config.to_file(path)?;
    Ok(())
}
