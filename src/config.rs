//! Server configuration

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Upstream caption provider kinds, tried in configured order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProviderKind {
    /// Official captions listing API (needs an API key)
    Official,
    /// Player metadata scraped from the watch page
    Scraped,
    /// Unofficial third-party transcript proxy
    Proxy,
    /// yt-dlp caption extraction
    Ytdlp,
}

impl ProviderKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProviderKind::Official => "official",
            ProviderKind::Scraped => "scraped",
            ProviderKind::Proxy => "proxy",
            ProviderKind::Ytdlp => "ytdlp",
        }
    }
}

/// Third-party proxy endpoints.
///
/// `list_url` may contain `{videoId}`; `transcript_url` may contain
/// `{videoId}` and `{lang}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProxyConfig {
    pub list_url: String,
    pub transcript_url: String,
}

/// Provider configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ProviderConfig {
    /// Providers to try, in order
    pub order: Vec<ProviderKind>,

    /// Timeout applied to every upstream call in seconds
    pub timeout_secs: u64,

    /// Official API keys, tried sequentially
    pub api_keys: Vec<String>,

    /// Reject requests that carry no `apiKey` parameter
    pub require_api_key: bool,

    /// Official API base URL
    pub official_api_base: String,

    /// Base URL of the video watch page
    pub watch_page_base: String,

    /// Third-party proxy, disabled when absent
    #[serde(skip_serializing_if = "Option::is_none")]
    pub proxy: Option<ProxyConfig>,

    /// yt-dlp executable
    pub ytdlp_binary: String,

    /// User agent sent to scraped endpoints
    pub user_agent: String,

    /// Fetch video title/author alongside captions
    pub fetch_metadata: bool,

    /// oEmbed endpoint used for metadata
    pub oembed_base: String,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            order: vec![
                ProviderKind::Official,
                ProviderKind::Scraped,
                ProviderKind::Proxy,
                ProviderKind::Ytdlp,
            ],
            timeout_secs: 10,
            api_keys: Vec::new(),
            require_api_key: false,
            official_api_base: "https://www.googleapis.com/youtube/v3".to_string(),
            watch_page_base: "https://www.youtube.com".to_string(),
            proxy: None,
            ytdlp_binary: "yt-dlp".to_string(),
            user_agent: "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 \
                         (KHTML, like Gecko) Chrome/124.0.0.0 Safari/537.36"
                .to_string(),
            fetch_metadata: false,
            oembed_base: "https://www.youtube.com/oembed".to_string(),
        }
    }
}

impl ProviderConfig {
    /// Get the upstream timeout
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs.max(1))
    }
}

/// Transcript selection and normalization configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TranscriptConfig {
    /// Language priority, matched as case-insensitive prefixes
    pub language_priority: Vec<String>,

    /// Drop lines shorter than this many characters (0 disables)
    pub min_line_chars: usize,

    /// Answer with a guidance text when a track was selected but its
    /// content could not be fetched from any provider
    pub placeholder_on_fetch_failure: bool,
}

impl Default for TranscriptConfig {
    fn default() -> Self {
        Self {
            language_priority: ["ko", "kr", "en", "en-US", "en-GB"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
            min_line_chars: 0,
            placeholder_on_fetch_failure: true,
        }
    }
}

/// Diagnostic response surface
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DebugConfig {
    /// Allow `debug=1` requests to receive a `debug` object
    pub enabled: bool,

    /// Characters of raw payload echoed as `xmlSample`
    pub sample_chars: usize,
}

impl Default for DebugConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            sample_chars: 500,
        }
    }
}

/// Server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Host address to bind to
    pub host: String,

    /// Port to listen on
    pub port: u16,

    /// Add CORS headers to every response
    pub cors_enabled: bool,

    /// Log level (trace, debug, info, warn, error)
    pub log_level: String,

    /// Log format (pretty, json)
    pub log_format: String,

    /// Provider configuration
    pub providers: ProviderConfig,

    /// Transcript configuration
    pub transcript: TranscriptConfig,

    /// Debug surface configuration
    pub debug: DebugConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 3000,
            cors_enabled: true,
            log_level: "info".to_string(),
            log_format: "pretty".to_string(),
            providers: ProviderConfig::default(),
            transcript: TranscriptConfig::default(),
            debug: DebugConfig::default(),
        }
    }
}

impl ServerConfig {
    /// Get the socket address string
    pub fn socket_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Apply `CAPTION_API_KEYS` and `CAPTION_PORT` from the environment
    pub fn apply_env_overrides(&mut self) {
        self.apply_overrides(
            std::env::var("CAPTION_API_KEYS").ok(),
            std::env::var("CAPTION_PORT").ok(),
        );
    }

    fn apply_overrides(&mut self, api_keys: Option<String>, port: Option<String>) {
        if let Some(keys) = api_keys {
            let keys: Vec<String> = keys
                .split(',')
                .map(|k| k.trim().to_string())
                .filter(|k| !k.is_empty())
                .collect();
            if !keys.is_empty() {
                self.providers.api_keys = keys;
            }
        }
        if let Some(port) = port.and_then(|p| p.trim().parse::<u16>().ok()) {
            self.port = port;
        }
    }
}
