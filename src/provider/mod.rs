//! Upstream caption providers
//!
//! Every provider answers two questions for a video: which caption tracks
//! exist (`CaptionSetProvider`) and what a given track contains
//! (`PayloadFetcher`). Implementations:
//! - `official`: captions listing API, API keys tried in order
//! - `scraped`: player metadata embedded in the watch page
//! - `proxy`: unofficial third-party transcript proxy
//! - `ytdlp`: yt-dlp as a packaged extractor
//!
//! `metadata` fetches video title/author and is not a caption source.

pub mod metadata;
pub mod official;
pub mod proxy;
pub mod scraped;
pub mod ytdlp;

use async_trait::async_trait;

use crate::caption::{CaptionSet, CaptionTrack};
use crate::config::{ProviderConfig, ProviderKind};
use crate::error::{CaptionError, Result};
use crate::subtitle::Payload;

pub use metadata::{fetch_metadata, VideoMetadata};
pub use official::OfficialApiProvider;
pub use proxy::ThirdPartyProxyProvider;
pub use scraped::ScrapedPageProvider;
pub use ytdlp::YtDlpProvider;

/// Lists the caption tracks of a video
#[async_trait]
pub trait CaptionSetProvider: Send + Sync {
    /// Short provider name used in logs and diagnostics
    fn name(&self) -> &str;

    /// Human-readable method reported to clients
    fn method(&self) -> &str {
        self.name()
    }

    /// Tracks in provider order. An empty set means the video has no captions.
    async fn list_tracks(&self, video_id: &str) -> Result<CaptionSet>;
}

/// Fetches the raw content behind a track's locator
#[async_trait]
pub trait PayloadFetcher: Send + Sync {
    async fn fetch_payload(&self, track: &CaptionTrack) -> Result<Payload>;
}

/// A provider that can both list and fetch
pub trait CaptionSource: CaptionSetProvider + PayloadFetcher {}

impl<T: CaptionSetProvider + PayloadFetcher> CaptionSource for T {}

/// Build the providers for one request, in configured order.
///
/// `request_api_key` is tried before the configured keys. Providers that are
/// not configured (no API key, no proxy URLs) are left out.
pub fn build_chain(
    config: &ProviderConfig,
    client: &reqwest::Client,
    request_api_key: Option<&str>,
) -> Vec<Box<dyn CaptionSource>> {
    let mut chain: Vec<Box<dyn CaptionSource>> = Vec::new();

    for kind in &config.order {
        match kind {
            ProviderKind::Official => {
                let mut keys: Vec<String> = request_api_key
                    .map(str::trim)
                    .filter(|k| !k.is_empty())
                    .map(str::to_string)
                    .into_iter()
                    .collect();
                for key in &config.api_keys {
                    if !keys.contains(key) {
                        keys.push(key.clone());
                    }
                }
                if keys.is_empty() {
                    tracing::debug!("official provider skipped: no API key");
                    continue;
                }
                chain.push(Box::new(OfficialApiProvider::new(
                    client.clone(),
                    &config.official_api_base,
                    keys,
                )));
            }
            ProviderKind::Scraped => {
                chain.push(Box::new(ScrapedPageProvider::new(
                    client.clone(),
                    &config.watch_page_base,
                )));
            }
            ProviderKind::Proxy => match &config.proxy {
                Some(proxy) => chain.push(Box::new(ThirdPartyProxyProvider::new(
                    client.clone(),
                    proxy.clone(),
                ))),
                None => tracing::debug!("proxy provider skipped: not configured"),
            },
            ProviderKind::Ytdlp => {
                chain.push(Box::new(YtDlpProvider::new(
                    client.clone(),
                    &config.ytdlp_binary,
                    &config.watch_page_base,
                    config.timeout(),
                )));
            }
        }
    }

    chain
}

/// `{base}/watch?v={video_id}` with the id query-encoded
pub fn watch_url(base: &str, video_id: &str) -> String {
    let mut url = format!("{}/watch?", base.trim_end_matches('/'));
    url.push_str(
        &url::form_urlencoded::Serializer::new(String::new())
            .append_pair("v", video_id)
            .finish(),
    );
    url
}

/// GET `url` and return its body as markup.
///
/// Non-2xx, transport errors and empty bodies are `ContentFetchFailed`.
pub(crate) async fn fetch_markup(
    client: &reqwest::Client,
    provider: &str,
    url: &str,
) -> Result<Payload> {
    let response = client
        .get(url)
        .send()
        .await
        .map_err(|e| CaptionError::content_fetch_failed(provider, e))?;

    let status = response.status();
    if !status.is_success() {
        return Err(CaptionError::content_fetch_failed(
            provider,
            format!("HTTP {}", status),
        ));
    }

    let body = response
        .text()
        .await
        .map_err(|e| CaptionError::content_fetch_failed(provider, e))?;
    if body.trim().is_empty() {
        return Err(CaptionError::content_fetch_failed(provider, "empty body"));
    }
    Ok(Payload::Markup(body))
}

/// Send a listing request; failures are `ProviderUnavailable`.
pub(crate) async fn get_listing(
    request: reqwest::RequestBuilder,
    provider: &str,
) -> Result<String> {
    let response = request
        .send()
        .await
        .map_err(|e| CaptionError::provider_unavailable(provider, e))?;

    let status = response.status();
    if !status.is_success() {
        return Err(CaptionError::provider_unavailable(
            provider,
            format!("HTTP {}", status),
        ));
    }

    response
        .text()
        .await
        .map_err(|e| CaptionError::provider_unavailable(provider, e))
}
