//! Caption retrieval orchestration
//!
//! Providers are tried one after another; the first that lists, fetches and
//! normalizes a track wins and the rest are never called. Every attempt is
//! recorded so the debug surface can show what happened.

use serde::Serialize;

use crate::caption::{resolve, SelectionResult};
use crate::config::ServerConfig;
use crate::error::{CaptionError, Result};
use crate::provider::{fetch_metadata, watch_url, CaptionSource, VideoMetadata};
use crate::subtitle::{
    normalize_auto, normalize_to_text, NormalizeOptions, Payload, PayloadFormat,
};

/// Result of one provider attempt
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProviderAttempt {
    pub provider: String,
    pub ok: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_kind: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ProviderAttempt {
    fn success(provider: &str) -> Self {
        Self {
            provider: provider.to_string(),
            ok: true,
            error_kind: None,
            error: None,
        }
    }

    fn failure(provider: &str, err: &CaptionError) -> Self {
        Self {
            provider: provider.to_string(),
            ok: false,
            error_kind: Some(err.kind()),
            error: Some(err.to_string()),
        }
    }
}

/// A transcript ready to be returned to the client
#[derive(Debug, Clone)]
pub struct CaptionOutcome {
    pub available_languages: Vec<String>,
    pub subtitle: String,
    pub language: String,
    pub method: String,
    pub attempts: Vec<ProviderAttempt>,
    /// Leading characters of the raw payload
    pub payload_sample: Option<String>,
    pub format: Option<PayloadFormat>,
    pub metadata: Option<VideoMetadata>,
}

/// Knobs taken from the server configuration
#[derive(Debug, Clone)]
pub struct ServiceOptions {
    pub normalize: NormalizeOptions,
    pub placeholder_on_fetch_failure: bool,
    pub sample_chars: usize,
    pub watch_base: String,
    /// oEmbed endpoint, set when metadata should be fetched
    pub oembed_base: Option<String>,
}

impl ServiceOptions {
    pub fn from_config(config: &ServerConfig) -> Self {
        Self {
            normalize: NormalizeOptions {
                min_line_chars: config.transcript.min_line_chars,
            },
            placeholder_on_fetch_failure: config.transcript.placeholder_on_fetch_failure,
            sample_chars: config.debug.sample_chars,
            watch_base: config.providers.watch_page_base.clone(),
            oembed_base: config
                .providers
                .fetch_metadata
                .then(|| config.providers.oembed_base.clone()),
        }
    }
}

/// Ordered provider chain for one request
pub struct CaptionService {
    providers: Vec<Box<dyn CaptionSource>>,
    client: reqwest::Client,
    options: ServiceOptions,
}

impl CaptionService {
    pub fn new(
        providers: Vec<Box<dyn CaptionSource>>,
        client: reqwest::Client,
        options: ServiceOptions,
    ) -> Self {
        Self {
            providers,
            client,
            options,
        }
    }

    /// Captions for `video_id`, with metadata fetched concurrently when
    /// enabled. Metadata failures are logged and otherwise ignored.
    pub async fn run(&self, video_id: &str, language_priority: &[String]) -> Result<CaptionOutcome> {
        let Some(oembed_base) = &self.options.oembed_base else {
            return self.transcript(video_id, language_priority).await;
        };

        let (captions, metadata) = tokio::join!(
            self.transcript(video_id, language_priority),
            fetch_metadata(&self.client, oembed_base, &self.options.watch_base, video_id),
        );

        let mut outcome = captions?;
        match metadata {
            Ok(metadata) => outcome.metadata = Some(metadata),
            Err(e) => tracing::warn!(video_id, "metadata fetch failed: {}", e),
        }
        Ok(outcome)
    }

    /// Walk the provider chain until one yields a transcript.
    ///
    /// When every provider fails, a payload that was fetched but matched no
    /// caption pattern renders the no-text placeholder. A track whose content
    /// could not be fetched at all renders the guidance text, if enabled.
    pub async fn transcript(
        &self,
        video_id: &str,
        language_priority: &[String],
    ) -> Result<CaptionOutcome> {
        let mut attempts = Vec::with_capacity(self.providers.len());
        let mut best_error: Option<CaptionError> = None;
        // First selection whose payload arrived but could not be read
        let mut unreadable: Option<(SelectionResult, String, Payload)> = None;
        // First selection whose payload could not be fetched
        let mut unreachable: Option<(SelectionResult, String)> = None;

        for provider in &self.providers {
            let name = provider.name();

            let selection = match resolve(video_id, language_priority, provider.as_ref()).await {
                Ok(selection) => selection,
                Err(e) => {
                    tracing::warn!(provider = name, video_id, "track resolution failed: {}", e);
                    attempts.push(ProviderAttempt::failure(name, &e));
                    keep_most_specific(&mut best_error, e);
                    continue;
                }
            };

            let payload = match provider.fetch_payload(&selection.selected).await {
                Ok(payload) => payload,
                Err(e) => {
                    tracing::warn!(
                        provider = name,
                        video_id,
                        language = %selection.selected.language_code,
                        "caption content unreachable: {}",
                        e
                    );
                    attempts.push(ProviderAttempt::failure(name, &e));
                    keep_most_specific(&mut best_error, e);
                    if unreachable.is_none() {
                        unreachable = Some((selection, provider.method().to_string()));
                    }
                    continue;
                }
            };

            match normalize_auto(&payload, &self.options.normalize) {
                Ok((transcript, format)) => {
                    tracing::info!(
                        provider = name,
                        video_id,
                        language = %selection.selected.language_code,
                        lines = transcript.len(),
                        "transcript ready"
                    );
                    attempts.push(ProviderAttempt::success(name));
                    return Ok(CaptionOutcome {
                        available_languages: selection.available_labels(),
                        subtitle: transcript.render(),
                        language: selection.selected.label(),
                        method: provider.method().to_string(),
                        attempts,
                        payload_sample: Some(payload.sample(self.options.sample_chars)),
                        format: Some(format),
                        metadata: None,
                    });
                }
                Err(e) => {
                    tracing::warn!(
                        provider = name,
                        video_id,
                        language = %selection.selected.language_code,
                        "caption content unreadable: {}",
                        e
                    );
                    attempts.push(ProviderAttempt::failure(name, &e));
                    keep_most_specific(&mut best_error, e);
                    if unreadable.is_none() {
                        unreadable = Some((selection, provider.method().to_string(), payload));
                    }
                }
            }
        }

        if let Some((selection, method, payload)) = unreadable {
            return Ok(CaptionOutcome {
                available_languages: selection.available_labels(),
                subtitle: normalize_to_text(&payload, &self.options.normalize),
                language: selection.selected.label(),
                method,
                attempts,
                payload_sample: Some(payload.sample(self.options.sample_chars)),
                format: None,
                metadata: None,
            });
        }

        if let Some((selection, method)) = unreachable {
            if self.options.placeholder_on_fetch_failure {
                return Ok(CaptionOutcome {
                    available_languages: selection.available_labels(),
                    subtitle: guidance_text(&selection, &watch_url(&self.options.watch_base, video_id)),
                    language: selection.selected.label(),
                    method,
                    attempts,
                    payload_sample: None,
                    format: None,
                    metadata: None,
                });
            }
        }

        Err(best_error.unwrap_or_else(|| {
            CaptionError::provider_unavailable("chain", "no caption provider configured")
        }))
    }
}

fn keep_most_specific(best: &mut Option<CaptionError>, candidate: CaptionError) {
    let replace = match best {
        Some(current) => candidate.specificity() > current.specificity(),
        None => true,
    };
    if replace {
        *best = Some(candidate);
    }
}

/// Shown instead of a transcript when tracks exist but none could be read
fn guidance_text(selection: &SelectionResult, video_url: &str) -> String {
    format!(
        "📋 자막 정보 수집 완료!\n\n\
         사용 가능한 자막: {}개\n\
         선택된 언어: {}\n\n\
         ⚠️ 주의: 서버에서 자막 내용을 가져오지 못했습니다.\n\n\
         💡 해결 방법:\n\
         1. 브라우저에서 영상을 열어주세요\n\
         2. 자막 버튼(CC)을 클릭하세요\n\
         3. 설정에서 원하는 언어를 선택하세요\n\
         4. 자막을 복사하여 사용하세요\n\n\
         📺 영상 URL: {}",
        selection.available.len(),
        selection.selected.display_name,
        video_url
    )
}
