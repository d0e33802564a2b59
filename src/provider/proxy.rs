//! Third-party transcript proxy provider
//!
//! The list endpoint answers with the languages a video has captions in;
//! the transcript endpoint answers with `{start, text}` records for one
//! language. Both are configured as URL templates.

use async_trait::async_trait;
use serde::Deserialize;

use crate::caption::{CaptionSet, CaptionTrack};
use crate::config::ProxyConfig;
use crate::error::{CaptionError, Result};
use crate::provider::{get_listing, CaptionSetProvider, PayloadFetcher};
use crate::subtitle::normalizer::entries_from_value;
use crate::subtitle::Payload;

const NAME: &str = "proxy";

/// A listed language, either a bare code or an object
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum ProxyTrack {
    Code(String),
    Track {
        #[serde(
            rename = "languageCode",
            alias = "language_code",
            alias = "lang",
            alias = "code",
            alias = "language"
        )]
        language_code: String,
        #[serde(default, alias = "displayName", alias = "label")]
        name: String,
    },
}

/// A bare list, or a list under `languages` / `tracks` / `captions`
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum ProxyListing {
    List(Vec<ProxyTrack>),
    Wrapped {
        #[serde(alias = "tracks", alias = "captions")]
        languages: Vec<ProxyTrack>,
    },
}

pub struct ThirdPartyProxyProvider {
    client: reqwest::Client,
    config: ProxyConfig,
}

impl ThirdPartyProxyProvider {
    pub fn new(client: reqwest::Client, config: ProxyConfig) -> Self {
        Self { client, config }
    }

    fn list_url(&self, video_id: &str) -> String {
        fill_template(&self.config.list_url, video_id, "")
    }

    fn transcript_url(&self, video_id: &str, lang: &str) -> String {
        fill_template(&self.config.transcript_url, video_id, lang)
    }
}

#[async_trait]
impl CaptionSetProvider for ThirdPartyProxyProvider {
    fn name(&self) -> &str {
        NAME
    }

    fn method(&self) -> &str {
        "Third-party transcript proxy"
    }

    async fn list_tracks(&self, video_id: &str) -> Result<CaptionSet> {
        let body = get_listing(self.client.get(self.list_url(video_id)), NAME).await?;
        let listing: ProxyListing = serde_json::from_str(&body)
            .map_err(|e| CaptionError::provider_unavailable(NAME, format!("bad listing: {}", e)))?;

        let tracks = match listing {
            ProxyListing::List(tracks) | ProxyListing::Wrapped { languages: tracks } => tracks,
        };

        Ok(tracks
            .into_iter()
            .map(|track| {
                let (lang, name) = match track {
                    ProxyTrack::Code(code) => (code, String::new()),
                    ProxyTrack::Track {
                        language_code,
                        name,
                    } => (language_code, name),
                };
                let locator = self.transcript_url(video_id, &lang);
                CaptionTrack::new(name, lang, locator)
            })
            .collect())
    }
}

#[async_trait]
impl PayloadFetcher for ThirdPartyProxyProvider {
    async fn fetch_payload(&self, track: &CaptionTrack) -> Result<Payload> {
        let response = self
            .client
            .get(&track.content_locator)
            .send()
            .await
            .map_err(|e| CaptionError::content_fetch_failed(NAME, e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(CaptionError::content_fetch_failed(
                NAME,
                format!("HTTP {}", status),
            ));
        }

        let body = response
            .text()
            .await
            .map_err(|e| CaptionError::content_fetch_failed(NAME, e))?;
        if body.trim().is_empty() {
            return Err(CaptionError::content_fetch_failed(NAME, "empty body"));
        }

        // Structured when it parses as a caption list, markup otherwise.
        match serde_json::from_str::<serde_json::Value>(&body) {
            Ok(value) => match entries_from_value(value) {
                Ok(entries) if !entries.is_empty() => Ok(Payload::Entries(entries)),
                Ok(_) => Err(CaptionError::content_fetch_failed(NAME, "empty transcript")),
                Err(_) => Ok(Payload::Markup(body)),
            },
            Err(_) => Ok(Payload::Markup(body)),
        }
    }
}

/// Substitute `{videoId}` and `{lang}` with query-encoded values
fn fill_template(template: &str, video_id: &str, lang: &str) -> String {
    let encode = |s: &str| url::form_urlencoded::byte_serialize(s.as_bytes()).collect::<String>();
    template
        .replace("{videoId}", &encode(video_id))
        .replace("{lang}", &encode(lang))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fill_template() {
        assert_eq!(
            fill_template("http://p/t?v={videoId}&lang={lang}", "a b", "en-US"),
            "http://p/t?v=a+b&lang=en-US"
        );
    }

    #[test]
    fn test_listing_shapes() {
        let bare: ProxyListing = serde_json::from_str(r#"["ko", "en"]"#).unwrap();
        assert!(matches!(bare, ProxyListing::List(ref t) if t.len() == 2));

        let objects: ProxyListing =
            serde_json::from_str(r#"[{"lang": "ko", "name": "Korean"}, {"languageCode": "en"}]"#)
                .unwrap();
        match objects {
            ProxyListing::List(tracks) => match &tracks[0] {
                ProxyTrack::Track {
                    language_code,
                    name,
                } => {
                    assert_eq!(language_code, "ko");
                    assert_eq!(name, "Korean");
                }
                other => panic!("unexpected track: {other:?}"),
            },
            other => panic!("unexpected listing: {other:?}"),
        }

        let wrapped: ProxyListing =
            serde_json::from_str(r#"{"tracks": [{"code": "ja", "label": "Japanese"}]}"#).unwrap();
        assert!(matches!(wrapped, ProxyListing::Wrapped { ref languages } if languages.len() == 1));
    }
}
