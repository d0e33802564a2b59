//! Official captions API provider
//!
//! Lists tracks with `GET {base}/captions?part=snippet&videoId=..&key=..`,
//! trying each API key in order until one answers. The winning key is baked
//! into every track's download locator.

use async_trait::async_trait;
use serde::Deserialize;

use crate::caption::{CaptionSet, CaptionTrack};
use crate::error::{CaptionError, Result};
use crate::provider::{fetch_markup, get_listing, CaptionSetProvider, PayloadFetcher};
use crate::subtitle::Payload;

const NAME: &str = "official";

#[derive(Debug, Deserialize)]
struct CaptionListResponse {
    #[serde(default)]
    items: Vec<CaptionItem>,
}

#[derive(Debug, Deserialize)]
struct CaptionItem {
    id: String,
    snippet: CaptionSnippet,
}

#[derive(Debug, Deserialize)]
struct CaptionSnippet {
    language: String,
    #[serde(default)]
    name: String,
}

pub struct OfficialApiProvider {
    client: reqwest::Client,
    base_url: String,
    api_keys: Vec<String>,
}

impl OfficialApiProvider {
    pub fn new(client: reqwest::Client, base_url: &str, api_keys: Vec<String>) -> Self {
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_keys,
        }
    }

    async fn list_with_key(&self, video_id: &str, key: &str) -> Result<CaptionSet> {
        let request = self
            .client
            .get(format!("{}/captions", self.base_url))
            .query(&[("part", "snippet"), ("videoId", video_id), ("key", key)]);
        let body = get_listing(request, NAME).await?;

        let list: CaptionListResponse = serde_json::from_str(&body)
            .map_err(|e| CaptionError::provider_unavailable(NAME, format!("bad listing: {}", e)))?;

        list.items
            .into_iter()
            .map(|item| {
                let locator = self.download_url(&item.id, key)?;
                Ok(CaptionTrack::new(
                    item.snippet.name,
                    item.snippet.language,
                    locator,
                ))
            })
            .collect()
    }

    fn download_url(&self, caption_id: &str, key: &str) -> Result<String> {
        let mut url = url::Url::parse(&format!("{}/captions/", self.base_url))
            .and_then(|base| base.join(caption_id))
            .map_err(|e| CaptionError::provider_unavailable(NAME, e))?;
        url.query_pairs_mut()
            .append_pair("key", key)
            .append_pair("tfmt", "srv3");
        Ok(url.into())
    }
}

#[async_trait]
impl CaptionSetProvider for OfficialApiProvider {
    fn name(&self) -> &str {
        NAME
    }

    fn method(&self) -> &str {
        "YouTube Data API v3"
    }

    async fn list_tracks(&self, video_id: &str) -> Result<CaptionSet> {
        let mut last_error = None;

        for (index, key) in self.api_keys.iter().enumerate() {
            match self.list_with_key(video_id, key).await {
                Ok(tracks) => {
                    tracing::debug!(key_index = index, tracks = tracks.len(), "API key accepted");
                    return Ok(tracks);
                }
                Err(e) => {
                    tracing::warn!(key_index = index, "API key failed: {}", e);
                    last_error = Some(e);
                }
            }
        }

        Err(last_error.unwrap_or_else(|| CaptionError::provider_unavailable(NAME, "no API key")))
    }
}

#[async_trait]
impl PayloadFetcher for OfficialApiProvider {
    async fn fetch_payload(&self, track: &CaptionTrack) -> Result<Payload> {
        fetch_markup(&self.client, NAME, &track.content_locator).await
    }
}
