//! Watch-page scraping provider
//!
//! The watch page embeds the player response as a JavaScript assignment.
//! The blob is located by trying a list of markers in order, then cut out
//! with string-aware brace matching. None of the markers is assumed stable,
//! so a page matching none of them is reported as `UnparsableFormat`.

use async_trait::async_trait;
use serde_json::Value;

use crate::caption::{CaptionSet, CaptionTrack};
use crate::error::{CaptionError, Result};
use crate::provider::{fetch_markup, get_listing, watch_url, CaptionSetProvider, PayloadFetcher};
use crate::subtitle::Payload;

const NAME: &str = "scraped";

/// Marker preceding the JSON object, and the pointer to the caption track
/// array inside the object that follows it
const PLAYER_PATTERNS: &[(&str, &str)] = &[
    (
        "var ytInitialPlayerResponse = ",
        "/captions/playerCaptionsTracklistRenderer/captionTracks",
    ),
    (
        "ytInitialPlayerResponse = ",
        "/captions/playerCaptionsTracklistRenderer/captionTracks",
    ),
    (
        "\"captions\":",
        "/playerCaptionsTracklistRenderer/captionTracks",
    ),
];

pub struct ScrapedPageProvider {
    client: reqwest::Client,
    base_url: String,
}

impl ScrapedPageProvider {
    pub fn new(client: reqwest::Client, base_url: &str) -> Self {
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    fn absolute(&self, locator: &str) -> String {
        if locator.starts_with('/') {
            format!("{}{}", self.base_url, locator)
        } else {
            locator.to_string()
        }
    }
}

#[async_trait]
impl CaptionSetProvider for ScrapedPageProvider {
    fn name(&self) -> &str {
        NAME
    }

    fn method(&self) -> &str {
        "Watch page player metadata"
    }

    async fn list_tracks(&self, video_id: &str) -> Result<CaptionSet> {
        let request = self
            .client
            .get(watch_url(&self.base_url, video_id))
            .header(reqwest::header::ACCEPT_LANGUAGE, "ko,en;q=0.8");
        let html = get_listing(request, NAME).await?;

        let tracks = caption_tracks_from_page(&html)?
            .into_iter()
            .map(|mut track| {
                track.content_locator = self.absolute(&track.content_locator);
                track
            })
            .collect();
        Ok(tracks)
    }
}

#[async_trait]
impl PayloadFetcher for ScrapedPageProvider {
    async fn fetch_payload(&self, track: &CaptionTrack) -> Result<Payload> {
        fetch_markup(&self.client, NAME, &track.content_locator).await
    }
}

/// Caption tracks listed in a watch page.
///
/// A player blob without a caption section yields an empty set; a page with
/// no recognizable blob is `UnparsableFormat`.
pub fn caption_tracks_from_page(html: &str) -> Result<CaptionSet> {
    for (marker, pointer) in PLAYER_PATTERNS {
        let Some(blob) = extract_json_after(html, marker) else {
            continue;
        };
        let value: Value = match serde_json::from_str(blob) {
            Ok(value) => value,
            Err(e) => {
                tracing::debug!(marker, "player blob is not JSON: {}", e);
                continue;
            }
        };

        let tracks = value
            .pointer(pointer)
            .and_then(Value::as_array)
            .map(|tracks| tracks.iter().filter_map(track_from_json).collect())
            .unwrap_or_default();
        return Ok(tracks);
    }

    Err(CaptionError::UnparsableFormat(
        "no player response found in watch page".to_string(),
    ))
}

fn track_from_json(track: &Value) -> Option<CaptionTrack> {
    let base_url = track.get("baseUrl")?.as_str()?;
    let language = track.get("languageCode")?.as_str()?;
    let name = track
        .pointer("/name/simpleText")
        .or_else(|| track.pointer("/name/runs/0/text"))
        .and_then(Value::as_str)
        .unwrap_or("");
    Some(CaptionTrack::new(name, language, base_url))
}

/// The balanced `{...}` object that follows the first occurrence of `marker`
fn extract_json_after<'a>(html: &'a str, marker: &str) -> Option<&'a str> {
    let start = html.find(marker)? + marker.len();
    let remaining = html[start..].trim_start();
    if !remaining.starts_with('{') {
        return None;
    }

    let mut depth = 0usize;
    let mut in_string = false;
    let mut escape_next = false;

    for (i, ch) in remaining.char_indices() {
        if escape_next {
            escape_next = false;
            continue;
        }
        match ch {
            '\\' if in_string => escape_next = true,
            '"' => in_string = !in_string,
            '{' if !in_string => depth += 1,
            '}' if !in_string => {
                depth -= 1;
                if depth == 0 {
                    return Some(&remaining[..=i]);
                }
            }
            _ => {}
        }
    }
    None
}
