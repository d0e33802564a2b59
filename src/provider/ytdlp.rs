//! yt-dlp provider
//!
//! Runs `yt-dlp -J --skip-download` to obtain the video info document and
//! reads caption tracks from it. Manual subtitles win; auto-generated
//! captions are used only when there are none. Only XML caption formats
//! are taken, `srv1` before `srv3`.

use async_trait::async_trait;
use serde_json::Value;
use std::time::Duration;
use tokio::process::Command;

use crate::caption::{CaptionSet, CaptionTrack};
use crate::error::{CaptionError, Result};
use crate::provider::{fetch_markup, watch_url, CaptionSetProvider, PayloadFetcher};
use crate::subtitle::Payload;

const NAME: &str = "ytdlp";

const PREFERRED_EXTS: [&str; 2] = ["srv1", "srv3"];

pub struct YtDlpProvider {
    client: reqwest::Client,
    binary: String,
    watch_base: String,
    timeout: Duration,
}

impl YtDlpProvider {
    pub fn new(client: reqwest::Client, binary: &str, watch_base: &str, timeout: Duration) -> Self {
        Self {
            client,
            binary: binary.to_string(),
            watch_base: watch_base.to_string(),
            timeout,
        }
    }

    async fn video_info(&self, video_id: &str) -> Result<Value> {
        let mut cmd = Command::new(&self.binary);
        cmd.arg("-J")
            .arg("--skip-download")
            .arg("--no-warnings")
            .arg(watch_url(&self.watch_base, video_id))
            .kill_on_drop(true);

        let output = tokio::time::timeout(self.timeout, cmd.output())
            .await
            .map_err(|_| CaptionError::provider_unavailable(NAME, "timed out"))?
            .map_err(|e| CaptionError::provider_unavailable(NAME, format!("spawn failed: {}", e)))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            let first_line = stderr.lines().next().unwrap_or("").trim().to_string();
            return Err(CaptionError::provider_unavailable(
                NAME,
                format!("exit {}: {}", output.status, first_line),
            ));
        }

        serde_json::from_slice(&output.stdout)
            .map_err(|e| CaptionError::provider_unavailable(NAME, format!("bad info JSON: {}", e)))
    }
}

#[async_trait]
impl CaptionSetProvider for YtDlpProvider {
    fn name(&self) -> &str {
        NAME
    }

    fn method(&self) -> &str {
        "yt-dlp"
    }

    async fn list_tracks(&self, video_id: &str) -> Result<CaptionSet> {
        let info = self.video_info(video_id).await?;
        Ok(tracks_from_info(&info))
    }
}

#[async_trait]
impl PayloadFetcher for YtDlpProvider {
    async fn fetch_payload(&self, track: &CaptionTrack) -> Result<Payload> {
        fetch_markup(&self.client, NAME, &track.content_locator).await
    }
}

/// Caption tracks from a yt-dlp info document, in the document's key order
pub fn tracks_from_info(info: &Value) -> CaptionSet {
    let manual = tracks_from_map(info.get("subtitles"));
    if !manual.is_empty() {
        return manual;
    }
    tracks_from_map(info.get("automatic_captions"))
}

fn tracks_from_map(map: Option<&Value>) -> CaptionSet {
    let Some(map) = map.and_then(Value::as_object) else {
        return Vec::new();
    };

    map.iter()
        .filter_map(|(lang, formats)| {
            let formats = formats.as_array()?;
            let chosen = PREFERRED_EXTS.iter().find_map(|ext| {
                formats
                    .iter()
                    .find(|f| f.get("ext").and_then(Value::as_str) == Some(*ext))
            })?;
            let url = chosen.get("url")?.as_str()?;
            let name = chosen.get("name").and_then(Value::as_str).unwrap_or("");
            Some(CaptionTrack::new(name, lang.as_str(), url))
        })
        .collect()
}
