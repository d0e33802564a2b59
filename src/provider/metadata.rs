//! Video metadata via oEmbed

use serde::{Deserialize, Serialize};

use crate::error::{CaptionError, Result};
use crate::provider::{get_listing, watch_url};

const NAME: &str = "oembed";

/// Title and channel of a video
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VideoMetadata {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub author_name: String,
}

/// `GET {oembed_base}?url=<watch url>&format=json`
pub async fn fetch_metadata(
    client: &reqwest::Client,
    oembed_base: &str,
    watch_base: &str,
    video_id: &str,
) -> Result<VideoMetadata> {
    let request = client.get(oembed_base).query(&[
        ("url", watch_url(watch_base, video_id).as_str()),
        ("format", "json"),
    ]);
    let body = get_listing(request, NAME).await?;
    serde_json::from_str(&body)
        .map_err(|e| CaptionError::provider_unavailable(NAME, format!("bad oEmbed body: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_oembed_shape() {
        let meta: VideoMetadata = serde_json::from_str(
            r#"{"title":"Demo","author_name":"Channel","type":"video","version":"1.0"}"#,
        )
        .unwrap();
        assert_eq!(meta.title, "Demo");
        assert_eq!(meta.author_name, "Channel");
    }
}
