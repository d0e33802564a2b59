//! Fixture upstream for integration tests
//!
//! A small axum app bound to an ephemeral port that imitates the upstream
//! surfaces the providers talk to: the watch page, the timed-text endpoint,
//! the official captions API, a transcript proxy and oEmbed.

use axum::{
    extract::{Path, Query},
    http::StatusCode,
    response::{Html, IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde::Deserialize;

use crate::config::{ProviderConfig, ProviderKind, ProxyConfig, ServerConfig};

/// API key the fixture captions API accepts
pub const GOOD_KEY: &str = "good-key";

/// Video with an English and a Korean track
pub const VIDEO_WITH_CAPTIONS: &str = "vid";
/// Video whose player response has no caption section
pub const VIDEO_WITHOUT_CAPTIONS: &str = "nocap";
/// Video whose tracks are listed but whose content is refused
pub const VIDEO_LOCKED: &str = "locked";

pub const SRV1_KO: &str = r#"<?xml version="1.0" encoding="utf-8" ?><transcript><text start="0.5" dur="2.1">안녕하세요</text><text start="65.2" dur="3">Tom &amp; Jerry</text><text start="70" dur="1">   </text></transcript>"#;

pub const SRV3_EN: &str = r#"<timedtext format="3"><body><p t="1500" d="2000">Hello <s>there</s></p><p t="62000" d="1000">Bye</p></body></timedtext>"#;

#[derive(Debug, Default, Deserialize)]
pub struct WatchQuery {
    #[serde(default)]
    pub v: String,
}

#[derive(Debug, Default, Deserialize)]
pub struct TimedTextQuery {
    #[serde(default)]
    pub v: String,
    #[serde(default)]
    pub lang: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CaptionsQuery {
    #[serde(default)]
    pub video_id: String,
    #[serde(default)]
    pub key: String,
}

/// Watch page with the player response embedded as a script assignment
fn watch_page(video_id: &str) -> String {
    let captions = match video_id {
        VIDEO_WITHOUT_CAPTIONS => String::new(),
        _ => format!(
            r#","captions":{{"playerCaptionsTracklistRenderer":{{"captionTracks":[{{"baseUrl":"/api/timedtext?v={id}&lang=en","name":{{"simpleText":"English"}},"languageCode":"en"}},{{"baseUrl":"/api/timedtext?v={id}&lang=ko","name":{{"simpleText":"한국어"}},"languageCode":"ko"}}]}}}}"#,
            id = video_id
        ),
    };
    format!(
        r#"<!DOCTYPE html><html><head><title>fixture</title></head><body><script>var ytInitialPlayerResponse = {{"videoDetails":{{"videoId":"{}","title":"brace {{ in \"title\""}}{}}};var ytInitialData = {{}};</script></body></html>"#,
        video_id, captions
    )
}

async fn watch(Query(query): Query<WatchQuery>) -> Html<String> {
    Html(watch_page(&query.v))
}

async fn timedtext(Query(query): Query<TimedTextQuery>) -> Response {
    match (query.v.as_str(), query.lang.as_str()) {
        (VIDEO_LOCKED, _) => StatusCode::FORBIDDEN.into_response(),
        (_, "ko") => SRV1_KO.into_response(),
        (_, "en") => SRV3_EN.into_response(),
        _ => StatusCode::NOT_FOUND.into_response(),
    }
}

async fn captions_list(Query(query): Query<CaptionsQuery>) -> Response {
    if query.key != GOOD_KEY {
        return (StatusCode::FORBIDDEN, Json(serde_json::json!({"error": "quota"}))).into_response();
    }
    Json(serde_json::json!({
        "kind": "youtube#captionListResponse",
        "items": [
            {"id": format!("{}-en", query.video_id), "snippet": {"language": "en", "name": "English"}}
        ]
    }))
    .into_response()
}

async fn caption_download(Path(id): Path<String>, Query(query): Query<CaptionsQuery>) -> Response {
    if query.key != GOOD_KEY || !id.ends_with("-en") {
        return StatusCode::FORBIDDEN.into_response();
    }
    SRV3_EN.into_response()
}

async fn proxy_list(Path(video_id): Path<String>) -> Json<serde_json::Value> {
    if video_id == VIDEO_WITHOUT_CAPTIONS {
        return Json(serde_json::json!({"languages": []}));
    }
    Json(serde_json::json!({"languages": [{"code": "ko", "name": "Korean"}, "en"]}))
}

async fn proxy_transcript(Query(query): Query<TimedTextQuery>) -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "transcript": [
            {"offset": 3.7, "text": format!("{} line", query.lang)},
            {"start": "61", "text": "second &quot;line&quot;"}
        ]
    }))
}

async fn oembed() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "title": "Fixture Video",
        "author_name": "Fixture Channel",
        "type": "video"
    }))
}

/// Router serving every fixture endpoint
pub fn fixture_router() -> Router {
    Router::new()
        .route("/watch", get(watch))
        .route("/api/timedtext", get(timedtext))
        .route("/youtube/v3/captions", get(captions_list))
        .route("/youtube/v3/captions/{id}", get(caption_download))
        .route("/proxy/list/{video_id}", get(proxy_list))
        .route("/proxy/transcript", get(proxy_transcript))
        .route("/oembed", get(oembed))
}

/// Serve the fixture router on 127.0.0.1 and return its base URL
pub async fn spawn_upstream() -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind fixture upstream");
    let addr = listener.local_addr().expect("fixture address");
    tokio::spawn(async move {
        axum::serve(listener, fixture_router())
            .await
            .expect("fixture upstream");
    });
    format!("http://{}", addr)
}

/// Server configuration pointing every provider at the fixture upstream
pub fn upstream_config(base: &str, order: Vec<ProviderKind>) -> ServerConfig {
    let mut config = ServerConfig {
        providers: ProviderConfig {
            order,
            timeout_secs: 5,
            official_api_base: format!("{}/youtube/v3", base),
            watch_page_base: base.to_string(),
            oembed_base: format!("{}/oembed", base),
            proxy: Some(ProxyConfig {
                list_url: format!("{}/proxy/list/{{videoId}}", base),
                transcript_url: format!("{}/proxy/transcript?v={{videoId}}&lang={{lang}}", base),
            }),
            ytdlp_binary: "caption-server-missing-yt-dlp".to_string(),
            ..Default::default()
        },
        ..Default::default()
    };
    config.debug.enabled = true;
    config
}
