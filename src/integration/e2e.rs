//! End-to-end tests: providers, service and router against the fixture upstream

use std::sync::Arc;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use tower::util::ServiceExt;

use crate::config::{ProviderKind, ServerConfig};
use crate::http::create_router;
use crate::integration::fixtures::{
    spawn_upstream, upstream_config, GOOD_KEY, VIDEO_LOCKED, VIDEO_WITHOUT_CAPTIONS,
    VIDEO_WITH_CAPTIONS,
};
use crate::provider::{
    CaptionSetProvider, OfficialApiProvider, PayloadFetcher, ScrapedPageProvider,
};
use crate::state::AppState;
use crate::subtitle::{normalize_auto, NormalizeOptions, PayloadFormat};

const KO_TRANSCRIPT: &str = "[00:00] 안녕하세요\n[01:05] Tom & Jerry";
const EN_TRANSCRIPT: &str = "[00:01] Hello there\n[01:02] Bye";

fn korean_first() -> Vec<String> {
    vec!["ko".to_string(), "en".to_string()]
}

async fn get_json(config: ServerConfig, uri: &str) -> serde_json::Value {
    let app = create_router(Arc::new(AppState::new(config).unwrap()));
    let response = app
        .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn test_scraped_provider_lists_and_fetches() {
    let base = spawn_upstream().await;
    let provider = ScrapedPageProvider::new(reqwest::Client::new(), &base);

    let tracks = provider.list_tracks(VIDEO_WITH_CAPTIONS).await.unwrap();
    assert_eq!(tracks.len(), 2);
    assert_eq!(tracks[1].display_name, "한국어");
    assert!(tracks[1].content_locator.starts_with(&base));

    let payload = provider.fetch_payload(&tracks[1]).await.unwrap();
    let (transcript, format) = normalize_auto(&payload, &NormalizeOptions::default()).unwrap();
    assert_eq!(format, PayloadFormat::XmlTextTags);
    assert_eq!(transcript.render(), KO_TRANSCRIPT);
}

#[tokio::test]
async fn test_official_provider_rotates_keys() {
    let base = spawn_upstream().await;
    let provider = OfficialApiProvider::new(
        reqwest::Client::new(),
        &format!("{}/youtube/v3", base),
        vec!["revoked".to_string(), GOOD_KEY.to_string()],
    );

    let tracks = provider.list_tracks(VIDEO_WITH_CAPTIONS).await.unwrap();
    assert_eq!(tracks.len(), 1);
    assert_eq!(tracks[0].language_code, "en");

    let payload = provider.fetch_payload(&tracks[0]).await.unwrap();
    let (transcript, format) = normalize_auto(&payload, &NormalizeOptions::default()).unwrap();
    assert_eq!(format, PayloadFormat::XmlPTags);
    assert_eq!(transcript.render(), EN_TRANSCRIPT);
}

#[tokio::test]
async fn test_service_falls_back_after_rejected_key() {
    let base = spawn_upstream().await;
    let mut config = upstream_config(&base, vec![ProviderKind::Official, ProviderKind::Scraped]);
    config.providers.api_keys = vec!["revoked".to_string()];
    let state = AppState::new(config).unwrap();

    let outcome = state
        .caption_service(None)
        .run(VIDEO_WITH_CAPTIONS, &korean_first())
        .await
        .unwrap();

    assert_eq!(outcome.subtitle, KO_TRANSCRIPT);
    assert_eq!(outcome.method, "Watch page player metadata");
    assert_eq!(outcome.attempts.len(), 2);
    assert_eq!(outcome.attempts[0].provider, "official");
    assert_eq!(outcome.attempts[0].error_kind, Some("ProviderUnavailable"));
    assert!(outcome.attempts[1].ok);
    assert!(outcome.metadata.is_none());
}

#[tokio::test]
async fn test_request_api_key_is_used() {
    let base = spawn_upstream().await;
    let config = upstream_config(&base, vec![ProviderKind::Official]);

    let body = get_json(
        config,
        &format!("/api/subtitles?videoId={}&apiKey={}", VIDEO_WITH_CAPTIONS, GOOD_KEY),
    )
    .await;

    assert_eq!(body["success"], true);
    assert_eq!(body["method"], "YouTube Data API v3");
    assert_eq!(body["language"], "English (en)");
    assert_eq!(body["subtitle"], EN_TRANSCRIPT);
}

#[tokio::test]
async fn test_router_success_with_metadata_and_debug() {
    let base = spawn_upstream().await;
    let mut config = upstream_config(&base, vec![ProviderKind::Scraped]);
    config.providers.fetch_metadata = true;

    let body = get_json(
        config,
        &format!("/api/subtitles?videoId={}&debug=1", VIDEO_WITH_CAPTIONS),
    )
    .await;

    assert_eq!(body["success"], true);
    assert_eq!(body["videoId"], VIDEO_WITH_CAPTIONS);
    assert_eq!(body["subtitle"], KO_TRANSCRIPT);
    assert_eq!(body["language"], "한국어 (ko)");
    assert_eq!(
        body["availableLanguages"],
        serde_json::json!(["English (en)", "한국어 (ko)"])
    );
    assert_eq!(body["title"], "Fixture Video");
    assert_eq!(body["author"], "Fixture Channel");
    assert_eq!(body["debug"]["format"], "xml_text_tags");
    assert_eq!(body["debug"]["attempts"][0]["provider"], "scraped");
    assert!(body["debug"]["xmlSample"]
        .as_str()
        .unwrap()
        .starts_with("<?xml"));
}

#[tokio::test]
async fn test_language_override_and_debug_gate() {
    let base = spawn_upstream().await;
    let mut config = upstream_config(&base, vec![ProviderKind::Scraped]);
    config.debug.enabled = false;

    let body = get_json(
        config,
        &format!("/api/subtitle?videoId={}&lang=en&debug=1", VIDEO_WITH_CAPTIONS),
    )
    .await;

    assert_eq!(body["language"], "English (en)");
    assert_eq!(body["subtitle"], EN_TRANSCRIPT);
    assert!(body.get("debug").is_none());
}

#[tokio::test]
async fn test_proxy_structured_transcript() {
    let base = spawn_upstream().await;
    let config = upstream_config(&base, vec![ProviderKind::Proxy]);

    let body = get_json(
        config,
        &format!("/api/subtitles?videoId={}&lang=en", VIDEO_WITH_CAPTIONS),
    )
    .await;

    assert_eq!(body["success"], true);
    assert_eq!(body["language"], "en");
    assert_eq!(
        body["availableLanguages"],
        serde_json::json!(["Korean (ko)", "en"])
    );
    assert_eq!(body["subtitle"], "[00:03] en line\n[01:01] second \"line\"");
}

#[tokio::test]
async fn test_video_without_captions() {
    let base = spawn_upstream().await;
    let config = upstream_config(&base, vec![ProviderKind::Scraped, ProviderKind::Proxy]);

    let body = get_json(
        config,
        &format!("/api/subtitles?videoId={}", VIDEO_WITHOUT_CAPTIONS),
    )
    .await;

    assert_eq!(body["error"], "자막 수집 실패");
    assert_eq!(body["message"], "이 영상에는 자막이 없습니다.");
    assert_eq!(body["videoId"], VIDEO_WITHOUT_CAPTIONS);
    assert!(body.get("success").is_none());
}

#[tokio::test]
async fn test_unreachable_content_returns_guidance() {
    let base = spawn_upstream().await;
    let config = upstream_config(&base, vec![ProviderKind::Scraped]);

    let body = get_json(config, &format!("/api/subtitles?videoId={}", VIDEO_LOCKED)).await;

    assert_eq!(body["success"], true);
    assert_eq!(body["language"], "한국어 (ko)");
    let subtitle = body["subtitle"].as_str().unwrap();
    assert!(subtitle.contains("사용 가능한 자막: 2개"));
    assert!(subtitle.contains(&format!("{}/watch?v={}", base, VIDEO_LOCKED)));
}

#[tokio::test]
async fn test_unreachable_content_without_guidance() {
    let base = spawn_upstream().await;
    let mut config = upstream_config(&base, vec![ProviderKind::Scraped]);
    config.transcript.placeholder_on_fetch_failure = false;

    let body = get_json(config, &format!("/api/subtitles?videoId={}", VIDEO_LOCKED)).await;

    assert_eq!(body["error"], "자막 수집 실패");
    assert_eq!(body["details"], "ContentFetchFailed");
}

#[tokio::test]
async fn test_missing_ytdlp_falls_through() {
    let base = spawn_upstream().await;
    let config = upstream_config(&base, vec![ProviderKind::Ytdlp, ProviderKind::Scraped]);
    let state = AppState::new(config).unwrap();

    let outcome = state
        .caption_service(None)
        .run(VIDEO_WITH_CAPTIONS, &korean_first())
        .await
        .unwrap();

    assert_eq!(outcome.attempts[0].provider, "ytdlp");
    assert_eq!(outcome.attempts[0].error_kind, Some("ProviderUnavailable"));
    assert_eq!(outcome.subtitle, KO_TRANSCRIPT);
}
