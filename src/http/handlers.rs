//! HTTP request handlers
//!
//! Domain errors are answered with HTTP 200 and an `error` field in the
//! body; clients inspect the body, not the status.

use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::error::CaptionError;
use crate::service::CaptionOutcome;
use crate::state::AppState;

const MISSING_VIDEO_ID: &str = "videoId가 필요합니다";
const MISSING_API_KEY: &str = "API 키가 필요합니다";
const COLLECTION_FAILED: &str = "자막 수집 실패";
const NO_CAPTIONS: &str = "이 영상에는 자막이 없습니다.";

/// Query parameters of the subtitle endpoint
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubtitleQuery {
    pub video_id: Option<String>,
    pub api_key: Option<String>,
    /// Comma-separated language priority overriding the configured one
    pub lang: Option<String>,
    pub debug: Option<String>,
}

impl SubtitleQuery {
    fn video_id(&self) -> Option<&str> {
        non_blank(self.video_id.as_deref())
    }

    fn api_key(&self) -> Option<&str> {
        non_blank(self.api_key.as_deref())
    }

    fn wants_debug(&self) -> bool {
        matches!(
            self.debug.as_deref().map(str::trim),
            Some("1") | Some("true") | Some("yes")
        )
    }

    fn language_priority(&self) -> Option<Vec<String>> {
        let langs: Vec<String> = self
            .lang
            .as_deref()?
            .split(',')
            .map(|l| l.trim().to_string())
            .filter(|l| !l.is_empty())
            .collect();
        (!langs.is_empty()).then_some(langs)
    }
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

/// Successful subtitle response
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubtitleResponse {
    pub success: bool,
    pub video_id: String,
    pub available_languages: Vec<String>,
    pub subtitle: String,
    pub language: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub method: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub debug: Option<serde_json::Value>,
}

/// Error response body
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorBody {
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub video_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

/// HTTP error type
#[derive(Debug)]
pub struct ApiError {
    pub error: CaptionError,
    pub video_id: Option<String>,
}

impl ApiError {
    fn body(&self) -> ErrorBody {
        match &self.error {
            CaptionError::MissingParameter(name) if name == "apiKey" => ErrorBody {
                error: MISSING_API_KEY.to_string(),
                message: None,
                video_id: self.video_id.clone(),
                details: None,
            },
            CaptionError::MissingParameter(_) => ErrorBody {
                error: MISSING_VIDEO_ID.to_string(),
                message: None,
                video_id: None,
                details: None,
            },
            CaptionError::NoCaptionsAvailable => ErrorBody {
                error: COLLECTION_FAILED.to_string(),
                message: Some(NO_CAPTIONS.to_string()),
                video_id: self.video_id.clone(),
                details: Some(self.error.kind().to_string()),
            },
            other => ErrorBody {
                error: COLLECTION_FAILED.to_string(),
                message: Some(other.to_string()),
                video_id: self.video_id.clone(),
                details: Some(other.kind().to_string()),
            },
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (StatusCode::OK, Json(self.body())).into_response()
    }
}

/// Health check endpoint
pub async fn health_check() -> &'static str {
    "OK"
}

/// Version endpoint
pub async fn version_check() -> &'static str {
    concat!("caption-server v", env!("CARGO_PKG_VERSION"))
}

/// CORS preflight; headers are added by the router
pub async fn preflight() -> StatusCode {
    StatusCode::OK
}

/// Subtitle endpoint
/// GET|POST /api/subtitles?videoId=..[&apiKey=..][&lang=ko,en][&debug=1]
pub async fn fetch_subtitles(
    State(state): State<Arc<AppState>>,
    Query(query): Query<SubtitleQuery>,
) -> Result<Json<SubtitleResponse>, ApiError> {
    let Some(video_id) = query.video_id() else {
        return Err(ApiError {
            error: CaptionError::MissingParameter("videoId".to_string()),
            video_id: None,
        });
    };
    let video_id = video_id.to_string();

    if state.config.providers.require_api_key && query.api_key().is_none() {
        return Err(ApiError {
            error: CaptionError::MissingParameter("apiKey".to_string()),
            video_id: Some(video_id),
        });
    }

    let language_priority = query
        .language_priority()
        .unwrap_or_else(|| state.config.transcript.language_priority.clone());

    tracing::info!(video_id = %video_id, "subtitle request");

    let service = state.caption_service(query.api_key());
    let outcome = service
        .run(&video_id, &language_priority)
        .await
        .map_err(|error| {
            tracing::error!(video_id = %video_id, "subtitle collection failed: {}", error);
            ApiError {
                error,
                video_id: Some(video_id.clone()),
            }
        })?;

    let debug = (state.config.debug.enabled && query.wants_debug())
        .then(|| debug_object(&outcome, &language_priority));

    let (title, author) = match &outcome.metadata {
        Some(meta) => (Some(meta.title.clone()), Some(meta.author_name.clone())),
        None => (None, None),
    };

    Ok(Json(SubtitleResponse {
        success: true,
        video_id,
        available_languages: outcome.available_languages,
        subtitle: outcome.subtitle,
        language: outcome.language,
        method: Some(outcome.method),
        title,
        author,
        debug,
    }))
}

fn debug_object(outcome: &CaptionOutcome, language_priority: &[String]) -> serde_json::Value {
    serde_json::json!({
        "attempts": outcome.attempts,
        "languagePriority": language_priority,
        "format": outcome.format.map(|f| f.as_str()),
        "xmlSample": outcome.payload_sample,
    })
}
