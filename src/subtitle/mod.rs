//! Caption payload normalization
//!
//! This module turns raw caption payloads into a time-stamped transcript:
//! - Payload shapes returned by providers (markup text or structured entries)
//! - HTML entity decoding with a closed entity table
//! - Tag extraction for `<text>` / `<p>` markup and `content="..."` attributes
//! - `[MM:SS] text` rendering

pub mod entities;
pub mod normalizer;

use serde::Deserialize;

pub use entities::decode_entities;
pub use normalizer::{normalize_auto, normalize_to_text, NormalizeOptions};

/// Rendered in place of a transcript that has no surviving lines
pub const NO_TEXT_PLACEHOLDER: &str = "자막 텍스트를 찾을 수 없습니다.";

/// Recognized payload layouts, in auto-detection order
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PayloadFormat {
    /// `<text start="..">..</text>` (srv1 / timedtext)
    XmlTextTags,
    /// `<p t=".." | start="..">..</p>` (srv3)
    XmlPTags,
    /// Bare `content="..."` attributes, no timing
    ContentAttribute,
    /// Sequence of `{start, text}` records
    StructuredList,
}

impl PayloadFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            PayloadFormat::XmlTextTags => "xml_text_tags",
            PayloadFormat::XmlPTags => "xml_p_tags",
            PayloadFormat::ContentAttribute => "content_attribute",
            PayloadFormat::StructuredList => "structured_list",
        }
    }
}

/// One caption record as delivered by structured sources
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawEntry {
    /// Seconds as a number or numeric string
    #[serde(default, alias = "offset")]
    pub start: Option<serde_json::Value>,
    #[serde(default)]
    pub text: String,
}

impl RawEntry {
    #[cfg(test)]
    pub fn new(start: impl Into<serde_json::Value>, text: impl Into<String>) -> Self {
        Self {
            start: Some(start.into()),
            text: text.into(),
        }
    }

    /// Start offset in seconds, 0 when missing or unparsable
    pub fn start_secs(&self) -> f64 {
        let parsed = match &self.start {
            Some(serde_json::Value::Number(n)) => n.as_f64(),
            Some(serde_json::Value::String(s)) => s.trim().parse::<f64>().ok(),
            _ => None,
        };
        clamp_offset(parsed.unwrap_or(0.0))
    }
}

/// Raw caption content fetched for one track
#[derive(Debug, Clone)]
pub enum Payload {
    Markup(String),
    Entries(Vec<RawEntry>),
}

impl Payload {
    /// Leading characters of the payload, for diagnostics
    pub fn sample(&self, max_chars: usize) -> String {
        match self {
            Payload::Markup(text) => text.chars().take(max_chars).collect(),
            Payload::Entries(entries) => entries
                .iter()
                .map(|e| e.text.as_str())
                .collect::<Vec<_>>()
                .join("\n")
                .chars()
                .take(max_chars)
                .collect(),
        }
    }
}

/// One normalized caption line
#[derive(Debug, Clone, PartialEq)]
pub struct TranscriptLine {
    /// `None` for sources that carry no timing
    pub offset_secs: Option<f64>,
    pub text: String,
}

impl TranscriptLine {
    /// Render as `[MM:SS] text`, or just `text` when untimed
    pub fn render(&self) -> String {
        match self.offset_secs {
            Some(secs) => format!("[{}] {}", format_timestamp(secs), self.text),
            None => self.text.clone(),
        }
    }
}

/// Lines in source order
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Transcript {
    pub lines: Vec<TranscriptLine>,
}

impl Transcript {
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    /// Rendered lines without the placeholder substitution
    pub fn rendered_lines(&self) -> Vec<String> {
        self.lines.iter().map(TranscriptLine::render).collect()
    }

    /// Newline-joined rendering; [`NO_TEXT_PLACEHOLDER`] when empty
    pub fn render(&self) -> String {
        if self.is_empty() {
            return NO_TEXT_PLACEHOLDER.to_string();
        }
        self.rendered_lines().join("\n")
    }
}

/// `MM:SS` from whole minutes and the floored remaining seconds
pub fn format_timestamp(offset_secs: f64) -> String {
    let secs = clamp_offset(offset_secs);
    let minutes = (secs / 60.0).floor() as u64;
    let seconds = (secs % 60.0).floor() as u64;
    format!("{:02}:{:02}", minutes, seconds)
}

fn clamp_offset(secs: f64) -> f64 {
    if secs.is_finite() && secs > 0.0 {
        secs
    } else {
        0.0
    }
}
