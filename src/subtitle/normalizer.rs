//! Payload → transcript normalization

use regex::Regex;
use std::sync::LazyLock;

use crate::error::{CaptionError, Result};
use crate::subtitle::{
    decode_entities, Payload, PayloadFormat, RawEntry, Transcript, TranscriptLine,
};

// `(?s)` lets caption bodies span line breaks. Self-closing tags match
// with no body group so they cannot swallow the next element.
static TEXT_TAG_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?s)<text\b([^>]*?)(?:/>|>(.*?)</text>)").unwrap()
});
static P_TAG_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)<p\b([^>]*?)(?:/>|>(.*?)</p>)").unwrap());
static CONTENT_ATTR_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"content="([^"]*)""#).unwrap());
static START_ATTR_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"\bstart="([^"]*)""#).unwrap());
static MS_ATTR_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"\bt="(\d+)""#).unwrap());
static TAG_REGEX: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"<[^>]*>").unwrap());

/// Markup formats in the order they are attempted
const MARKUP_FORMATS: [PayloadFormat; 4] = [
    PayloadFormat::XmlTextTags,
    PayloadFormat::XmlPTags,
    PayloadFormat::ContentAttribute,
    PayloadFormat::StructuredList,
];

/// Line filtering options
#[derive(Debug, Clone, Copy, Default)]
pub struct NormalizeOptions {
    /// Drop lines shorter than this many characters (0 disables)
    pub min_line_chars: usize,
}

impl NormalizeOptions {
    fn keep(&self, text: &str) -> bool {
        !text.is_empty() && text.chars().count() >= self.min_line_chars
    }
}

/// Normalize `payload` as `format`.
///
/// Fails with `UnparsableFormat` when the format's pattern matches nothing.
/// Matches that are filtered out still count as recognized, so the result
/// may be an empty transcript.
pub fn normalize(
    payload: &Payload,
    format: PayloadFormat,
    options: &NormalizeOptions,
) -> Result<Transcript> {
    match (payload, format) {
        (Payload::Entries(entries), PayloadFormat::StructuredList) => {
            Ok(from_entries(entries, options))
        }
        (Payload::Entries(_), other) => Err(CaptionError::UnparsableFormat(format!(
            "structured payload cannot be read as {}",
            other.as_str()
        ))),
        (Payload::Markup(text), PayloadFormat::XmlTextTags) => {
            from_tags(text, &TEXT_TAG_REGEX, format, options)
        }
        (Payload::Markup(text), PayloadFormat::XmlPTags) => {
            from_tags(text, &P_TAG_REGEX, format, options)
        }
        (Payload::Markup(text), PayloadFormat::ContentAttribute) => {
            from_content_attributes(text, options)
        }
        (Payload::Markup(text), PayloadFormat::StructuredList) => {
            let entries = parse_json_entries(text)?;
            Ok(from_entries(&entries, options))
        }
    }
}

/// Try every format that fits the payload, first recognized one wins.
pub fn normalize_auto(
    payload: &Payload,
    options: &NormalizeOptions,
) -> Result<(Transcript, PayloadFormat)> {
    let candidates: &[PayloadFormat] = match payload {
        Payload::Entries(_) => &[PayloadFormat::StructuredList],
        Payload::Markup(_) => &MARKUP_FORMATS,
    };

    for format in candidates {
        match normalize(payload, *format, options) {
            Ok(transcript) => {
                tracing::debug!(
                    format = format.as_str(),
                    lines = transcript.len(),
                    "caption payload normalized"
                );
                return Ok((transcript, *format));
            }
            Err(e) => tracing::trace!(format = format.as_str(), "format attempt failed: {}", e),
        }
    }

    Err(CaptionError::UnparsableFormat(
        "no recognized caption markup in payload".to_string(),
    ))
}

/// Auto-normalize and render; never fails, falls back to the placeholder.
pub fn normalize_to_text(payload: &Payload, options: &NormalizeOptions) -> String {
    normalize_auto(payload, options)
        .map(|(transcript, _)| transcript)
        .unwrap_or_default()
        .render()
}

fn from_tags(
    text: &str,
    tag: &Regex,
    format: PayloadFormat,
    options: &NormalizeOptions,
) -> Result<Transcript> {
    let mut matched = false;
    let mut lines = Vec::new();

    for caps in tag.captures_iter(text) {
        matched = true;
        let attrs = caps.get(1).map_or("", |m| m.as_str());
        let Some(body) = caps.get(2).map(|m| m.as_str()) else {
            continue;
        };

        let stripped = TAG_REGEX.replace_all(body, "");
        let line = clean_text(&stripped);
        if options.keep(&line) {
            lines.push(TranscriptLine {
                offset_secs: Some(tag_offset(attrs)),
                text: line,
            });
        }
    }

    if !matched {
        return Err(CaptionError::UnparsableFormat(format!(
            "no {} matches",
            format.as_str()
        )));
    }
    Ok(Transcript { lines })
}

fn from_content_attributes(text: &str, options: &NormalizeOptions) -> Result<Transcript> {
    let mut matched = false;
    let mut lines = Vec::new();

    for caps in CONTENT_ATTR_REGEX.captures_iter(text) {
        matched = true;
        let line = clean_text(caps.get(1).map_or("", |m| m.as_str()));
        if options.keep(&line) {
            lines.push(TranscriptLine {
                offset_secs: None,
                text: line,
            });
        }
    }

    if !matched {
        return Err(CaptionError::UnparsableFormat(
            "no content attributes".to_string(),
        ));
    }
    Ok(Transcript { lines })
}

fn from_entries(entries: &[RawEntry], options: &NormalizeOptions) -> Transcript {
    let lines = entries
        .iter()
        .filter_map(|entry| {
            let text = clean_text(&entry.text);
            options.keep(&text).then(|| TranscriptLine {
                offset_secs: Some(entry.start_secs()),
                text,
            })
        })
        .collect();
    Transcript { lines }
}

/// Structured lists arriving as text: a bare array, or an object holding one
fn parse_json_entries(text: &str) -> Result<Vec<RawEntry>> {
    let value: serde_json::Value = serde_json::from_str(text.trim())
        .map_err(|e| CaptionError::UnparsableFormat(format!("not a JSON list: {}", e)))?;
    entries_from_value(value)
}

/// Pull caption records out of a JSON document.
///
/// Accepts a bare array or an object with the array under `transcript`,
/// `subtitles`, `captions` or `data`.
pub fn entries_from_value(value: serde_json::Value) -> Result<Vec<RawEntry>> {
    let list = match value {
        serde_json::Value::Array(_) => value,
        serde_json::Value::Object(mut map) => ["transcript", "subtitles", "captions", "data"]
            .iter()
            .find_map(|key| map.remove(*key).filter(|v| v.is_array()))
            .ok_or_else(|| {
                CaptionError::UnparsableFormat("JSON object holds no caption list".to_string())
            })?,
        _ => {
            return Err(CaptionError::UnparsableFormat(
                "JSON payload is not a list".to_string(),
            ))
        }
    };
    serde_json::from_value(list)
        .map_err(|e| CaptionError::UnparsableFormat(format!("bad caption entry: {}", e)))
}

fn tag_offset(attrs: &str) -> f64 {
    if let Some(start) = START_ATTR_REGEX
        .captures(attrs)
        .and_then(|c| c.get(1))
        .and_then(|m| m.as_str().trim().parse::<f64>().ok())
    {
        return start.max(0.0);
    }
    MS_ATTR_REGEX
        .captures(attrs)
        .and_then(|c| c.get(1))
        .and_then(|m| m.as_str().parse::<u64>().ok())
        .map(|ms| ms as f64 / 1000.0)
        .unwrap_or(0.0)
}

/// Decode entities, fold internal line breaks and trim
fn clean_text(raw: &str) -> String {
    decode_entities(raw)
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}
