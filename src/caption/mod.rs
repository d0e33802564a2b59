//! Caption track model and selection
//!
//! - `CaptionTrack` / `CaptionSet` as returned by one provider call
//! - Language-priority track selection (`resolver`)

pub mod resolver;

use serde::Serialize;

pub use resolver::resolve;

/// One available caption stream for a video
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CaptionTrack {
    pub display_name: String,
    pub language_code: String,
    /// URL or id used to fetch the track content
    pub content_locator: String,
}

impl CaptionTrack {
    pub fn new(
        display_name: impl Into<String>,
        language_code: impl Into<String>,
        content_locator: impl Into<String>,
    ) -> Self {
        Self {
            display_name: display_name.into(),
            language_code: language_code.into(),
            content_locator: content_locator.into(),
        }
    }

    /// Human-readable label, e.g. `Korean (ko)`
    pub fn label(&self) -> String {
        if self.display_name.is_empty() {
            self.language_code.clone()
        } else {
            format!("{} ({})", self.display_name, self.language_code)
        }
    }
}

/// Tracks in provider order
pub type CaptionSet = Vec<CaptionTrack>;

/// Outcome of track resolution
#[derive(Debug, Clone)]
pub struct SelectionResult {
    pub selected: CaptionTrack,
    pub available: CaptionSet,
    pub language_priority: Vec<String>,
}

impl SelectionResult {
    /// Labels of every available track, in provider order
    pub fn available_labels(&self) -> Vec<String> {
        self.available.iter().map(CaptionTrack::label).collect()
    }
}
