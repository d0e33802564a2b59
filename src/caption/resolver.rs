//! Track resolution by language priority

use crate::caption::{CaptionSet, CaptionTrack, SelectionResult};
use crate::error::{CaptionError, Result};
use crate::provider::CaptionSetProvider;

/// Pick one track from `available`.
///
/// Walks `language_priority` in order and returns the first track (in set
/// order) whose language code starts with the candidate, ignoring case.
/// Falls back to the first track when no candidate matches. Returns `None`
/// only for an empty set.
pub fn select_track<'a, S: AsRef<str>>(
    available: &'a [CaptionTrack],
    language_priority: &[S],
) -> Option<&'a CaptionTrack> {
    // Blank candidates would prefix-match every track.
    for candidate in language_priority
        .iter()
        .map(|c| c.as_ref().trim().to_lowercase())
        .filter(|c| !c.is_empty())
    {
        if let Some(track) = available
            .iter()
            .find(|t| t.language_code.to_lowercase().starts_with(&candidate))
        {
            return Some(track);
        }
    }
    available.first()
}

/// Fetch the caption set for `video_id` from `provider` and select a track.
pub async fn resolve<P: CaptionSetProvider + ?Sized>(
    video_id: &str,
    language_priority: &[String],
    provider: &P,
) -> Result<SelectionResult> {
    let available: CaptionSet = provider.list_tracks(video_id).await.map_err(|e| match e {
        CaptionError::NoCaptionsAvailable
        | CaptionError::ProviderUnavailable { .. }
        | CaptionError::UnparsableFormat(_) => e,
        other => CaptionError::provider_unavailable(provider.name(), other),
    })?;

    let selected = select_track(&available, language_priority)
        .cloned()
        .ok_or(CaptionError::NoCaptionsAvailable)?;

    tracing::debug!(
        provider = provider.name(),
        video_id,
        tracks = available.len(),
        selected = %selected.language_code,
        "caption track selected"
    );

    Ok(SelectionResult {
        selected,
        available,
        language_priority: language_priority.to_vec(),
    })
}
