use thiserror::Error;

/// Main error type for the caption server
#[derive(Error, Debug)]
pub enum CaptionError {
    #[error("Missing required parameter: {0}")]
    MissingParameter(String),

    #[error("No captions available for this video")]
    NoCaptionsAvailable,

    #[error("Provider {provider} unavailable: {reason}")]
    ProviderUnavailable { provider: String, reason: String },

    #[error("Caption content fetch failed ({provider}): {reason}")]
    ContentFetchFailed { provider: String, reason: String },

    #[error("Unparsable format: {0}")]
    UnparsableFormat(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl CaptionError {
    pub fn provider_unavailable(provider: &str, reason: impl ToString) -> Self {
        CaptionError::ProviderUnavailable {
            provider: provider.to_string(),
            reason: reason.to_string(),
        }
    }

    pub fn content_fetch_failed(provider: &str, reason: impl ToString) -> Self {
        CaptionError::ContentFetchFailed {
            provider: provider.to_string(),
            reason: reason.to_string(),
        }
    }

    /// Stable machine-readable name of the error kind
    pub fn kind(&self) -> &'static str {
        match self {
            CaptionError::MissingParameter(_) => "MissingParameter",
            CaptionError::NoCaptionsAvailable => "NoCaptionsAvailable",
            CaptionError::ProviderUnavailable { .. } => "ProviderUnavailable",
            CaptionError::ContentFetchFailed { .. } => "ContentFetchFailed",
            CaptionError::UnparsableFormat(_) => "UnparsableFormat",
            CaptionError::Config(_) => "Config",
            CaptionError::Io(_) => "Io",
        }
    }

    /// Rank used when several providers failed and only one error can be
    /// reported. Higher means the error says more about the video itself.
    pub fn specificity(&self) -> u8 {
        match self {
            CaptionError::NoCaptionsAvailable => 4,
            CaptionError::ContentFetchFailed { .. } => 3,
            CaptionError::UnparsableFormat(_) => 2,
            CaptionError::ProviderUnavailable { .. } => 1,
            _ => 0,
        }
    }
}

/// Result type alias for convenience
pub type Result<T> = std::result::Result<T, CaptionError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = CaptionError::provider_unavailable("official", "status 403");
        assert_eq!(err.to_string(), "Provider official unavailable: status 403");
        assert_eq!(err.kind(), "ProviderUnavailable");
    }

    #[test]
    fn test_specificity_order() {
        assert!(
            CaptionError::NoCaptionsAvailable.specificity()
                > CaptionError::provider_unavailable("x", "y").specificity()
        );
        assert!(
            CaptionError::content_fetch_failed("x", "y").specificity()
                > CaptionError::UnparsableFormat("z".into()).specificity()
        );
    }
}
