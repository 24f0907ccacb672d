//! Error types for meme composition and gallery operations.

use thiserror::Error;

/// Result type for core operations.
pub type MemeResult<T> = Result<T, MemeError>;

/// Errors that can occur in core operations.
#[derive(Debug, Error)]
pub enum MemeError {
    /// The raw prompt was blank; no generation request is sent.
    #[error("Please enter a prompt")]
    EmptyPrompt,

    /// The image service failed, returned a non-success status, or sent a
    /// malformed body.
    #[error("Generation failed: {0}")]
    GenerationFailed(String),

    /// A generation request is already pending for this session.
    #[error("A generation request is already in progress")]
    GenerationInFlight,

    /// Flatten, download or save attempted without a background image.
    #[error("Generate an image first")]
    NoBackground,

    /// Gallery append, fetch or delete failed at the transport boundary.
    #[error("Gallery persistence failed: {0}")]
    PersistenceFailed(String),

    /// A color string was not a `#rgb` or `#rrggbb` hex value.
    #[error("Invalid color: {0}")]
    InvalidColor(String),

    /// Invalid overlay operation (bad numeric input, unknown font, ...).
    #[error("Invalid operation on overlay: {0}")]
    InvalidOperation(String),

    /// Overlay not found in the composition.
    #[error("Overlay not found: {0}")]
    OverlayNotFound(String),

    /// An image reference could not be parsed or decoded.
    #[error("Invalid image: {0}")]
    ImageDecode(String),

    /// JSON serialization/deserialization error.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl MemeError {
    /// Whether this error should be shown to the user as-is rather than
    /// logged as a fault.
    #[must_use]
    pub fn is_user_facing(&self) -> bool {
        matches!(
            self,
            Self::EmptyPrompt
                | Self::GenerationFailed(_)
                | Self::GenerationInFlight
                | Self::NoBackground
                | Self::InvalidColor(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_facing_messages() {
        assert_eq!(MemeError::EmptyPrompt.to_string(), "Please enter a prompt");
        assert_eq!(MemeError::NoBackground.to_string(), "Generate an image first");
        assert!(MemeError::GenerationFailed("HTTP 500".into())
            .to_string()
            .contains("HTTP 500"));
    }

    #[test]
    fn test_persistence_failure_is_not_user_facing() {
        assert!(!MemeError::PersistenceFailed("down".into()).is_user_facing());
        assert!(MemeError::NoBackground.is_user_facing());
    }
}
