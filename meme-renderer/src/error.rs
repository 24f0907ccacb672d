//! Renderer error types.

use meme_core::MemeError;
use thiserror::Error;

/// Result type for renderer operations.
pub type RenderResult<T> = Result<T, RenderError>;

/// Errors that can occur while flattening or decoding images.
#[derive(Debug, Error)]
pub enum RenderError {
    /// The composition refused the operation (e.g. no background).
    #[error(transparent)]
    Core(#[from] MemeError),

    /// Resource loading or decoding failed.
    #[error("Failed to load resource: {0}")]
    Resource(String),

    /// SVG building, rasterization or encoding failed.
    #[error("Export failed: {0}")]
    Export(String),
}

impl From<RenderError> for MemeError {
    fn from(err: RenderError) -> Self {
        match err {
            RenderError::Core(inner) => inner,
            RenderError::Resource(msg) => Self::ImageDecode(msg),
            RenderError::Export(msg) => Self::InvalidOperation(msg),
        }
    }
}
