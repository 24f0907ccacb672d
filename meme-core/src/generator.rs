//! Image generation seam.

use async_trait::async_trait;

use crate::{ImageRef, MemeResult};

/// Something that turns a normalized prompt into an image.
///
/// Implementations do not retry; every failure is reported as
/// [`MemeError::GenerationFailed`](crate::MemeError::GenerationFailed).
#[async_trait]
pub trait ImageGenerator: Send + Sync {
    /// Generate one image for `prompt`.
    ///
    /// # Errors
    ///
    /// Returns [`MemeError::GenerationFailed`](crate::MemeError::GenerationFailed)
    /// on transport failure, non-success status or malformed response.
    async fn generate(&self, prompt: &str) -> MemeResult<ImageRef>;
}
