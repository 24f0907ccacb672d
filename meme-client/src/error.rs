//! Transport errors for the HTTP collaborators.

use meme_core::MemeError;
use thiserror::Error;

/// Errors raised while talking to the generation service or gallery server.
#[derive(Debug, Error)]
pub enum ClientError {
    /// A configured URL is invalid.
    #[error("invalid URL: {0}")]
    InvalidUrl(String),
    /// HTTP layer failed (connection, timeout, etc.).
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),
    /// The server answered with a non-success status.
    #[error("HTTP {status}: {message}")]
    Status {
        /// Response status code.
        status: u16,
        /// Server-provided error text, or the reason phrase.
        message: String,
    },
    /// JSON parsing failed.
    #[error("failed to parse response: {0}")]
    Json(#[from] serde_json::Error),
    /// The response did not match the expected structure.
    #[error("unexpected response: {0}")]
    UnexpectedResponse(String),
}

/// Result type for client transport operations.
pub type ClientResult<T> = Result<T, ClientError>;

impl ClientError {
    /// Report as a generation failure.
    #[must_use]
    pub fn into_generation(self) -> MemeError {
        MemeError::GenerationFailed(self.to_string())
    }

    /// Report as a persistence failure.
    #[must_use]
    pub fn into_persistence(self) -> MemeError {
        meme_core::gallery::persistence_error(self)
    }
}

/// Turn a non-success response into [`ClientError::Status`], reading the
/// `{"error": ...}` body when present.
pub(crate) async fn check_status(response: reqwest::Response) -> ClientResult<reqwest::Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    let message = serde_json::from_str::<serde_json::Value>(&body)
        .ok()
        .and_then(|v| v.get("error").and_then(|e| e.as_str()).map(str::to_string))
        .unwrap_or_else(|| status.canonical_reason().unwrap_or("error").to_string());
    Err(ClientError::Status {
        status: status.as_u16(),
        message,
    })
}
