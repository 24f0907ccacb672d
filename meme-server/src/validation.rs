//! Input validation for untrusted data.
//!
//! All user-supplied input MUST be validated before use.
//! This module provides validators for gallery requests.

use base64::Engine;
use thiserror::Error;
use uuid::Uuid;

/// Maximum gallery save request body (10 MiB).
pub const MAX_REQUEST_SIZE: usize = 10 * 1024 * 1024;
/// Maximum delete request body.
pub const MAX_DELETE_REQUEST_SIZE: usize = 1024;
/// Maximum generate request body forwarded upstream.
pub const MAX_GENERATE_REQUEST_SIZE: usize = 10_000;
/// Maximum stored prompt length, in characters.
pub const MAX_PROMPT_LENGTH: usize = 500;

const PNG_MAGIC: [u8; 8] = [0x89, b'P', b'N', b'G', b'\r', b'\n', 0x1A, b'\n'];
const JPEG_MAGIC: [u8; 2] = [0xFF, 0xD8];

/// Validation error types.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
    /// Request body is empty or larger than the route allows.
    #[error("request body must be 1..={max} bytes, got {actual}")]
    BodySize {
        /// Route limit.
        max: usize,
        /// Received size.
        actual: usize,
    },
    /// Body was not valid JSON.
    #[error("Invalid JSON")]
    InvalidJson,
    /// Gallery ID is not a hyphenated UUID v4.
    #[error("Invalid image ID")]
    InvalidId,
    /// Image payload is not base64 PNG or JPEG data.
    #[error("Invalid image data")]
    InvalidImage,
}

impl ValidationError {
    /// Short label for metrics.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::BodySize { .. } => "body_size",
            Self::InvalidJson => "json",
            Self::InvalidId => "id",
            Self::InvalidImage => "image",
        }
    }
}

/// Validate a request body size against a route limit.
///
/// # Errors
///
/// Returns [`ValidationError::BodySize`] if the body is empty or exceeds `max`.
pub fn validate_body_size(actual: usize, max: usize) -> Result<(), ValidationError> {
    if actual == 0 || actual > max {
        return Err(ValidationError::BodySize { max, actual });
    }
    Ok(())
}

/// Validate a gallery ID.
///
/// Valid IDs are hyphenated UUID v4 strings (36 chars, any case). Braced,
/// URN and unhyphenated spellings are refused.
///
/// # Errors
///
/// Returns [`ValidationError::InvalidId`] otherwise.
pub fn validate_gallery_id(id: &str) -> Result<(), ValidationError> {
    let hyphens_ok = id.len() == 36
        && id
            .char_indices()
            .all(|(i, c)| matches!(i, 8 | 13 | 18 | 23) == (c == '-'));
    if !hyphens_ok {
        return Err(ValidationError::InvalidId);
    }
    let uuid = Uuid::parse_str(id).map_err(|_| ValidationError::InvalidId)?;
    if uuid.get_version_num() != 4 || uuid.get_variant() != uuid::Variant::RFC4122 {
        return Err(ValidationError::InvalidId);
    }
    Ok(())
}

/// Strip control characters (keeping tab, newline and carriage return) and
/// cut to [`MAX_PROMPT_LENGTH`] characters.
#[must_use]
pub fn sanitize_prompt(prompt: &str) -> String {
    prompt
        .chars()
        .filter(|c| !c.is_ascii_control() || matches!(c, '\t' | '\n' | '\r'))
        .take(MAX_PROMPT_LENGTH)
        .collect()
}

/// Decode a gallery image from a data URL or bare base64 payload.
///
/// Only PNG and JPEG payloads are accepted.
///
/// # Errors
///
/// Returns [`ValidationError::InvalidImage`] if the payload is empty, not
/// strict base64, or not a PNG/JPEG.
pub fn decode_image(data: &str) -> Result<Vec<u8>, ValidationError> {
    let payload = data.split_once(',').map_or(data, |(_, rest)| rest);
    if payload.is_empty() {
        return Err(ValidationError::InvalidImage);
    }
    let bytes = base64::engine::general_purpose::STANDARD
        .decode(payload)
        .map_err(|_| ValidationError::InvalidImage)?;
    check_image_magic(&bytes)?;
    Ok(bytes)
}

/// Accept only PNG or JPEG bytes.
///
/// # Errors
///
/// Returns [`ValidationError::InvalidImage`] for anything else.
pub fn check_image_magic(bytes: &[u8]) -> Result<(), ValidationError> {
    if bytes.starts_with(&PNG_MAGIC) || bytes.starts_with(&JPEG_MAGIC) {
        Ok(())
    } else {
        Err(ValidationError::InvalidImage)
    }
}

/// Coerce a client-supplied timestamp: non-negative numbers are truncated to
/// whole milliseconds, everything else becomes `0`.
#[must_use]
#[allow(clippy::cast_possible_truncation, clippy::cast_precision_loss)]
pub fn clamp_timestamp(value: Option<&serde_json::Value>) -> i64 {
    let Some(number) = value.and_then(serde_json::Value::as_number) else {
        return 0;
    };
    if let Some(int) = number.as_i64() {
        return int.max(0);
    }
    if number.as_u64().is_some() {
        return i64::MAX;
    }
    match number.as_f64() {
        Some(float) if float.is_finite() && float >= 0.0 => float.min(i64::MAX as f64) as i64,
        _ => 0,
    }
}
