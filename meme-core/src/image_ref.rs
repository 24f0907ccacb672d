//! Self-contained image references.
//!
//! Everything that flows between generation, the composition surface and the
//! gallery is an [`ImageRef`]: a `data:<mime>;base64,<payload>` URL that can
//! be rasterized without further I/O.

use base64::Engine;
use serde::{Deserialize, Serialize};

use crate::{MemeError, MemeResult};

/// MIME type assumed when a bare payload cannot be sniffed.
pub const DEFAULT_MIME: &str = "image/png";

/// A base64 data-URL image reference.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ImageRef {
    mime: String,
    payload: String,
}

impl ImageRef {
    /// Parse a `data:` URL.
    ///
    /// # Errors
    ///
    /// Returns [`MemeError::ImageDecode`] if the string is not a base64 data
    /// URL or its payload is not valid base64.
    pub fn from_data_url(url: &str) -> MemeResult<Self> {
        let rest = url
            .strip_prefix("data:")
            .ok_or_else(|| MemeError::ImageDecode("not a data URL".to_string()))?;
        let (metadata, payload) = rest
            .split_once(',')
            .ok_or_else(|| MemeError::ImageDecode("data URL missing comma".to_string()))?;
        let mime = metadata
            .strip_suffix(";base64")
            .ok_or_else(|| MemeError::ImageDecode("data URL is not base64".to_string()))?;
        let mime = if mime.is_empty() { DEFAULT_MIME } else { mime };

        Self::from_base64(Some(mime), payload)
    }

    /// Wrap a bare base64 payload.
    ///
    /// When `mime` is `None` the type is sniffed from the decoded magic bytes.
    ///
    /// # Errors
    ///
    /// Returns [`MemeError::ImageDecode`] if the payload is not valid base64.
    pub fn from_base64(mime: Option<&str>, payload: &str) -> MemeResult<Self> {
        let payload: String = payload.chars().filter(|c| !c.is_ascii_whitespace()).collect();
        let bytes = base64::engine::general_purpose::STANDARD
            .decode(&payload)
            .map_err(|e| MemeError::ImageDecode(format!("invalid base64: {e}")))?;
        if bytes.is_empty() {
            return Err(MemeError::ImageDecode("empty image payload".to_string()));
        }
        let mime = mime.map_or_else(|| sniff_mime(&bytes).to_string(), str::to_string);
        Ok(Self { mime, payload })
    }

    /// Accept either a data URL or a bare base64 payload.
    ///
    /// # Errors
    ///
    /// Returns [`MemeError::ImageDecode`] if neither form parses.
    pub fn parse(value: &str) -> MemeResult<Self> {
        if value.starts_with("data:") {
            Self::from_data_url(value)
        } else {
            Self::from_base64(None, value)
        }
    }

    /// Encode raw image bytes.
    #[must_use]
    pub fn from_bytes(mime: &str, bytes: &[u8]) -> Self {
        Self {
            mime: mime.to_string(),
            payload: base64::engine::general_purpose::STANDARD.encode(bytes),
        }
    }

    /// The image MIME type.
    #[must_use]
    pub fn mime(&self) -> &str {
        &self.mime
    }

    /// The base64 payload without the `data:` prefix.
    #[must_use]
    pub fn payload(&self) -> &str {
        &self.payload
    }

    /// Decode the payload into raw bytes.
    ///
    /// # Errors
    ///
    /// Returns [`MemeError::ImageDecode`] if the payload is corrupt.
    pub fn to_bytes(&self) -> MemeResult<Vec<u8>> {
        base64::engine::general_purpose::STANDARD
            .decode(&self.payload)
            .map_err(|e| MemeError::ImageDecode(format!("invalid base64: {e}")))
    }

    /// Render as a `data:` URL.
    #[must_use]
    pub fn to_data_url(&self) -> String {
        format!("data:{};base64,{}", self.mime, self.payload)
    }
}

impl std::fmt::Display for ImageRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "data:{};base64,<{} chars>", self.mime, self.payload.len())
    }
}

impl TryFrom<String> for ImageRef {
    type Error = MemeError;

    fn try_from(value: String) -> MemeResult<Self> {
        Self::parse(&value)
    }
}

impl From<ImageRef> for String {
    fn from(image: ImageRef) -> Self {
        image.to_data_url()
    }
}

/// Guess an image MIME type from magic bytes.
#[must_use]
pub fn sniff_mime(bytes: &[u8]) -> &'static str {
    if bytes.starts_with(&[0x89, 0x50, 0x4E, 0x47]) {
        "image/png"
    } else if bytes.starts_with(&[0xFF, 0xD8, 0xFF]) {
        "image/jpeg"
    } else if bytes.len() >= 12 && &bytes[0..4] == b"RIFF" && &bytes[8..12] == b"WEBP" {
        "image/webp"
    } else if bytes.starts_with(b"GIF8") {
        "image/gif"
    } else {
        DEFAULT_MIME
    }
}
