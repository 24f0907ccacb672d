//! Image decoding utilities.
//!
//! Generated images arrive as [`ImageRef`] data URLs; the composition needs
//! their natural pixel size before it can scale them onto the surface.

use std::io::Cursor;

use meme_core::ImageRef;

use crate::error::{RenderError, RenderResult};

/// Decoded RGBA pixels.
#[derive(Debug, Clone)]
pub struct DecodedImage {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
    /// RGBA pixel data (4 bytes per pixel).
    pub data: Vec<u8>,
    /// Original format of the image.
    pub format: ImageFormat,
}

impl DecodedImage {
    /// RGBA value at `(x, y)`, if inside the image.
    #[must_use]
    pub fn pixel(&self, x: u32, y: u32) -> Option<[u8; 4]> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let idx = ((y as usize) * (self.width as usize) + x as usize) * 4;
        let px = self.data.get(idx..idx + 4)?;
        Some([px[0], px[1], px[2], px[3]])
    }
}

/// Supported image formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageFormat {
    /// PNG with alpha support.
    Png,
    /// JPEG (no alpha).
    Jpeg,
    /// GIF (first frame only).
    Gif,
    /// WebP (alpha support).
    WebP,
    /// Unknown/other format.
    Unknown,
}

impl ImageFormat {
    /// Detect format from MIME type.
    #[must_use]
    pub fn from_mime(mime: &str) -> Self {
        match mime.to_lowercase().as_str() {
            "image/png" => Self::Png,
            "image/jpeg" | "image/jpg" => Self::Jpeg,
            "image/gif" => Self::Gif,
            "image/webp" => Self::WebP,
            _ => Self::Unknown,
        }
    }

    /// Detect format from magic bytes.
    #[must_use]
    pub fn from_magic_bytes(data: &[u8]) -> Self {
        if data.len() < 4 {
            return Self::Unknown;
        }

        // PNG: 89 50 4E 47
        if data.starts_with(&[0x89, 0x50, 0x4E, 0x47]) {
            return Self::Png;
        }

        // JPEG: FF D8 FF
        if data.starts_with(&[0xFF, 0xD8, 0xFF]) {
            return Self::Jpeg;
        }

        // GIF: GIF87a / GIF89a
        if data.starts_with(b"GIF8") {
            return Self::Gif;
        }

        // WebP: RIFF....WEBP
        if data.len() >= 12 && &data[0..4] == b"RIFF" && &data[8..12] == b"WEBP" {
            return Self::WebP;
        }

        Self::Unknown
    }

    /// Whether resvg can draw this format as an `<image>` href.
    #[must_use]
    pub fn is_svg_embeddable(self) -> bool {
        matches!(self, Self::Png | Self::Jpeg | Self::Gif)
    }
}

/// Read the natural (width, height) of an image without decoding its pixels.
///
/// # Errors
///
/// Returns [`RenderError::Resource`] if the payload is not a recognizable image.
pub fn probe_dimensions(image: &ImageRef) -> RenderResult<(u32, u32)> {
    let bytes = image
        .to_bytes()
        .map_err(|e| RenderError::Resource(e.to_string()))?;

    let (width, height) = ::image::ImageReader::new(Cursor::new(&bytes))
        .with_guessed_format()
        .map_err(|e| RenderError::Resource(format!("Failed to read image: {e}")))?
        .into_dimensions()
        .map_err(|e| RenderError::Resource(format!("Failed to decode image: {e}")))?;

    if width == 0 || height == 0 {
        return Err(RenderError::Resource(format!(
            "Image has no area ({width}x{height})"
        )));
    }
    tracing::debug!(
        width,
        height,
        format = ?ImageFormat::from_magic_bytes(&bytes),
        declared = ?ImageFormat::from_mime(image.mime()),
        "Probed image"
    );
    Ok((width, height))
}

/// Make a generated image usable as a composition background.
///
/// PNG, JPEG and GIF pass through unchanged. Anything else the `image` crate
/// can decode (WebP, BMP, ...) is transcoded to PNG so the flattened export
/// still draws it. Returns the image with its natural (width, height).
///
/// # Errors
///
/// Returns [`RenderError::Resource`] if the payload cannot be decoded.
pub fn prepare_background(image: ImageRef) -> RenderResult<(ImageRef, u32, u32)> {
    let (width, height) = probe_dimensions(&image)?;
    let bytes = image
        .to_bytes()
        .map_err(|e| RenderError::Resource(e.to_string()))?;
    let format = ImageFormat::from_magic_bytes(&bytes);
    if format.is_svg_embeddable() {
        return Ok((image, width, height));
    }

    let decoded = ::image::load_from_memory(&bytes)
        .map_err(|e| RenderError::Resource(format!("Failed to decode image: {e}")))?;
    let mut png = Vec::new();
    decoded
        .write_to(&mut Cursor::new(&mut png), ::image::ImageFormat::Png)
        .map_err(|e| RenderError::Resource(format!("Failed to encode PNG: {e}")))?;
    tracing::debug!(?format, width, height, "Transcoded background to PNG");
    Ok((ImageRef::from_bytes("image/png", &png), width, height))
}

/// Decode an image reference into RGBA pixels.
///
/// # Errors
///
/// Returns [`RenderError::Resource`] if the image cannot be decoded.
pub fn decode(image: &ImageRef) -> RenderResult<DecodedImage> {
    let bytes = image
        .to_bytes()
        .map_err(|e| RenderError::Resource(e.to_string()))?;
    load_image_from_bytes(&bytes)
}

/// Load an image from raw bytes.
///
/// # Errors
///
/// Returns an error if the image cannot be decoded.
pub fn load_image_from_bytes(data: &[u8]) -> RenderResult<DecodedImage> {
    let format = ImageFormat::from_magic_bytes(data);

    let img = ::image::load_from_memory(data)
        .map_err(|e| RenderError::Resource(format!("Failed to decode image: {e}")))?;

    let rgba = img.to_rgba8();
    let (width, height) = rgba.dimensions();

    Ok(DecodedImage {
        width,
        height,
        data: rgba.into_raw(),
        format,
    })
}
