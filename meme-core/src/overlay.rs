//! Text overlays - the captions placed on top of a generated image.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{MemeError, MemeResult};

/// Default caption text for a new overlay.
pub const DEFAULT_TEXT: &str = "Your text here";
/// Default font size in pixels.
pub const DEFAULT_FONT_SIZE: f32 = 40.0;
/// Smallest font size a resize can produce.
pub const MIN_FONT_SIZE: f32 = 8.0;
/// Largest font size a resize can produce.
pub const MAX_FONT_SIZE: f32 = 200.0;
/// Default fill color.
pub const DEFAULT_FILL: &str = "#ffffff";
/// Default stroke color (same as fill, so the outline starts invisible).
pub const DEFAULT_STROKE: &str = "#ffffff";
/// Default stroke width.
pub const DEFAULT_STROKE_WIDTH: f32 = 1.0;

/// Fill applied by the "meme style" preset.
pub const PRESET_FILL: &str = "#ffffff";
/// Stroke applied by the "meme style" preset.
pub const PRESET_STROKE: &str = "#000000";
/// Stroke width applied by the "meme style" preset.
pub const PRESET_STROKE_WIDTH: f32 = 3.0;

/// Unique identifier for an overlay.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct OverlayId(Uuid);

impl OverlayId {
    /// Create a new unique overlay ID.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Create from an existing UUID.
    #[must_use]
    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }
}

impl Default for OverlayId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for OverlayId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Fonts offered to users.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum FontFamily {
    /// Impact - the classic meme face.
    #[default]
    #[serde(rename = "Impact")]
    Impact,
    /// Arial Black.
    #[serde(rename = "Arial Black")]
    ArialBlack,
    /// Comic Sans MS.
    #[serde(rename = "Comic Sans MS")]
    ComicSansMs,
    /// Bangers.
    #[serde(rename = "Bangers")]
    Bangers,
    /// Permanent Marker.
    #[serde(rename = "Permanent Marker")]
    PermanentMarker,
}

impl FontFamily {
    /// Every font, in menu order.
    pub const ALL: [Self; 5] = [
        Self::Impact,
        Self::ArialBlack,
        Self::ComicSansMs,
        Self::Bangers,
        Self::PermanentMarker,
    ];

    /// Name shown to users and passed to the text renderer.
    #[must_use]
    pub fn display_name(self) -> &'static str {
        match self {
            Self::Impact => "Impact",
            Self::ArialBlack => "Arial Black",
            Self::ComicSansMs => "Comic Sans MS",
            Self::Bangers => "Bangers",
            Self::PermanentMarker => "Permanent Marker",
        }
    }

    /// Generic family used when the named font is not installed.
    #[must_use]
    pub fn fallback(self) -> &'static str {
        match self {
            Self::ComicSansMs | Self::PermanentMarker => "cursive",
            Self::Impact | Self::ArialBlack | Self::Bangers => "sans-serif",
        }
    }
}

impl std::fmt::Display for FontFamily {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.display_name())
    }
}

impl std::str::FromStr for FontFamily {
    type Err = MemeError;

    fn from_str(s: &str) -> MemeResult<Self> {
        Self::ALL
            .into_iter()
            .find(|font| font.display_name().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| MemeError::InvalidOperation(format!("unknown font: {s}")))
    }
}

/// Style attributes mirrored into front-end controls.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OverlayStyle {
    /// Font family.
    pub font: FontFamily,
    /// Fill color as lower-case hex.
    pub fill: String,
    /// Stroke color as lower-case hex.
    pub stroke: String,
    /// Stroke width in pixels.
    pub stroke_width: f32,
}

/// A text caption on the composition surface.
///
/// `x`/`y` are the visual center of the text, not its top-left corner.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextOverlay {
    /// Unique identifier.
    pub id: OverlayId,
    /// Caption text.
    pub text: String,
    /// Center X in surface pixels.
    pub x: f32,
    /// Center Y in surface pixels.
    pub y: f32,
    /// Font family.
    pub font: FontFamily,
    /// Font size in pixels.
    pub font_size: f32,
    /// Fill color (hex).
    pub fill: String,
    /// Stroke color (hex).
    pub stroke: String,
    /// Stroke width in pixels.
    pub stroke_width: f32,
    /// Rotation in degrees, normalized to `[0, 360)`.
    pub rotation: f32,
}

impl TextOverlay {
    /// Create an overlay with default attributes centered at `(x, y)`.
    #[must_use]
    pub fn new(x: f32, y: f32) -> Self {
        Self {
            id: OverlayId::new(),
            text: DEFAULT_TEXT.to_string(),
            x,
            y,
            font: FontFamily::default(),
            font_size: DEFAULT_FONT_SIZE,
            fill: DEFAULT_FILL.to_string(),
            stroke: DEFAULT_STROKE.to_string(),
            stroke_width: DEFAULT_STROKE_WIDTH,
            rotation: 0.0,
        }
    }

    /// Set the caption text.
    #[must_use]
    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = text.into();
        self
    }

    /// Current style attributes.
    #[must_use]
    pub fn style(&self) -> OverlayStyle {
        OverlayStyle {
            font: self.font,
            fill: self.fill.clone(),
            stroke: self.stroke.clone(),
            stroke_width: self.stroke_width,
        }
    }

    /// Approximate (width, height) of the text box, before rotation.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn bounds(&self) -> (f32, f32) {
        let widest = self
            .text
            .lines()
            .map(|line| line.chars().count())
            .max()
            .unwrap_or(0)
            .max(1);
        let lines = self.text.lines().count().max(1);
        let width = widest as f32 * self.font_size * 0.6 + self.stroke_width;
        let height = lines as f32 * self.font_size * 1.16 + self.stroke_width;
        (width, height)
    }

    /// Check if a point (in surface coordinates) is within this overlay,
    /// accounting for rotation about its center.
    #[must_use]
    pub fn contains_point(&self, px: f32, py: f32) -> bool {
        let (width, height) = self.bounds();
        let (sin, cos) = (-self.rotation.to_radians()).sin_cos();
        let dx = px - self.x;
        let dy = py - self.y;
        let local_x = dx * cos - dy * sin;
        let local_y = dx * sin + dy * cos;
        local_x.abs() <= width / 2.0 && local_y.abs() <= height / 2.0
    }
}

/// Validate and normalize a hex color (`#rgb` or `#rrggbb`).
///
/// # Errors
///
/// Returns [`MemeError::InvalidColor`] for anything else.
pub fn normalize_color(color: &str) -> MemeResult<String> {
    let trimmed = color.trim();
    let digits = trimmed
        .strip_prefix('#')
        .ok_or_else(|| MemeError::InvalidColor(color.to_string()))?;
    if !matches!(digits.len(), 3 | 6) || !digits.chars().all(|c| c.is_ascii_hexdigit()) {
        return Err(MemeError::InvalidColor(color.to_string()));
    }
    Ok(trimmed.to_ascii_lowercase())
}

/// Normalize an angle in degrees to `[0, 360)`.
#[must_use]
pub fn normalize_rotation(degrees: f32) -> f32 {
    let normalized = degrees.rem_euclid(360.0);
    // rem_euclid can round up to exactly 360.0 for tiny negative inputs.
    if normalized >= 360.0 {
        0.0
    } else {
        normalized
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let overlay = TextOverlay::new(256.0, 256.0);
        assert_eq!(overlay.text, "Your text here");
        assert_eq!(overlay.font, FontFamily::Impact);
        assert!((overlay.font_size - 40.0).abs() < f32::EPSILON);
        assert_eq!(overlay.fill, "#ffffff");
        assert_eq!(overlay.stroke, "#ffffff");
        assert!((overlay.stroke_width - 1.0).abs() < f32::EPSILON);
        assert!(overlay.rotation.abs() < f32::EPSILON);
    }

    #[test]
    fn test_font_names_round_trip() {
        for font in FontFamily::ALL {
            let parsed: FontFamily = font.display_name().parse().expect("parse");
            assert_eq!(parsed, font);
        }
        assert!("Papyrus".parse::<FontFamily>().is_err());
    }

    #[test]
    fn test_font_serializes_as_display_name() {
        let json = serde_json::to_string(&FontFamily::ComicSansMs).expect("serialize");
        assert_eq!(json, "\"Comic Sans MS\"");
    }

    #[test]
    fn test_normalize_color() {
        assert_eq!(normalize_color("#FFAA00").expect("valid"), "#ffaa00");
        assert_eq!(normalize_color("#abc").expect("valid"), "#abc");
        assert!(normalize_color("ffaa00").is_err());
        assert!(normalize_color("#ffaa0").is_err());
        assert!(normalize_color("#gggggg").is_err());
        assert!(normalize_color("red").is_err());
    }

    #[test]
    fn test_normalize_rotation() {
        assert!((normalize_rotation(370.0) - 10.0).abs() < 1e-4);
        assert!((normalize_rotation(-90.0) - 270.0).abs() < 1e-4);
        assert!(normalize_rotation(720.0).abs() < 1e-4);
    }

    #[test]
    fn test_contains_point_center_anchored() {
        let overlay = TextOverlay::new(100.0, 100.0).with_text("abcd");
        assert!(overlay.contains_point(100.0, 100.0));
        // 4 chars * 40 * 0.6 = 96 wide, so x = 140 is inside, 160 outside.
        assert!(overlay.contains_point(140.0, 100.0));
        assert!(!overlay.contains_point(160.0, 100.0));
    }

    #[test]
    fn test_contains_point_rotated() {
        let mut overlay = TextOverlay::new(100.0, 100.0).with_text("abcdefghij");
        // 240 px wide, ~47 px tall. Rotated 90 degrees the long axis is vertical.
        assert!(!overlay.contains_point(100.0, 200.0));
        overlay.rotation = 90.0;
        assert!(overlay.contains_point(100.0, 200.0));
        assert!(!overlay.contains_point(200.0, 100.0));
    }
}
