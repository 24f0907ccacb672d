//! Composition flatten/export.
//!
//! Renders a [`Composition`] to PNG using an SVG intermediate representation
//! and the resvg/tiny-skia rasterization pipeline. The background is drawn
//! first, then every overlay in z-order. Selection chrome never exists in the
//! SVG, so it can never leak into the output.

use std::fmt::Write;

use meme_core::{Composition, ImageRef, TextOverlay};

use crate::error::{RenderError, RenderResult};

/// Prefix of exported file names.
pub const EXPORT_PREFIX: &str = "ralph-meme-";

/// Line height used when a caption spans several lines, in ems.
const LINE_HEIGHT_EM: f32 = 1.16;

/// File name for an export taken at `timestamp_ms`.
///
/// ```
/// assert_eq!(
///     meme_renderer::export::export_filename(1_700_000_000_000),
///     "ralph-meme-1700000000000.png"
/// );
/// ```
#[must_use]
pub fn export_filename(timestamp_ms: i64) -> String {
    format!("{EXPORT_PREFIX}{timestamp_ms}.png")
}

/// Flattens compositions into PNG images.
pub struct SurfaceExporter {
    options: usvg::Options<'static>,
}

impl std::fmt::Debug for SurfaceExporter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SurfaceExporter")
            .field("fonts", &self.options.fontdb.len())
            .finish()
    }
}

impl Default for SurfaceExporter {
    fn default() -> Self {
        Self::new()
    }
}

impl SurfaceExporter {
    /// Create an exporter that renders captions with the system fonts.
    #[must_use]
    pub fn new() -> Self {
        let mut options = usvg::Options::default();
        options.fontdb_mut().load_system_fonts();
        tracing::debug!(fonts = options.fontdb.len(), "Loaded system fonts");
        Self { options }
    }

    /// Create an exporter without any fonts loaded.
    ///
    /// Captions are skipped during rasterization; useful when only the
    /// background matters.
    #[must_use]
    pub fn without_fonts() -> Self {
        Self {
            options: usvg::Options::default(),
        }
    }

    /// Flatten the composition into a PNG image reference.
    ///
    /// Clears the selection first. The output is exactly the surface size.
    ///
    /// # Errors
    ///
    /// Returns [`RenderError::Core`] wrapping
    /// [`MemeError::NoBackground`](meme_core::MemeError::NoBackground) when
    /// there is no background, or [`RenderError::Export`] if rasterization or
    /// encoding fails.
    pub fn flatten(&self, composition: &mut Composition) -> RenderResult<ImageRef> {
        composition.prepare_flatten()?;
        let png = self.render_to_png(composition)?;
        tracing::info!(
            width = composition.width(),
            height = composition.height(),
            overlays = composition.overlay_count(),
            bytes = png.len(),
            "Composition flattened"
        );
        Ok(ImageRef::from_bytes("image/png", &png))
    }

    /// Render the composition to PNG bytes.
    ///
    /// # Errors
    ///
    /// Returns an error if rendering or encoding fails.
    pub fn render_to_png(&self, composition: &Composition) -> RenderResult<Vec<u8>> {
        let svg_string = render_to_svg(composition);
        let pixmap = self.rasterize_svg(&svg_string, composition.width(), composition.height())?;

        pixmap
            .encode_png()
            .map_err(|e| RenderError::Export(format!("PNG encoding failed: {e}")))
    }

    /// Rasterize an SVG string to a tiny-skia Pixmap of exactly `width`×`height`.
    #[allow(clippy::cast_precision_loss)]
    fn rasterize_svg(
        &self,
        svg_string: &str,
        width: u32,
        height: u32,
    ) -> RenderResult<tiny_skia::Pixmap> {
        let tree = usvg::Tree::from_str(svg_string, &self.options)
            .map_err(|e| RenderError::Export(format!("SVG parsing failed: {e}")))?;

        let mut pixmap = tiny_skia::Pixmap::new(width.max(1), height.max(1))
            .ok_or_else(|| RenderError::Export("Failed to create pixmap".to_string()))?;

        let size = tree.size();
        let transform = tiny_skia::Transform::from_scale(
            width as f32 / size.width(),
            height as f32 / size.height(),
        );
        resvg::render(&tree, transform, &mut pixmap.as_mut());

        Ok(pixmap)
    }
}

/// Build the SVG scene for a composition.
///
/// Works with or without a background, so callers can preview overlays.
#[must_use]
pub fn render_to_svg(composition: &Composition) -> String {
    let (width, height) = (composition.width(), composition.height());

    let mut svg = String::with_capacity(4096);
    let _ = write!(
        svg,
        "<svg xmlns=\"http://www.w3.org/2000/svg\" xmlns:xlink=\"http://www.w3.org/1999/xlink\" width=\"{width}\" height=\"{height}\" viewBox=\"0 0 {width} {height}\">",
    );

    if let Some(background) = composition.background() {
        let (bg_w, bg_h) = background.rendered_size();
        let _ = write!(
            svg,
            "<image x=\"0\" y=\"0\" width=\"{bg_w}\" height=\"{bg_h}\" preserveAspectRatio=\"none\" xlink:href=\"{}\"/>",
            background.image.to_data_url(),
        );
    }

    for overlay in composition.overlays() {
        render_overlay_svg(&mut svg, overlay);
    }

    svg.push_str("</svg>");
    svg
}

/// Render a single caption, centered on its anchor and rotated about it.
#[allow(clippy::cast_precision_loss)]
fn render_overlay_svg(svg: &mut String, overlay: &TextOverlay) {
    let (cx, cy) = (overlay.x, overlay.y);
    let family = escape_xml(&format!(
        "'{}', {}",
        overlay.font.display_name(),
        overlay.font.fallback()
    ));
    let fill = escape_xml(&overlay.fill);
    let stroke = escape_xml(&overlay.stroke);

    let _ = write!(
        svg,
        "<text x=\"{cx}\" y=\"{cy}\" font-family=\"{family}\" font-size=\"{}\" fill=\"{fill}\" stroke=\"{stroke}\" stroke-width=\"{}\" text-anchor=\"middle\" dominant-baseline=\"central\"",
        overlay.font_size, overlay.stroke_width,
    );
    if overlay.rotation.abs() > f32::EPSILON {
        let _ = write!(svg, " transform=\"rotate({} {cx} {cy})\"", overlay.rotation);
    }
    svg.push('>');

    let lines: Vec<&str> = overlay.text.split('\n').collect();
    if lines.len() == 1 {
        svg.push_str(&escape_xml(&overlay.text));
    } else {
        // Shift the block up so the middle line sits on the anchor.
        let first_dy = -(lines.len() as f32 - 1.0) / 2.0 * LINE_HEIGHT_EM;
        for (idx, line) in lines.iter().enumerate() {
            let dy = if idx == 0 { first_dy } else { LINE_HEIGHT_EM };
            let _ = write!(
                svg,
                "<tspan x=\"{cx}\" dy=\"{dy}em\">{}</tspan>",
                escape_xml(line)
            );
        }
    }

    svg.push_str("</text>");
}

/// Escape special XML characters and drop those XML 1.0 cannot carry.
fn escape_xml(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for c in input.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            '\u{0}'..='\u{8}' | '\u{b}' | '\u{c}' | '\u{e}'..='\u{1f}' | '\u{fffe}' | '\u{ffff}' => {}
            c => out.push(c),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use meme_core::{FontFamily, MemeError};

    // 1x1 red pixel.
    const RED_PIXEL_PNG: &str = "iVBORw0KGgoAAAANSUhEUgAAAAEAAAABCAYAAAAfFcSJAAAADUlEQVR42mP8z8DwHwAFBQIAX8jx0gAAAABJRU5ErkJggg==";

    fn red_background() -> ImageRef {
        ImageRef::from_base64(Some("image/png"), RED_PIXEL_PNG).expect("valid png")
    }

    #[test]
    fn test_export_filename() {
        assert_eq!(export_filename(42), "ralph-meme-42.png");
    }

    #[test]
    fn test_svg_empty_composition() {
        let comp = Composition::default();
        let svg = render_to_svg(&comp);
        assert!(svg.starts_with("<svg"));
        assert!(svg.ends_with("</svg>"));
        assert!(svg.contains("width=\"512\""));
        assert!(!svg.contains("<image"));
    }

    #[test]
    fn test_svg_background_is_scaled_from_origin() {
        let mut comp = Composition::new(400, 200);
        comp.set_background(red_background(), 100, 100).expect("bg");
        let svg = render_to_svg(&comp);
        assert!(svg.contains("<image x=\"0\" y=\"0\" width=\"200\" height=\"200\""));
        assert!(svg.contains("data:image/png;base64,"));
    }

    #[test]
    fn test_svg_overlay_attributes() {
        let mut comp = Composition::default();
        comp.add_overlay();
        comp.set_text("A < B & C");
        comp.set_font(FontFamily::ComicSansMs);
        comp.apply_style_preset();
        comp.rotate_selected(15.0).expect("rotate");

        let svg = render_to_svg(&comp);
        assert!(svg.contains("A &lt; B &amp; C"));
        assert!(svg.contains("text-anchor=\"middle\""));
        assert!(svg.contains("dominant-baseline=\"central\""));
        assert!(svg.contains("stroke=\"#000000\""));
        assert!(svg.contains("stroke-width=\"3\""));
        assert!(svg.contains("&apos;Comic Sans MS&apos;, cursive"));
        assert!(svg.contains("rotate(15 256 256)"));
    }

    #[test]
    fn test_svg_multiline_caption() {
        let mut comp = Composition::default();
        comp.add_overlay();
        comp.set_text("TOP\nBOTTOM");
        let svg = render_to_svg(&comp);
        assert_eq!(svg.matches("<tspan").count(), 2);
    }

    #[test]
    fn test_svg_overlays_in_z_order() {
        let mut comp = Composition::default();
        comp.add_overlay();
        comp.set_text("first");
        comp.add_overlay();
        comp.set_text("second");
        let svg = render_to_svg(&comp);
        let first = svg.find("first").expect("first");
        let second = svg.find("second").expect("second");
        assert!(first < second);
    }

    #[test]
    fn test_flatten_without_background_fails() {
        let mut comp = Composition::default();
        comp.add_overlay();
        let err = SurfaceExporter::without_fonts()
            .flatten(&mut comp)
            .expect_err("no background");
        assert!(matches!(err, RenderError::Core(MemeError::NoBackground)));
        // Selection is untouched when flatten is refused.
        assert!(comp.selection().is_some());
    }

    #[test]
    fn test_flatten_produces_surface_sized_png() {
        let mut comp = Composition::new(64, 32);
        comp.set_background(red_background(), 1, 1).expect("bg");
        comp.add_overlay();

        let image = SurfaceExporter::without_fonts()
            .flatten(&mut comp)
            .expect("flatten");
        assert_eq!(image.mime(), "image/png");
        assert!(comp.selection().is_none());

        let bytes = image.to_bytes().expect("bytes");
        assert_eq!(&bytes[0..4], &[137, 80, 78, 71]);
        let decoded = ::image::load_from_memory(&bytes).expect("decode");
        assert_eq!((decoded.width(), decoded.height()), (64, 32));
    }

    #[test]
    fn test_escape_xml_drops_illegal_control_chars() {
        assert_eq!(escape_xml("a\u{0}b\u{b}c\u{c}d\te"), "abcd\te");
        assert_eq!(escape_xml("<&>"), "&lt;&amp;&gt;");
    }

    #[test]
    fn test_flatten_caption_with_control_chars() {
        let mut comp = Composition::new(32, 32);
        comp.set_background(red_background(), 1, 1).expect("bg");
        comp.add_overlay();
        assert!(comp.set_text("form\u{c}feed \u{0}nul \u{b}tab".to_string()));

        let image = SurfaceExporter::without_fonts()
            .flatten(&mut comp)
            .expect("flatten");
        assert_eq!(image.mime(), "image/png");
    }

    mod proptests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn overlay_text_always_yields_parseable_svg(text in "(\\PC|[\\x00-\\x1f]){0,40}", lines in 1usize..4) {
                let mut comp = Composition::new(64, 64);
                comp.set_background(red_background(), 1, 1).expect("bg");
                comp.add_overlay();
                let joined = vec![text; lines].join("\n");
                prop_assert!(comp.set_text(joined));

                let svg = render_to_svg(&comp);
                prop_assert!(usvg::Tree::from_str(&svg, &usvg::Options::default()).is_ok());
            }
        }
    }
}
