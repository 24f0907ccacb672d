//! Integration tests for composition flatten/export (meme-renderer).
//!
//! Tests the flatten pipeline end to end: background scaling, output size,
//! selection handling and refusal without a background.

use std::io::Cursor;

use meme_core::{Command, Composition, ImageRef, MemeError};
use meme_renderer::export::{export_filename, SurfaceExporter};
use meme_renderer::{decode, probe_dimensions, RenderError};

/// Encode a solid-color PNG of the given size.
fn solid_png(width: u32, height: u32, rgba: [u8; 4]) -> ImageRef {
    let img = image::RgbaImage::from_pixel(width, height, image::Rgba(rgba));
    let mut buf = Cursor::new(Vec::new());
    img.write_to(&mut buf, image::ImageFormat::Png)
        .expect("encode png");
    ImageRef::from_bytes("image/png", &buf.into_inner())
}

fn composition_with(background: ImageRef) -> Composition {
    let (w, h) = probe_dimensions(&background).expect("probe");
    let mut comp = Composition::new(128, 128);
    comp.load_background(background, w, h).expect("load");
    comp
}

// ==========================================================================
// Background placement
// ==========================================================================

#[test]
fn test_wide_background_is_top_left_anchored() {
    let mut comp = composition_with(solid_png(64, 32, [255, 0, 0, 255]));
    let flattened = SurfaceExporter::without_fonts()
        .flatten(&mut comp)
        .expect("flatten");

    let decoded = decode(&flattened).expect("decode");
    assert_eq!((decoded.width, decoded.height), (128, 128));

    // Scale is min(128/64, 128/32) = 2, so the image covers the top 128x64.
    let top = decoded.pixel(10, 10).expect("top pixel");
    assert_eq!(top, [255, 0, 0, 255]);
    let bottom = decoded.pixel(10, 120).expect("bottom pixel");
    assert_eq!(bottom[3], 0, "area outside the background stays transparent");
}

#[test]
fn test_large_background_is_downscaled() {
    let mut comp = composition_with(solid_png(512, 512, [0, 0, 255, 255]));
    let background = comp.background().expect("background");
    assert!((background.scale - 0.25).abs() < f32::EPSILON);

    let flattened = SurfaceExporter::without_fonts()
        .flatten(&mut comp)
        .expect("flatten");
    let decoded = decode(&flattened).expect("decode");
    assert_eq!(decoded.pixel(127, 127).expect("corner"), [0, 0, 255, 255]);
}

// ==========================================================================
// Flatten contract
// ==========================================================================

#[test]
fn test_flatten_clears_selection_and_keeps_overlays() {
    let mut comp = composition_with(solid_png(16, 16, [0, 255, 0, 255]));
    comp.apply(Command::AddOverlay).expect("add");
    comp.apply(Command::AddOverlay).expect("add");
    assert!(comp.selection().is_some());

    SurfaceExporter::without_fonts()
        .flatten(&mut comp)
        .expect("flatten");
    assert!(comp.selection().is_none());
    assert_eq!(comp.overlay_count(), 2);
}

#[test]
fn test_flatten_is_deterministic() {
    let mut comp = composition_with(solid_png(32, 32, [10, 20, 30, 255]));
    comp.apply(Command::AddOverlay).expect("add");
    let exporter = SurfaceExporter::without_fonts();

    let first = exporter.flatten(&mut comp).expect("first");
    let second = exporter.flatten(&mut comp).expect("second");
    assert_eq!(first, second);
}

#[test]
fn test_flatten_without_background_is_refused() {
    let mut comp = Composition::new(128, 128);
    comp.apply(Command::AddOverlay).expect("add");

    let err = SurfaceExporter::without_fonts()
        .flatten(&mut comp)
        .expect_err("must fail");
    assert!(matches!(err, RenderError::Core(MemeError::NoBackground)));

    let core: MemeError = err.into();
    assert_eq!(core.to_string(), "Generate an image first");
}

#[test]
fn test_export_filename_uses_millis() {
    assert_eq!(
        export_filename(1_712_345_678_901),
        "ralph-meme-1712345678901.png"
    );
}
