//! Editing Flow Integration Tests
//!
//! Drives a composition the way a front end would:
//! - Keyboard routing into commands
//! - Command dispatch and surface events
//! - Gallery append and deterministic layout

use meme_core::{
    layout, route_key, Command, CommandOutcome, Composition, FocusTarget, FontFamily,
    GalleryStore, ImageRef, Key, MemoryGalleryBackend, SurfaceEvent,
};

fn png() -> ImageRef {
    ImageRef::from_bytes("image/png", &[0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A])
}

fn loaded_composition() -> Composition {
    let mut comp = Composition::default();
    comp.load_background(png(), 512, 512).expect("background");
    comp
}

#[test]
fn test_keyboard_delete_only_outside_text_fields() {
    let mut comp = loaded_composition();
    comp.apply(Command::AddOverlay).expect("add");

    // Backspace typed into the prompt box never reaches the surface.
    assert!(route_key(&Key::Backspace, FocusTarget::TextInput, None).is_none());
    assert_eq!(comp.overlay_count(), 1);

    let command = route_key(&Key::Backspace, FocusTarget::Surface, None).expect("routed");
    assert_eq!(comp.apply(command).expect("delete"), CommandOutcome::Applied);
    assert_eq!(comp.overlay_count(), 0);
}

#[test]
fn test_inline_edit_round_trip() {
    let mut comp = loaded_composition();
    comp.apply(Command::AddOverlay).expect("add");
    comp.apply(Command::BeginTextEdit).expect("begin");

    // Delete is ignored while editing even if it somehow reaches the surface.
    assert_eq!(
        comp.apply(Command::DeleteSelected).expect("delete"),
        CommandOutcome::Ignored
    );

    let command =
        route_key(&Key::Enter, FocusTarget::InlineEdit, Some("ME FAIL ENGLISH")).expect("routed");
    comp.apply(command).expect("commit");
    assert_eq!(comp.selected().expect("selected").text, "ME FAIL ENGLISH");
}

#[test]
fn test_controls_follow_selection_and_preset() {
    let mut comp = loaded_composition();
    comp.apply(Command::AddOverlay).expect("add");
    comp.apply(Command::SetFont {
        font: FontFamily::PermanentMarker,
    })
    .expect("font");
    comp.apply(Command::ApplyStylePreset).expect("preset");

    let events = comp.drain_events();
    let reflected = events
        .iter()
        .find_map(|event| match event {
            SurfaceEvent::StyleReflected { style, .. } => Some(style.clone()),
            _ => None,
        })
        .expect("style reflected");
    assert_eq!(reflected.font, FontFamily::PermanentMarker);
    assert_eq!(reflected.fill, "#ffffff");
    assert_eq!(reflected.stroke, "#000000");
    assert!((reflected.stroke_width - 3.0).abs() < f32::EPSILON);
}

#[test]
fn test_new_background_starts_new_composition() {
    let mut comp = loaded_composition();
    comp.apply(Command::AddOverlay).expect("add");
    comp.apply(Command::AddOverlay).expect("add");

    comp.load_background(png(), 1024, 512).expect("reload");
    assert_eq!(comp.overlay_count(), 0);
    let background = comp.background().expect("background");
    assert!((background.scale - 0.5).abs() < f32::EPSILON);
}

#[tokio::test]
async fn test_gallery_layout_is_stable_across_fetches() {
    let mut store = GalleryStore::new(MemoryGalleryBackend::new());
    store.append(png(), "ralph", 1_700_000_000_000).await.expect("append");
    store.append(png(), "wiggum", 1_700_000_000_500).await.expect("append");

    let first: Vec<_> = store
        .fetch_all()
        .await
        .expect("fetch")
        .iter()
        .map(layout)
        .collect();
    let second: Vec<_> = store
        .fetch_all()
        .await
        .expect("fetch")
        .iter()
        .map(layout)
        .collect();
    assert_eq!(first, second);
    assert_ne!(first[0], first[1]);
}
