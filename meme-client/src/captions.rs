//! Classic top/bottom caption placement.

use meme_core::{Command, FontFamily};

const TOP_BAND: f32 = 0.12;
const BOTTOM_BAND: f32 = 0.88;

/// Commands that add one styled overlay per caption.
///
/// The first caption goes at the top, the second at the bottom, and any
/// further ones are spread between them. The selection is cleared at the end.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn caption_commands(captions: &[String], font: FontFamily, width: u32, height: u32) -> Vec<Command> {
    let (w, h) = (width as f32, height as f32);
    let extra = captions.len().saturating_sub(2);

    let mut commands = Vec::with_capacity(captions.len() * 5 + 1);
    for (index, text) in captions.iter().enumerate() {
        let band = match index {
            0 => TOP_BAND,
            1 => BOTTOM_BAND,
            n => TOP_BAND + (BOTTOM_BAND - TOP_BAND) * (n - 1) as f32 / (extra + 1) as f32,
        };
        commands.extend([
            Command::AddOverlay,
            Command::SetText { text: text.clone() },
            Command::SetFont { font },
            Command::ApplyStylePreset,
            Command::Move {
                x: w / 2.0,
                y: h * band,
            },
        ]);
    }
    if !captions.is_empty() {
        commands.push(Command::ClearSelection);
    }
    commands
}

#[cfg(test)]
mod tests {
    use super::*;
    use meme_core::Composition;

    fn captions(items: &[&str]) -> Vec<String> {
        items.iter().map(ToString::to_string).collect()
    }

    #[test]
    fn test_no_captions_no_commands() {
        assert!(caption_commands(&[], FontFamily::Impact, 512, 512).is_empty());
    }

    #[test]
    fn test_top_and_bottom_placement() {
        let mut comp = Composition::new(500, 500);
        for command in caption_commands(
            &captions(&["TOP TEXT", "BOTTOM TEXT"]),
            FontFamily::Bangers,
            500,
            500,
        ) {
            comp.apply(command).expect("apply");
        }

        let overlays = comp.overlays();
        assert_eq!(overlays.len(), 2);
        assert_eq!(overlays[0].text, "TOP TEXT");
        assert!((overlays[0].y - 60.0).abs() < 0.01);
        assert!((overlays[1].y - 440.0).abs() < 0.01);
        assert!(overlays.iter().all(|o| o.font == FontFamily::Bangers));
        assert!(overlays.iter().all(|o| o.stroke == "#000000"));
        assert!(comp.selection().is_none());
    }

    #[test]
    fn test_extra_captions_between_bands() {
        let commands = caption_commands(&captions(&["a", "b", "c"]), FontFamily::Impact, 100, 100);
        let ys: Vec<f32> = commands
            .iter()
            .filter_map(|c| match c {
                Command::Move { y, .. } => Some(*y),
                _ => None,
            })
            .collect();
        assert_eq!(ys.len(), 3);
        assert!(ys[2] > ys[0] && ys[2] < ys[1]);
    }
}
