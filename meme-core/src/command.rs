//! Transport-independent commands for the composition surface.
//!
//! Every user action on the overlay model is one [`Command`]. Front ends
//! (CLI, HTTP, a future GUI) build commands and hand them to
//! [`Composition::apply`] instead of calling the mutators directly.

use serde::{Deserialize, Serialize};

use crate::composition::Composition;
use crate::overlay::{FontFamily, OverlayId};
use crate::MemeResult;

/// A single operation on the composition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "command", rename_all = "snake_case")]
pub enum Command {
    /// Add a default overlay at the center and select it.
    AddOverlay,
    /// Delete the selected overlay.
    DeleteSelected,
    /// Select an overlay by ID.
    Select {
        /// Overlay to select.
        id: OverlayId,
    },
    /// Select whatever overlay lies under a point.
    SelectAt {
        /// X in surface pixels.
        x: f32,
        /// Y in surface pixels.
        y: f32,
    },
    /// Clear the selection.
    ClearSelection,
    /// Change the font of the selected overlay.
    SetFont {
        /// New font.
        font: FontFamily,
    },
    /// Change the fill color of the selected overlay.
    SetFill {
        /// Hex color.
        color: String,
    },
    /// Change the stroke color of the selected overlay.
    SetStroke {
        /// Hex color.
        color: String,
    },
    /// Change the stroke width of the selected overlay.
    SetStrokeWidth {
        /// Width in pixels.
        width: f32,
    },
    /// Replace the text of the selected overlay.
    SetText {
        /// New caption.
        text: String,
    },
    /// Move the selected overlay's center.
    Move {
        /// Center X.
        x: f32,
        /// Center Y.
        y: f32,
    },
    /// Rotate the selected overlay.
    Rotate {
        /// Degrees.
        degrees: f32,
    },
    /// Resize the selected overlay's font.
    Resize {
        /// Font size in pixels.
        font_size: f32,
    },
    /// Apply the white-fill, black-outline meme style.
    ApplyStylePreset,
    /// Start editing the selected overlay's text inline.
    BeginTextEdit,
    /// Finish an inline edit.
    CommitTextEdit {
        /// Final text.
        text: String,
    },
    /// Abandon an inline edit.
    CancelTextEdit,
}

/// What a command did.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum CommandOutcome {
    /// An overlay was created.
    Added {
        /// The new overlay.
        id: OverlayId,
    },
    /// The selection changed (or was cleared).
    Selected {
        /// Current selection.
        id: Option<OverlayId>,
    },
    /// The command mutated the composition.
    Applied,
    /// The command had nothing to act on.
    Ignored,
}

impl CommandOutcome {
    fn from_changed(changed: bool) -> Self {
        if changed {
            Self::Applied
        } else {
            Self::Ignored
        }
    }
}

impl Composition {
    /// Apply a command.
    ///
    /// # Errors
    ///
    /// Propagates validation errors from the underlying operation; nothing is
    /// mutated when an error is returned.
    pub fn apply(&mut self, command: Command) -> MemeResult<CommandOutcome> {
        tracing::trace!(?command, "Applying command");
        let outcome = match command {
            Command::AddOverlay => CommandOutcome::Added {
                id: self.add_overlay(),
            },
            Command::DeleteSelected => CommandOutcome::from_changed(self.delete_selected()),
            Command::Select { id } => {
                self.select(id)?;
                CommandOutcome::Selected { id: Some(id) }
            }
            Command::SelectAt { x, y } => CommandOutcome::Selected {
                id: self.select_at(x, y),
            },
            Command::ClearSelection => {
                self.clear_selection();
                CommandOutcome::Selected { id: None }
            }
            Command::SetFont { font } => CommandOutcome::from_changed(self.set_font(font)),
            Command::SetFill { color } => CommandOutcome::from_changed(self.set_fill(&color)?),
            Command::SetStroke { color } => {
                CommandOutcome::from_changed(self.set_stroke(&color)?)
            }
            Command::SetStrokeWidth { width } => {
                CommandOutcome::from_changed(self.set_stroke_width(width)?)
            }
            Command::SetText { text } => CommandOutcome::from_changed(self.set_text(text)),
            Command::Move { x, y } => CommandOutcome::from_changed(self.move_selected(x, y)?),
            Command::Rotate { degrees } => {
                CommandOutcome::from_changed(self.rotate_selected(degrees)?)
            }
            Command::Resize { font_size } => {
                CommandOutcome::from_changed(self.resize_selected(font_size)?)
            }
            Command::ApplyStylePreset => CommandOutcome::from_changed(self.apply_style_preset()),
            Command::BeginTextEdit => CommandOutcome::from_changed(self.begin_text_edit()),
            Command::CommitTextEdit { text } => {
                CommandOutcome::from_changed(self.commit_text_edit(text))
            }
            Command::CancelTextEdit => CommandOutcome::from_changed(self.cancel_text_edit()),
        };
        Ok(outcome)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::MemeError;

    #[test]
    fn test_command_json_shape() {
        let json = serde_json::to_value(Command::SetFill {
            color: "#ff0000".to_string(),
        })
        .expect("serialize");
        assert_eq!(json["command"], "set_fill");
        assert_eq!(json["color"], "#ff0000");

        let parsed: Command =
            serde_json::from_str(r#"{"command":"set_font","font":"Comic Sans MS"}"#)
                .expect("deserialize");
        assert_eq!(
            parsed,
            Command::SetFont {
                font: FontFamily::ComicSansMs
            }
        );
    }

    #[test]
    fn test_apply_add_then_style() {
        let mut comp = Composition::default();
        let outcome = comp.apply(Command::AddOverlay).expect("add");
        let CommandOutcome::Added { id } = outcome else {
            panic!("expected Added, got {outcome:?}");
        };

        assert_eq!(
            comp.apply(Command::SetFont {
                font: FontFamily::Bangers
            })
            .expect("font"),
            CommandOutcome::Applied
        );
        assert_eq!(comp.overlay(id).expect("overlay").font, FontFamily::Bangers);
    }

    #[test]
    fn test_apply_without_selection_is_ignored() {
        let mut comp = Composition::default();
        assert_eq!(
            comp.apply(Command::ApplyStylePreset).expect("preset"),
            CommandOutcome::Ignored
        );
        assert_eq!(
            comp.apply(Command::DeleteSelected).expect("delete"),
            CommandOutcome::Ignored
        );
    }

    #[test]
    fn test_apply_propagates_validation_errors() {
        let mut comp = Composition::default();
        comp.apply(Command::AddOverlay).expect("add");
        let err = comp
            .apply(Command::SetStroke {
                color: "black".to_string(),
            })
            .expect_err("invalid color");
        assert!(matches!(err, MemeError::InvalidColor(_)));
    }

    #[test]
    fn test_select_at_reports_selection() {
        let mut comp = Composition::default();
        comp.apply(Command::AddOverlay).expect("add");
        comp.apply(Command::ClearSelection).expect("clear");

        let outcome = comp
            .apply(Command::SelectAt { x: 256.0, y: 256.0 })
            .expect("select");
        assert!(matches!(outcome, CommandOutcome::Selected { id: Some(_) }));
    }
}
