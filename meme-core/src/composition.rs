//! The composition surface: one background image plus ordered text overlays.

use std::collections::VecDeque;

use serde::{Deserialize, Serialize};

use crate::overlay::{
    normalize_color, normalize_rotation, FontFamily, OverlayId, OverlayStyle, TextOverlay,
    MAX_FONT_SIZE, MIN_FONT_SIZE, PRESET_FILL, PRESET_STROKE, PRESET_STROKE_WIDTH,
};
use crate::{ImageRef, MemeError, MemeResult};

/// Default surface width in pixels.
pub const DEFAULT_SURFACE_WIDTH: u32 = 512;
/// Default surface height in pixels.
pub const DEFAULT_SURFACE_HEIGHT: u32 = 512;
/// Surface events kept before the oldest are dropped.
pub const MAX_PENDING_EVENTS: usize = 256;

/// The background image, scaled uniformly and anchored at the top-left.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Background {
    /// Image data.
    pub image: ImageRef,
    /// Natural width in pixels.
    pub natural_width: u32,
    /// Natural height in pixels.
    pub natural_height: u32,
    /// Uniform scale applied to fit the surface.
    pub scale: f32,
}

impl Background {
    /// Rendered (width, height) on the surface.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn rendered_size(&self) -> (f32, f32) {
        (
            self.natural_width as f32 * self.scale,
            self.natural_height as f32 * self.scale,
        )
    }
}

/// Observable changes that a front end mirrors into its controls.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SurfaceEvent {
    /// An overlay became the active selection.
    SelectionCreated {
        /// Selected overlay.
        id: OverlayId,
        /// Its style, for the font/color/width controls.
        style: OverlayStyle,
    },
    /// The active selection moved to another overlay.
    SelectionUpdated {
        /// Newly selected overlay.
        id: OverlayId,
        /// Its style.
        style: OverlayStyle,
    },
    /// Nothing is selected any more.
    SelectionCleared,
    /// The selected overlay's style changed and controls should follow.
    StyleReflected {
        /// Overlay whose style changed.
        id: OverlayId,
        /// The new style.
        style: OverlayStyle,
    },
}

/// The drawable surface state owned by one session.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Composition {
    width: u32,
    height: u32,
    background: Option<Background>,
    /// Overlays in z-order (later entries render on top).
    overlays: Vec<TextOverlay>,
    selection: Option<OverlayId>,
    editing: Option<OverlayId>,
    /// Undrained events; bounded by [`MAX_PENDING_EVENTS`].
    #[serde(skip)]
    events: VecDeque<SurfaceEvent>,
}

impl Default for Composition {
    fn default() -> Self {
        Self::new(DEFAULT_SURFACE_WIDTH, DEFAULT_SURFACE_HEIGHT)
    }
}

impl Composition {
    /// Create an empty composition with fixed surface dimensions.
    #[must_use]
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width: width.max(1),
            height: height.max(1),
            background: None,
            overlays: Vec::new(),
            selection: None,
            editing: None,
            events: VecDeque::new(),
        }
    }

    /// Surface width in pixels.
    #[must_use]
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Surface height in pixels.
    #[must_use]
    pub fn height(&self) -> u32 {
        self.height
    }

    // -----------------------------------------------------------------------
    // Background
    // -----------------------------------------------------------------------

    /// Replace the background, discarding any previous one.
    ///
    /// # Errors
    ///
    /// Returns [`MemeError::ImageDecode`] if either natural dimension is zero.
    #[allow(clippy::cast_precision_loss)]
    pub fn set_background(
        &mut self,
        image: ImageRef,
        natural_width: u32,
        natural_height: u32,
    ) -> MemeResult<()> {
        if natural_width == 0 || natural_height == 0 {
            return Err(MemeError::ImageDecode(format!(
                "image has no area ({natural_width}x{natural_height})"
            )));
        }
        let scale = (self.width as f32 / natural_width as f32)
            .min(self.height as f32 / natural_height as f32);
        tracing::debug!(natural_width, natural_height, scale, "Background set");
        self.background = Some(Background {
            image,
            natural_width,
            natural_height,
            scale,
        });
        Ok(())
    }

    /// Start a new composition: clear every overlay, then set the background.
    ///
    /// # Errors
    ///
    /// Returns [`MemeError::ImageDecode`] if either natural dimension is zero;
    /// the existing composition is left untouched in that case.
    pub fn load_background(
        &mut self,
        image: ImageRef,
        natural_width: u32,
        natural_height: u32,
    ) -> MemeResult<()> {
        let mut next = Self::new(self.width, self.height);
        next.set_background(image, natural_width, natural_height)?;
        if self.selection.is_some() {
            next.emit(SurfaceEvent::SelectionCleared);
        }
        *self = next;
        Ok(())
    }

    /// The current background, if any.
    #[must_use]
    pub fn background(&self) -> Option<&Background> {
        self.background.as_ref()
    }

    /// Whether a background is present.
    #[must_use]
    pub fn has_background(&self) -> bool {
        self.background.is_some()
    }

    /// Get ready to rasterize: requires a background and drops the selection
    /// so no selection chrome is baked into the output.
    ///
    /// # Errors
    ///
    /// Returns [`MemeError::NoBackground`] if no background is set.
    pub fn prepare_flatten(&mut self) -> MemeResult<&Background> {
        if self.background.is_none() {
            return Err(MemeError::NoBackground);
        }
        self.clear_selection();
        self.background.as_ref().ok_or(MemeError::NoBackground)
    }

    // -----------------------------------------------------------------------
    // Overlays
    // -----------------------------------------------------------------------

    /// Add a default overlay at the surface center and select it.
    #[allow(clippy::cast_precision_loss)]
    pub fn add_overlay(&mut self) -> OverlayId {
        let overlay = TextOverlay::new(self.width as f32 / 2.0, self.height as f32 / 2.0);
        self.insert_overlay(overlay)
    }

    /// Append an existing overlay on top of the stack and select it.
    pub fn insert_overlay(&mut self, overlay: TextOverlay) -> OverlayId {
        let id = overlay.id;
        self.overlays.push(overlay);
        self.editing = None;
        self.selection = Some(id);
        self.push_selection_event(id, SelectionChange::Created);
        id
    }

    /// Remove the selected overlay.
    ///
    /// Returns `false` (and does nothing) when nothing is selected or an
    /// inline text edit is in progress.
    pub fn delete_selected(&mut self) -> bool {
        if self.editing.is_some() {
            tracing::debug!("Delete suppressed during inline edit");
            return false;
        }
        let Some(id) = self.selection.take() else {
            return false;
        };
        let before = self.overlays.len();
        self.overlays.retain(|o| o.id != id);
        self.emit(SurfaceEvent::SelectionCleared);
        self.overlays.len() != before
    }

    /// All overlays in z-order.
    #[must_use]
    pub fn overlays(&self) -> &[TextOverlay] {
        &self.overlays
    }

    /// Get an overlay by ID.
    #[must_use]
    pub fn overlay(&self, id: OverlayId) -> Option<&TextOverlay> {
        self.overlays.iter().find(|o| o.id == id)
    }

    /// Number of overlays.
    #[must_use]
    pub fn overlay_count(&self) -> usize {
        self.overlays.len()
    }

    // -----------------------------------------------------------------------
    // Selection
    // -----------------------------------------------------------------------

    /// The selected overlay ID.
    #[must_use]
    pub fn selection(&self) -> Option<OverlayId> {
        self.selection
    }

    /// The selected overlay.
    #[must_use]
    pub fn selected(&self) -> Option<&TextOverlay> {
        self.selection.and_then(|id| self.overlay(id))
    }

    /// Select an overlay by ID.
    ///
    /// # Errors
    ///
    /// Returns [`MemeError::OverlayNotFound`] if no such overlay exists.
    pub fn select(&mut self, id: OverlayId) -> MemeResult<()> {
        if self.overlay(id).is_none() {
            return Err(MemeError::OverlayNotFound(id.to_string()));
        }
        if self.selection == Some(id) {
            return Ok(());
        }
        let change = if self.selection.is_some() {
            SelectionChange::Updated
        } else {
            SelectionChange::Created
        };
        self.editing = None;
        self.selection = Some(id);
        self.push_selection_event(id, change);
        Ok(())
    }

    /// Select the topmost overlay under a point, or clear the selection if
    /// the point only hits the background.
    pub fn select_at(&mut self, x: f32, y: f32) -> Option<OverlayId> {
        let hit = self
            .overlays
            .iter()
            .rev()
            .find(|o| o.contains_point(x, y))
            .map(|o| o.id);
        match hit {
            Some(id) => {
                // The ID came from the overlay list, so select cannot fail.
                let _ = self.select(id);
            }
            None => self.clear_selection(),
        }
        hit
    }

    /// Drop the active selection (and any inline edit).
    pub fn clear_selection(&mut self) {
        self.editing = None;
        if self.selection.take().is_some() {
            self.emit(SurfaceEvent::SelectionCleared);
        }
    }

    // -----------------------------------------------------------------------
    // Inline text editing
    // -----------------------------------------------------------------------

    /// Enter inline text editing on the selected overlay.
    pub fn begin_text_edit(&mut self) -> bool {
        self.editing = self.selection;
        self.editing.is_some()
    }

    /// Commit an inline edit with the final text.
    pub fn commit_text_edit(&mut self, text: impl Into<String>) -> bool {
        let Some(id) = self.editing.take() else {
            return false;
        };
        let text = text.into();
        self.with_overlay(id, |o| o.text = text)
    }

    /// Abandon an inline edit.
    pub fn cancel_text_edit(&mut self) -> bool {
        self.editing.take().is_some()
    }

    /// Whether an inline edit is in progress.
    #[must_use]
    pub fn is_editing(&self) -> bool {
        self.editing.is_some()
    }

    // -----------------------------------------------------------------------
    // Style and geometry of the selected overlay
    // -----------------------------------------------------------------------

    /// Set the font of the selected overlay.
    pub fn set_font(&mut self, font: FontFamily) -> bool {
        self.mutate_selected(|o| o.font = font)
    }

    /// Set the fill color of the selected overlay.
    ///
    /// # Errors
    ///
    /// Returns [`MemeError::InvalidColor`] if `color` is not hex.
    pub fn set_fill(&mut self, color: &str) -> MemeResult<bool> {
        let color = normalize_color(color)?;
        Ok(self.mutate_selected(|o| o.fill = color))
    }

    /// Set the stroke color of the selected overlay.
    ///
    /// # Errors
    ///
    /// Returns [`MemeError::InvalidColor`] if `color` is not hex.
    pub fn set_stroke(&mut self, color: &str) -> MemeResult<bool> {
        let color = normalize_color(color)?;
        Ok(self.mutate_selected(|o| o.stroke = color))
    }

    /// Set the stroke width of the selected overlay.
    ///
    /// # Errors
    ///
    /// Returns [`MemeError::InvalidOperation`] for negative or non-finite widths.
    pub fn set_stroke_width(&mut self, width: f32) -> MemeResult<bool> {
        if !width.is_finite() || width < 0.0 {
            return Err(MemeError::InvalidOperation(format!(
                "stroke width must be a non-negative number, got {width}"
            )));
        }
        Ok(self.mutate_selected(|o| o.stroke_width = width))
    }

    /// Apply the canonical meme style (white fill, black stroke, width 3) to
    /// the selected overlay and reflect it to the controls.
    pub fn apply_style_preset(&mut self) -> bool {
        let changed = self.mutate_selected(|o| {
            o.fill = PRESET_FILL.to_string();
            o.stroke = PRESET_STROKE.to_string();
            o.stroke_width = PRESET_STROKE_WIDTH;
        });
        if changed {
            if let Some(overlay) = self.selected() {
                let event = SurfaceEvent::StyleReflected {
                    id: overlay.id,
                    style: overlay.style(),
                };
                self.emit(event);
            }
        }
        changed
    }

    /// Replace the text of the selected overlay.
    pub fn set_text(&mut self, text: impl Into<String>) -> bool {
        let text = text.into();
        self.mutate_selected(|o| o.text = text)
    }

    /// Move the selected overlay's center.
    ///
    /// # Errors
    ///
    /// Returns [`MemeError::InvalidOperation`] for non-finite coordinates.
    pub fn move_selected(&mut self, x: f32, y: f32) -> MemeResult<bool> {
        if !x.is_finite() || !y.is_finite() {
            return Err(MemeError::InvalidOperation(
                "position must be finite".to_string(),
            ));
        }
        Ok(self.mutate_selected(|o| {
            o.x = x;
            o.y = y;
        }))
    }

    /// Set the selected overlay's rotation in degrees (any range).
    ///
    /// # Errors
    ///
    /// Returns [`MemeError::InvalidOperation`] for non-finite angles.
    pub fn rotate_selected(&mut self, degrees: f32) -> MemeResult<bool> {
        if !degrees.is_finite() {
            return Err(MemeError::InvalidOperation(
                "rotation must be finite".to_string(),
            ));
        }
        Ok(self.mutate_selected(|o| o.rotation = normalize_rotation(degrees)))
    }

    /// Resize the selected overlay's font, clamped to the allowed range.
    ///
    /// # Errors
    ///
    /// Returns [`MemeError::InvalidOperation`] for non-finite sizes.
    pub fn resize_selected(&mut self, font_size: f32) -> MemeResult<bool> {
        if !font_size.is_finite() {
            return Err(MemeError::InvalidOperation(
                "font size must be finite".to_string(),
            ));
        }
        let size = font_size.clamp(MIN_FONT_SIZE, MAX_FONT_SIZE);
        Ok(self.mutate_selected(|o| o.font_size = size))
    }

    // -----------------------------------------------------------------------
    // Events
    // -----------------------------------------------------------------------

    /// Take all queued surface events, oldest first.
    ///
    /// Front ends should drain after each dispatch; only the newest
    /// [`MAX_PENDING_EVENTS`] are kept otherwise.
    pub fn drain_events(&mut self) -> Vec<SurfaceEvent> {
        self.events.drain(..).collect()
    }

    fn emit(&mut self, event: SurfaceEvent) {
        if self.events.len() == MAX_PENDING_EVENTS {
            self.events.pop_front();
        }
        self.events.push_back(event);
    }

    fn mutate_selected<F>(&mut self, f: F) -> bool
    where
        F: FnOnce(&mut TextOverlay),
    {
        match self.selection {
            Some(id) => self.with_overlay(id, f),
            None => false,
        }
    }

    fn with_overlay<F>(&mut self, id: OverlayId, f: F) -> bool
    where
        F: FnOnce(&mut TextOverlay),
    {
        match self.overlays.iter_mut().find(|o| o.id == id) {
            Some(overlay) => {
                f(overlay);
                true
            }
            None => false,
        }
    }

    fn push_selection_event(&mut self, id: OverlayId, change: SelectionChange) {
        let Some(style) = self.overlay(id).map(TextOverlay::style) else {
            return;
        };
        let event = match change {
            SelectionChange::Created => SurfaceEvent::SelectionCreated { id, style },
            SelectionChange::Updated => SurfaceEvent::SelectionUpdated { id, style },
        };
        self.emit(event);
    }
}

#[derive(Debug, Clone, Copy)]
enum SelectionChange {
    Created,
    Updated,
}
