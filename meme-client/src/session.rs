//! Editing session: one composition, one gallery view, one generator.
//!
//! Generation is split into [`Session::begin_generation`] and
//! [`Session::complete_generation`] so a front end can run the request on
//! another task while it keeps handling input. [`Session::generate`] does
//! both in one call.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use meme_core::prompt::{normalize, validate_prompt};
use meme_core::{
    Command, CommandOutcome, Composition, GalleryBackend, GalleryItem, GalleryStore,
    ImageGenerator, ImageRef, MemeError, MemeResult, SurfaceEvent,
};
use meme_renderer::{export_filename, prepare_background, SurfaceExporter};

/// A generation that has been started but not yet applied.
#[derive(Debug)]
#[must_use = "a pending generation must be completed or cancelled"]
pub struct PendingGeneration {
    prompt: String,
    normalized: String,
}

impl PendingGeneration {
    /// The prompt as the user typed it.
    #[must_use]
    pub fn prompt(&self) -> &str {
        &self.prompt
    }

    /// The prompt sent to the generator.
    #[must_use]
    pub fn normalized(&self) -> &str {
        &self.normalized
    }
}

/// Result of [`Session::export`].
#[derive(Debug)]
pub struct ExportOutcome {
    /// Where the PNG was written.
    pub path: PathBuf,
    /// Export time in milliseconds since the Unix epoch.
    pub timestamp: i64,
    /// The gallery entry, or why saving it failed. The file is kept either way.
    pub gallery: MemeResult<GalleryItem>,
}

/// Owned state for one user session.
pub struct Session<G, B> {
    composition: Composition,
    gallery: GalleryStore<B>,
    generator: Arc<G>,
    exporter: SurfaceExporter,
    in_flight: bool,
    prompt: String,
}

impl<G, B> std::fmt::Debug for Session<G, B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("overlays", &self.composition.overlay_count())
            .field("has_background", &self.composition.has_background())
            .field("in_flight", &self.in_flight)
            .field("prompt", &self.prompt)
            .finish_non_exhaustive()
    }
}

impl<G: ImageGenerator, B: GalleryBackend> Session<G, B> {
    /// Create a session with a default-sized surface.
    #[must_use]
    pub fn new(generator: G, backend: B) -> Self {
        Self::with_parts(
            generator,
            backend,
            Composition::default(),
            SurfaceExporter::new(),
        )
    }

    /// Create a session from explicit parts.
    #[must_use]
    pub fn with_parts(
        generator: G,
        backend: B,
        composition: Composition,
        exporter: SurfaceExporter,
    ) -> Self {
        Self {
            composition,
            gallery: GalleryStore::new(backend),
            generator: Arc::new(generator),
            exporter,
            in_flight: false,
            prompt: String::new(),
        }
    }

    /// Shared handle to the generator, for running a pending generation
    /// elsewhere.
    #[must_use]
    pub fn generator(&self) -> Arc<G> {
        Arc::clone(&self.generator)
    }

    /// Whether a generation is pending.
    #[must_use]
    pub fn is_generating(&self) -> bool {
        self.in_flight
    }

    /// Validate and normalize `raw`, and mark a generation as in flight.
    ///
    /// # Errors
    ///
    /// Returns [`MemeError::EmptyPrompt`] for blank input and
    /// [`MemeError::GenerationInFlight`] if a generation is already pending.
    pub fn begin_generation(&mut self, raw: &str) -> MemeResult<PendingGeneration> {
        validate_prompt(raw)?;
        if self.in_flight {
            return Err(MemeError::GenerationInFlight);
        }
        self.in_flight = true;
        let normalized = normalize(raw);
        tracing::info!(prompt = %normalized, "Generation started");
        Ok(PendingGeneration {
            prompt: raw.to_string(),
            normalized,
        })
    }

    /// Apply a finished generation.
    ///
    /// On success the image becomes the background of a fresh composition
    /// and the original prompt is remembered for the gallery. On failure the
    /// current composition is untouched.
    ///
    /// # Errors
    ///
    /// Returns the generator's error, or [`MemeError::ImageDecode`] if the
    /// image cannot be decoded. Formats the exporter cannot embed are
    /// converted to PNG first.
    pub fn complete_generation(
        &mut self,
        pending: PendingGeneration,
        result: MemeResult<ImageRef>,
    ) -> MemeResult<()> {
        self.in_flight = false;
        let (image, width, height) = prepare_background(result?)?;
        self.composition.load_background(image, width, height)?;
        self.prompt = pending.prompt;
        tracing::info!(width, height, "Background loaded");
        Ok(())
    }

    /// Abandon a pending generation.
    pub fn cancel_generation(&mut self, pending: PendingGeneration) {
        let PendingGeneration { normalized, .. } = pending;
        self.in_flight = false;
        tracing::debug!(prompt = %normalized, "Generation cancelled");
    }

    /// Generate an image for `raw` and load it as the background.
    ///
    /// # Errors
    ///
    /// See [`Session::begin_generation`] and [`Session::complete_generation`].
    pub async fn generate(&mut self, raw: &str) -> MemeResult<()> {
        let pending = self.begin_generation(raw)?;
        let result = self.generator.generate(pending.normalized()).await;
        self.complete_generation(pending, result)
    }

    /// Apply an editing command to the composition.
    ///
    /// # Errors
    ///
    /// Propagates [`Composition::apply`] errors.
    pub fn dispatch(&mut self, command: Command) -> MemeResult<CommandOutcome> {
        self.composition.apply(command)
    }

    /// Flatten, write `ralph-meme-<ts>.png` into `dir`, and save to the
    /// gallery.
    ///
    /// # Errors
    ///
    /// Returns [`MemeError::NoBackground`] if nothing has been generated, or
    /// [`MemeError::PersistenceFailed`] if the file cannot be written. A
    /// gallery failure is reported in [`ExportOutcome::gallery`] instead.
    pub async fn export(&mut self, dir: &Path) -> MemeResult<ExportOutcome> {
        let image = self.exporter.flatten(&mut self.composition)?;
        let timestamp = now_millis();
        let path = dir.join(export_filename(timestamp));

        tokio::fs::write(&path, image.to_bytes()?)
            .await
            .map_err(|e| {
                MemeError::PersistenceFailed(format!("failed to write {}: {e}", path.display()))
            })?;
        tracing::info!(path = %path.display(), "Meme exported");

        let gallery = self
            .gallery
            .append(image, self.prompt.clone(), timestamp)
            .await;
        if let Err(e) = &gallery {
            tracing::warn!(error = %e, "Failed to save to gallery");
        }

        Ok(ExportOutcome {
            path,
            timestamp,
            gallery,
        })
    }

    /// Reload the gallery view. On failure the view is emptied.
    pub async fn refresh_gallery(&mut self) -> &[GalleryItem] {
        let fetched = self.gallery.fetch_all().await.map(<[GalleryItem]>::len);
        match fetched {
            Ok(count) => tracing::debug!(count, "Gallery refreshed"),
            Err(e) => {
                tracing::warn!(error = %e, "Failed to load gallery");
                self.gallery.clear();
            }
        }
        self.gallery.items()
    }

    /// Delete a gallery item.
    ///
    /// # Errors
    ///
    /// Returns [`MemeError::PersistenceFailed`] if the backend refuses.
    pub async fn remove_from_gallery(&mut self, id: &str) -> MemeResult<()> {
        self.gallery.remove(id).await
    }

    /// The composition being edited.
    #[must_use]
    pub fn composition(&self) -> &Composition {
        &self.composition
    }

    /// The current gallery view.
    #[must_use]
    pub fn gallery(&self) -> &[GalleryItem] {
        self.gallery.items()
    }

    /// The original prompt of the current background.
    #[must_use]
    pub fn prompt(&self) -> &str {
        &self.prompt
    }

    /// Take the surface events emitted since the last call.
    pub fn drain_events(&mut self) -> Vec<SurfaceEvent> {
        self.composition.drain_events()
    }
}

fn now_millis() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_or(0, |d| i64::try_from(d.as_millis()).unwrap_or(i64::MAX))
}
