//! On-disk gallery storage.
//!
//! Layout inside the gallery directory:
//!
//! ```text
//! gallery/
//! ├── index.json          # [{id, prompt, timestamp, image}, ...] oldest first
//! ├── <uuid>.png
//! └── <uuid>.png
//! ```
//!
//! Only the newest [`MAX_GALLERY_ITEMS`] entries are kept; older image files
//! are deleted when a save pushes them out.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};

use async_trait::async_trait;
use meme_core::gallery::persistence_error;
use meme_core::{GalleryBackend, GalleryItem, MemeResult, NewGalleryItem};
use uuid::Uuid;

use crate::validation::{check_image_magic, validate_gallery_id, ValidationError};

/// Maximum number of items retained (and listed).
pub const MAX_GALLERY_ITEMS: usize = 50;

/// Index file name.
pub const INDEX_FILE: &str = "index.json";

/// Errors that can occur during gallery store operations.
#[derive(Debug, thiserror::Error)]
pub enum GalleryStoreError {
    /// The ID or image failed validation.
    #[error(transparent)]
    Invalid(#[from] ValidationError),
    /// An I/O error occurred during persistence.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    /// The index could not be serialized.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// File-backed gallery shared across request handlers.
///
/// Index read-modify-write cycles are serialized by an internal lock, so
/// concurrent saves are all kept.
#[derive(Debug)]
pub struct DiskGallery {
    dir: PathBuf,
    lock: Mutex<()>,
}

impl DiskGallery {
    /// Open (and create if needed) a gallery directory.
    ///
    /// # Errors
    ///
    /// Returns [`GalleryStoreError::Io`] if the directory cannot be created.
    pub fn open(dir: impl Into<PathBuf>) -> Result<Self, GalleryStoreError> {
        let dir = dir.into();
        std::fs::create_dir_all(&dir)?;
        tracing::info!(dir = %dir.display(), "Gallery directory ready");
        Ok(Self {
            dir,
            lock: Mutex::new(()),
        })
    }

    /// The gallery directory.
    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Whether the gallery directory is still usable.
    #[must_use]
    pub fn is_accessible(&self) -> bool {
        self.dir.is_dir()
    }

    /// Path of an item's image file, or `None` for an invalid ID.
    #[must_use]
    pub fn image_path(&self, id: &str) -> Option<PathBuf> {
        validate_gallery_id(id).ok()?;
        Some(self.dir.join(format!("{id}.png")))
    }

    /// The newest [`MAX_GALLERY_ITEMS`] items, newest first.
    ///
    /// # Errors
    ///
    /// Returns [`GalleryStoreError::Io`] if the index cannot be read.
    pub fn list(&self) -> Result<Vec<GalleryItem>, GalleryStoreError> {
        let _guard = self.lock.lock().unwrap_or_else(PoisonError::into_inner);
        let items = self.read_index()?;
        let start = items.len().saturating_sub(MAX_GALLERY_ITEMS);
        Ok(items[start..].iter().rev().cloned().collect())
    }

    /// Store a validated PNG/JPEG image and append it to the index.
    ///
    /// # Errors
    ///
    /// Returns [`GalleryStoreError::Invalid`] if `bytes` is not a PNG or JPEG,
    /// or [`GalleryStoreError::Io`] if a write fails.
    pub fn save(
        &self,
        bytes: &[u8],
        prompt: &str,
        timestamp: i64,
    ) -> Result<GalleryItem, GalleryStoreError> {
        check_image_magic(bytes)?;

        let id = Uuid::new_v4().to_string();
        let item = GalleryItem {
            image: format!("/gallery/{id}.png"),
            prompt: prompt.to_string(),
            timestamp,
            id,
        };

        let _guard = self.lock.lock().unwrap_or_else(PoisonError::into_inner);
        std::fs::write(self.dir.join(format!("{}.png", item.id)), bytes)?;

        let evicted = match self.index_item(&item) {
            Ok(evicted) => evicted,
            Err(e) => {
                // Unindexed images are never listed or evicted.
                self.remove_image(&item.id);
                return Err(e);
            }
        };
        for old in &evicted {
            self.remove_image(&old.id);
        }
        if !evicted.is_empty() {
            tracing::debug!(evicted = evicted.len(), "Gallery retention applied");
        }

        tracing::info!(id = %item.id, bytes = bytes.len(), "Gallery item saved");
        Ok(item)
    }

    /// Delete an item's image and index entry.
    ///
    /// Returns whether an index entry was removed. Unknown IDs are not an
    /// error.
    ///
    /// # Errors
    ///
    /// Returns [`GalleryStoreError::Invalid`] for a malformed ID, or
    /// [`GalleryStoreError::Io`] if the index cannot be rewritten.
    pub fn delete(&self, id: &str) -> Result<bool, GalleryStoreError> {
        validate_gallery_id(id)?;

        let _guard = self.lock.lock().unwrap_or_else(PoisonError::into_inner);
        self.remove_image(id);

        let mut items = self.read_index()?;
        let before = items.len();
        items.retain(|item| item.id != id);
        let removed = items.len() != before;
        self.write_index(&items)?;

        tracing::info!(id, removed, "Gallery item deleted");
        Ok(removed)
    }

    /// Number of indexed items (before the listing cap).
    ///
    /// # Errors
    ///
    /// Returns [`GalleryStoreError::Io`] if the index cannot be read.
    pub fn len(&self) -> Result<usize, GalleryStoreError> {
        let _guard = self.lock.lock().unwrap_or_else(PoisonError::into_inner);
        Ok(self.read_index()?.len())
    }

    /// Whether the index is empty.
    ///
    /// # Errors
    ///
    /// Returns [`GalleryStoreError::Io`] if the index cannot be read.
    pub fn is_empty(&self) -> Result<bool, GalleryStoreError> {
        Ok(self.len()? == 0)
    }

    /// Append `item` to the index, returning the entries retention pushed out.
    fn index_item(&self, item: &GalleryItem) -> Result<Vec<GalleryItem>, GalleryStoreError> {
        let mut items = self.read_index()?;
        items.push(item.clone());
        let evicted = if items.len() > MAX_GALLERY_ITEMS {
            items.drain(..items.len() - MAX_GALLERY_ITEMS).collect()
        } else {
            Vec::new()
        };
        self.write_index(&items)?;
        Ok(evicted)
    }

    fn index_path(&self) -> PathBuf {
        self.dir.join(INDEX_FILE)
    }

    /// Read the index; a missing or corrupt index reads as empty.
    fn read_index(&self) -> Result<Vec<GalleryItem>, GalleryStoreError> {
        let contents = match std::fs::read_to_string(self.index_path()) {
            Ok(contents) => contents,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };
        match serde_json::from_str(&contents) {
            Ok(items) => Ok(items),
            Err(e) => {
                tracing::warn!(error = %e, "Gallery index is corrupt; starting fresh");
                Ok(Vec::new())
            }
        }
    }

    /// Write the index via a temp file so readers never see a partial file.
    fn write_index(&self, items: &[GalleryItem]) -> Result<(), GalleryStoreError> {
        let json = serde_json::to_string_pretty(items)?;
        let tmp = self.dir.join(format!("{INDEX_FILE}.tmp"));
        std::fs::write(&tmp, json)?;
        std::fs::rename(&tmp, self.index_path())?;
        Ok(())
    }

    fn remove_image(&self, id: &str) {
        let Some(path) = self.image_path(id) else {
            return;
        };
        match std::fs::remove_file(&path) {
            Ok(()) => {}
            Err(e) if e.kind() == ErrorKind::NotFound => {}
            Err(e) => tracing::warn!(path = %path.display(), error = %e, "Failed to remove gallery image"),
        }
    }
}

#[async_trait]
impl GalleryBackend for DiskGallery {
    async fn list(&self) -> MemeResult<Vec<GalleryItem>> {
        Self::list(self).map_err(persistence_error)
    }

    async fn create(&self, item: NewGalleryItem) -> MemeResult<GalleryItem> {
        let bytes = item.image.to_bytes()?;
        self.save(&bytes, &item.prompt, item.timestamp)
            .map_err(persistence_error)
    }

    async fn delete(&self, id: &str) -> MemeResult<()> {
        Self::delete(self, id).map(|_| ()).map_err(persistence_error)
    }
}
