//! Gallery of exported memes.
//!
//! [`GalleryStore`] is the client-side view of the gallery. Persistence goes
//! through a [`GalleryBackend`], so the same store works against the HTTP
//! service, the on-disk server store or the in-memory backend below.

use std::sync::{Arc, PoisonError, RwLock};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{ImageRef, MemeError, MemeResult};

/// A persisted gallery entry. Immutable once stored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GalleryItem {
    /// UUID v4 assigned by the store.
    pub id: String,
    /// Data URL, or a server-relative path such as `/gallery/<id>.png`.
    pub image: String,
    /// The user's original prompt (not normalized). May be empty.
    #[serde(default)]
    pub prompt: String,
    /// Milliseconds since the Unix epoch.
    pub timestamp: i64,
}

/// Payload for a new gallery entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewGalleryItem {
    /// Flattened image.
    pub image: ImageRef,
    /// The user's original prompt.
    pub prompt: String,
    /// Milliseconds since the Unix epoch.
    pub timestamp: i64,
}

/// Persistence seam for gallery items.
#[async_trait]
pub trait GalleryBackend: Send + Sync {
    /// List stored items in the backend's own order.
    ///
    /// # Errors
    ///
    /// Returns [`MemeError::PersistenceFailed`] when the backend is unreachable.
    async fn list(&self) -> MemeResult<Vec<GalleryItem>>;

    /// Persist a new item and return it with its assigned ID.
    ///
    /// # Errors
    ///
    /// Returns [`MemeError::PersistenceFailed`] when the write fails.
    async fn create(&self, item: NewGalleryItem) -> MemeResult<GalleryItem>;

    /// Delete an item. Deleting an unknown ID is not an error.
    ///
    /// # Errors
    ///
    /// Returns [`MemeError::PersistenceFailed`] when the delete fails.
    async fn delete(&self, id: &str) -> MemeResult<()>;
}

/// In-process backend, newest first. Clones share the same items.
#[derive(Debug, Clone, Default)]
pub struct MemoryGalleryBackend {
    items: Arc<RwLock<Vec<GalleryItem>>>,
}

impl MemoryGalleryBackend {
    /// Create an empty backend.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored items.
    #[must_use]
    pub fn len(&self) -> usize {
        self.items
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// Whether the backend holds no items.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl GalleryBackend for MemoryGalleryBackend {
    async fn list(&self) -> MemeResult<Vec<GalleryItem>> {
        Ok(self
            .items
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone())
    }

    async fn create(&self, item: NewGalleryItem) -> MemeResult<GalleryItem> {
        let stored = GalleryItem {
            id: Uuid::new_v4().to_string(),
            image: item.image.to_data_url(),
            prompt: item.prompt,
            timestamp: item.timestamp,
        };
        self.items
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(0, stored.clone());
        Ok(stored)
    }

    async fn delete(&self, id: &str) -> MemeResult<()> {
        self.items
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .retain(|item| item.id != id);
        Ok(())
    }
}

/// Client-side gallery view backed by a [`GalleryBackend`].
#[derive(Debug)]
pub struct GalleryStore<B> {
    backend: B,
    items: Vec<GalleryItem>,
}

impl<B: GalleryBackend> GalleryStore<B> {
    /// Create an empty view over `backend`.
    pub fn new(backend: B) -> Self {
        Self {
            backend,
            items: Vec::new(),
        }
    }

    /// Replace the view with the backend's listing and return it.
    ///
    /// Idempotent: calling it twice without intervening appends yields the
    /// same list.
    ///
    /// # Errors
    ///
    /// Propagates the backend error; the view is left unchanged.
    pub async fn fetch_all(&mut self) -> MemeResult<&[GalleryItem]> {
        let items = self.backend.list().await?;
        tracing::debug!(count = items.len(), "Gallery fetched");
        self.items = items;
        Ok(&self.items)
    }

    /// Persist a new item, then add it to the front of the view.
    ///
    /// # Errors
    ///
    /// Propagates the backend error; nothing is added to the view.
    pub async fn append(
        &mut self,
        image: ImageRef,
        prompt: impl Into<String>,
        timestamp: i64,
    ) -> MemeResult<GalleryItem> {
        let item = self
            .backend
            .create(NewGalleryItem {
                image,
                prompt: prompt.into(),
                timestamp,
            })
            .await?;
        tracing::info!(id = %item.id, "Gallery item appended");
        self.items.insert(0, item.clone());
        Ok(item)
    }

    /// Delete an item through the backend and drop it from the view.
    ///
    /// # Errors
    ///
    /// Propagates the backend error; the view is left unchanged.
    pub async fn remove(&mut self, id: &str) -> MemeResult<()> {
        self.backend.delete(id).await?;
        self.items.retain(|item| item.id != id);
        Ok(())
    }

    /// Clear the in-memory view without touching the backend.
    pub fn clear(&mut self) {
        self.items.clear();
    }

    /// Current in-memory view.
    #[must_use]
    pub fn items(&self) -> &[GalleryItem] {
        &self.items
    }

    /// The underlying backend.
    #[must_use]
    pub fn backend(&self) -> &B {
        &self.backend
    }
}

/// Wrap a transport-level failure as [`MemeError::PersistenceFailed`].
pub fn persistence_error(err: impl std::fmt::Display) -> MemeError {
    MemeError::PersistenceFailed(err.to_string())
}
