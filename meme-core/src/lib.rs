//! # `RalphGen` Core
//!
//! Meme composition logic shared by the client, the renderer and the
//! gallery service.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────┐
//! │                  meme-core                  │
//! ├─────────────────────────────────────────────┤
//! │  Prompt          │  Composition             │
//! │  - Normalizer    │  - Background            │
//! │  - Validation    │  - Text overlays         │
//! │                  │  - Selection / commands  │
//! ├─────────────────────────────────────────────┤
//! │  Gallery         │  Layout                  │
//! │  - Backend seam  │  - Seeded scatter        │
//! │  - Client view   │                          │
//! └─────────────────────────────────────────────┘
//! ```

#![forbid(unsafe_code)]
#![deny(missing_docs)]
#![deny(clippy::all)]
#![deny(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod command;
pub mod composition;
pub mod error;
pub mod gallery;
pub mod generator;
pub mod image_ref;
pub mod input;
pub mod layout;
pub mod overlay;
pub mod prompt;

pub use command::{Command, CommandOutcome};
pub use composition::{Background, Composition, SurfaceEvent};
pub use error::{MemeError, MemeResult};
pub use gallery::{GalleryBackend, GalleryItem, GalleryStore, MemoryGalleryBackend, NewGalleryItem};
pub use generator::ImageGenerator;
pub use image_ref::ImageRef;
pub use input::{route_key, FocusTarget, Key};
pub use layout::{layout, scatter, ScatterPosition};
pub use overlay::{FontFamily, OverlayId, OverlayStyle, TextOverlay};

/// Core library version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
