//! # `RalphGen` Renderer
//!
//! Turns a meme [`Composition`](meme_core::Composition) into a PNG.
//!
//! ## Pipeline
//!
//! ```text
//! ┌──────────────┐    ┌──────────────┐    ┌──────────────┐
//! │ Composition  │ -> │  SVG scene   │ -> │ resvg/skia   │ -> PNG ImageRef
//! │ bg + overlays│    │  (no chrome) │    │  W x H pixmap│
//! └──────────────┘    └──────────────┘    └──────────────┘
//! ```

#![forbid(unsafe_code)]
#![deny(missing_docs)]
#![deny(clippy::all)]
#![deny(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod error;
pub mod export;
pub mod image;

pub use error::{RenderError, RenderResult};
pub use export::{export_filename, render_to_svg, SurfaceExporter};
pub use image::{decode, prepare_background, probe_dimensions, DecodedImage, ImageFormat};
