//! # RalphGen Client
//!
//! Session orchestration and the `ralphgen` command-line front end.
//!
//! ## Usage
//!
//! ```bash
//! ralphgen generate "ralph at the beach" -c "TOP TEXT" -c "BOTTOM TEXT"
//! ralphgen gallery list
//! ```
//!
//! ## Architecture
//!
//! - `CliArgs` - Command-line arguments parsed with clap
//! - `ClientConfig` - Server URL and generation endpoint discovery
//! - `GenerationClient` - HTTP [`ImageGenerator`](meme_core::ImageGenerator)
//! - `HttpGalleryBackend` - HTTP [`GalleryBackend`](meme_core::GalleryBackend)
//! - `Session` - Composition, gallery view and generator for one user

#![forbid(unsafe_code)]
#![deny(missing_docs)]
#![deny(clippy::all)]
#![deny(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod captions;
pub mod config;
pub mod error;
pub mod gallery_http;
pub mod generation;
pub mod session;

pub use config::{fetch_runtime_config, Action, CliArgs, ClientConfig, GalleryAction};
pub use error::{ClientError, ClientResult};
pub use gallery_http::HttpGalleryBackend;
pub use generation::{GenerationClient, GenerationOptions};
pub use session::{ExportOutcome, PendingGeneration, Session};
