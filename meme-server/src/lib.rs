//! # RalphGen Server Library
//!
//! Gallery persistence, runtime config and the generate proxy.
//! This library is used by both the binary and integration tests.

#![forbid(unsafe_code)]
#![deny(missing_docs)]
#![deny(clippy::all)]
#![deny(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

use std::sync::Arc;

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};

pub mod config;
pub mod gallery_store;
pub mod health;
pub mod metrics;
pub mod routes;
pub mod upstream;
pub mod validation;

pub use config::{CliArgs, ServerConfig};
pub use gallery_store::{DiskGallery, GalleryStoreError};
pub use upstream::{UpstreamClient, UpstreamError};

/// Shared application state.
#[derive(Debug, Clone)]
pub struct AppState {
    /// On-disk gallery.
    pub gallery: Arc<DiskGallery>,
    /// Client for the upstream generation endpoint.
    pub upstream: UpstreamClient,
}

impl AppState {
    /// Create state from its parts.
    #[must_use]
    pub fn new(gallery: DiskGallery, upstream: UpstreamClient) -> Self {
        Self {
            gallery: Arc::new(gallery),
            upstream,
        }
    }

    /// Open the gallery and build the upstream client described by `config`.
    ///
    /// # Errors
    ///
    /// Returns an error if the gallery directory cannot be created or the
    /// endpoint is not a valid URL.
    pub fn from_config(config: &ServerConfig) -> anyhow::Result<Self> {
        let gallery = DiskGallery::open(&config.gallery_dir)?;
        let upstream = UpstreamClient::new(&config.z_image_endpoint)?;
        Ok(Self::new(gallery, upstream))
    }
}

/// Build the API, gallery and health routes.
///
/// Metrics, CORS, tracing and static files are layered on by the binary.
#[must_use]
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health/live", get(health::liveness))
        .route("/health/ready", get(health::readiness))
        .route("/health", get(health::readiness))
        .route("/api/config", get(routes::get_config))
        .route("/api/generate", post(routes::generate))
        .route(
            "/api/gallery",
            get(routes::list_gallery).post(routes::save_gallery),
        )
        .route("/api/gallery/delete", post(routes::delete_gallery))
        .route("/gallery/{file}", get(routes::gallery_image))
        .layer(DefaultBodyLimit::max(validation::MAX_REQUEST_SIZE))
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use tower::ServiceExt;

    fn state(dir: &std::path::Path) -> AppState {
        AppState::new(
            DiskGallery::open(dir).expect("gallery"),
            UpstreamClient::new("http://localhost:8000/generate").expect("upstream"),
        )
    }

    #[tokio::test]
    async fn test_router_serves_config() {
        let dir = tempfile::tempdir().expect("tempdir");
        let response = build_router(state(dir.path()))
            .oneshot(
                Request::get("/api/config")
                    .body(Body::empty())
                    .expect("request"),
            )
            .await
            .expect("response");
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_router_rejects_oversize_delete() {
        let dir = tempfile::tempdir().expect("tempdir");
        let body = format!(r#"{{"id":"{}"}}"#, "x".repeat(2048));
        let response = build_router(state(dir.path()))
            .oneshot(
                Request::post("/api/gallery/delete")
                    .header("content-type", "application/json")
                    .body(Body::from(body))
                    .expect("request"),
            )
            .await
            .expect("response");
        assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);
    }

    #[test]
    fn test_from_config_creates_gallery_dir() {
        let dir = tempfile::tempdir().expect("tempdir");
        let config = ServerConfig {
            gallery_dir: dir.path().join("memes"),
            ..ServerConfig::default()
        };
        let state = AppState::from_config(&config).expect("state");
        assert!(state.gallery.is_accessible());
    }
}
