//! API route handlers.

use std::time::Instant;

use axum::{
    body::Bytes,
    extract::{Path, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use meme_core::GalleryItem;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::gallery_store::GalleryStoreError;
use crate::metrics;
use crate::upstream::UpstreamError;
use crate::validation::{
    clamp_timestamp, decode_image, sanitize_prompt, validate_body_size, validate_gallery_id,
    ValidationError, MAX_DELETE_REQUEST_SIZE, MAX_GENERATE_REQUEST_SIZE, MAX_REQUEST_SIZE,
};
use crate::AppState;

/// An error response rendered as `{"error": "<message>"}`.
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    message: String,
}

impl ApiError {
    /// Create an error with an explicit status.
    #[must_use]
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }

    /// HTTP status of this error.
    #[must_use]
    pub fn status(&self) -> StatusCode {
        self.status
    }

    fn internal(message: impl Into<String>) -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, message)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(json!({ "error": self.message }))).into_response()
    }
}

impl From<ValidationError> for ApiError {
    fn from(err: ValidationError) -> Self {
        metrics::record_validation_failure(err.kind());
        let status = match err {
            ValidationError::BodySize { .. } => StatusCode::PAYLOAD_TOO_LARGE,
            _ => StatusCode::BAD_REQUEST,
        };
        Self::new(status, err.to_string())
    }
}

impl From<GalleryStoreError> for ApiError {
    fn from(err: GalleryStoreError) -> Self {
        match err {
            GalleryStoreError::Invalid(invalid) => invalid.into(),
            other => {
                tracing::error!(error = %other, "Gallery storage failed");
                Self::internal("Gallery storage failed")
            }
        }
    }
}

impl From<UpstreamError> for ApiError {
    fn from(err: UpstreamError) -> Self {
        match err {
            UpstreamError::Status { status, reason } => Self::new(status, reason),
            UpstreamError::Unreachable(_) => Self::new(StatusCode::BAD_GATEWAY, err.to_string()),
            other => Self::internal(other.to_string()),
        }
    }
}

type ApiResult<T> = Result<T, ApiError>;

/// Runtime configuration exposed to clients.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RuntimeConfig {
    /// Upstream image generation endpoint.
    pub z_image_endpoint: String,
}

/// `GET /api/config`
#[tracing::instrument(name = "get_config", skip(state))]
pub async fn get_config(State(state): State<AppState>) -> Json<RuntimeConfig> {
    Json(RuntimeConfig {
        z_image_endpoint: state.upstream.endpoint().to_string(),
    })
}

/// `POST /api/generate`: forward the body verbatim to the upstream.
#[tracing::instrument(name = "generate", skip(state, body), fields(bytes = body.len()))]
pub async fn generate(State(state): State<AppState>, body: Bytes) -> ApiResult<Response> {
    validate_body_size(body.len(), MAX_GENERATE_REQUEST_SIZE)?;

    let started = Instant::now();
    let result = state.upstream.forward(body).await;
    let elapsed = started.elapsed().as_secs_f64();

    match result {
        Ok(response) => {
            metrics::record_generate("success", elapsed);
            Ok(([(header::CONTENT_TYPE, "application/json")], response).into_response())
        }
        Err(err) => {
            let outcome = match err {
                UpstreamError::Unreachable(_) => "unreachable",
                _ => "upstream_error",
            };
            metrics::record_generate(outcome, elapsed);
            tracing::warn!(error = %err, "Generation proxy failed");
            Err(err.into())
        }
    }
}

/// `GET /api/gallery`
#[tracing::instrument(name = "list_gallery", skip(state))]
pub async fn list_gallery(State(state): State<AppState>) -> ApiResult<Json<Vec<GalleryItem>>> {
    let gallery = state.gallery.clone();
    let result = tokio::task::spawn_blocking(move || gallery.list())
        .await
        .map_err(|e| ApiError::internal(e.to_string()))?;
    metrics::record_gallery_operation("list", result.is_ok());
    Ok(Json(result?))
}

#[derive(Debug, Deserialize)]
struct SaveRequest {
    image: String,
    #[serde(default)]
    prompt: Option<Value>,
    #[serde(default)]
    timestamp: Option<Value>,
}

/// Response for a stored gallery item.
#[derive(Debug, Serialize)]
pub struct SaveResponse {
    /// Always `true`.
    pub success: bool,
    /// The stored item.
    #[serde(flatten)]
    pub item: GalleryItem,
}

fn prompt_text(value: Option<&Value>) -> String {
    match value {
        Some(Value::String(s)) => sanitize_prompt(s),
        _ => String::new(),
    }
}

/// `POST /api/gallery`
#[tracing::instrument(name = "save_gallery", skip(state, body), fields(bytes = body.len()))]
pub async fn save_gallery(State(state): State<AppState>, body: Bytes) -> ApiResult<Json<SaveResponse>> {
    validate_body_size(body.len(), MAX_REQUEST_SIZE)?;
    let request: SaveRequest =
        serde_json::from_slice(&body).map_err(|_| ValidationError::InvalidJson)?;

    let bytes = decode_image(&request.image)?;
    let prompt = prompt_text(request.prompt.as_ref());
    let timestamp = clamp_timestamp(request.timestamp.as_ref());

    let gallery = state.gallery.clone();
    let result = tokio::task::spawn_blocking(move || {
        let item = gallery.save(&bytes, &prompt, timestamp)?;
        metrics::set_gallery_items(gallery.len()?);
        Ok::<_, GalleryStoreError>(item)
    })
    .await
    .map_err(|e| ApiError::internal(e.to_string()))?;
    metrics::record_gallery_operation("save", result.is_ok());

    Ok(Json(SaveResponse {
        success: true,
        item: result?,
    }))
}

#[derive(Debug, Deserialize)]
struct DeleteRequest {
    id: String,
}

/// `POST /api/gallery/delete`
#[tracing::instrument(name = "delete_gallery", skip(state, body))]
pub async fn delete_gallery(State(state): State<AppState>, body: Bytes) -> ApiResult<Json<Value>> {
    validate_body_size(body.len(), MAX_DELETE_REQUEST_SIZE)?;
    let request: DeleteRequest =
        serde_json::from_slice(&body).map_err(|_| ValidationError::InvalidJson)?;
    validate_gallery_id(&request.id)?;

    let gallery = state.gallery.clone();
    let result = tokio::task::spawn_blocking(move || {
        let removed = gallery.delete(&request.id)?;
        metrics::set_gallery_items(gallery.len()?);
        Ok::<_, GalleryStoreError>(removed)
    })
    .await
    .map_err(|e| ApiError::internal(e.to_string()))?;
    metrics::record_gallery_operation("delete", result.is_ok());
    result?;

    Ok(Json(json!({ "success": true })))
}

/// `GET /gallery/{file}`: serve a stored image.
#[tracing::instrument(name = "gallery_image", skip(state))]
pub async fn gallery_image(
    State(state): State<AppState>,
    Path(file): Path<String>,
) -> ApiResult<Response> {
    let id = file.strip_suffix(".png").unwrap_or(&file);
    let path = state
        .gallery
        .image_path(id)
        .ok_or(ValidationError::InvalidId)?;

    match tokio::fs::read(&path).await {
        Ok(bytes) => {
            metrics::record_gallery_operation("image", true);
            Ok(([(header::CONTENT_TYPE, "image/png")], bytes).into_response())
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            metrics::record_gallery_operation("image", false);
            Err(ApiError::new(StatusCode::NOT_FOUND, "Image not found"))
        }
        Err(e) => {
            metrics::record_gallery_operation("image", false);
            tracing::error!(error = %e, "Failed to read gallery image");
            Err(ApiError::internal("Failed to read image"))
        }
    }
}
