//! HTTP client for the image generation service.
//!
//! The service accepts `POST {"prompt": ...}` and answers either
//! `{"image": "<data URL or base64>"}` or `{"url": "<image location>"}`.

use std::time::Duration;

use async_trait::async_trait;
use meme_core::image_ref::sniff_mime;
use meme_core::{ImageGenerator, ImageRef, MemeResult};
use reqwest::{header, Client};
use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::{check_status, ClientError, ClientResult};

/// Default generation request timeout.
pub const GENERATION_TIMEOUT: Duration = Duration::from_secs(120);

/// Optional knobs forwarded to the generation service.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct GenerationOptions {
    /// Output width in pixels.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub width: Option<u32>,
    /// Output height in pixels.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub height: Option<u32>,
    /// Diffusion steps.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub steps: Option<u32>,
    /// Fixed seed for reproducible output.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub seed: Option<u64>,
}

#[derive(Debug, Serialize)]
struct GenerateRequest<'a> {
    prompt: &'a str,
    #[serde(flatten)]
    options: &'a GenerationOptions,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    image: Option<String>,
    #[serde(default)]
    url: Option<String>,
}

/// [`ImageGenerator`] backed by an HTTP endpoint.
#[derive(Debug, Clone)]
pub struct GenerationClient {
    http: Client,
    endpoint: Url,
    options: GenerationOptions,
}

impl GenerationClient {
    /// Create a client for `endpoint` with the default timeout.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::InvalidUrl`] if the URL is malformed.
    /// Returns [`ClientError::Http`] if the HTTP client fails to build.
    pub fn new(endpoint: &str) -> ClientResult<Self> {
        Self::with_timeout(endpoint, GENERATION_TIMEOUT)
    }

    /// Create a client with a custom request timeout.
    ///
    /// # Errors
    ///
    /// Same as [`GenerationClient::new`].
    pub fn with_timeout(endpoint: &str, timeout: Duration) -> ClientResult<Self> {
        let endpoint = Url::parse(endpoint).map_err(|e| ClientError::InvalidUrl(e.to_string()))?;
        let http = Client::builder()
            .user_agent(concat!("ralphgen/", env!("CARGO_PKG_VERSION")))
            .timeout(timeout)
            .build()?;
        Ok(Self {
            http,
            endpoint,
            options: GenerationOptions::default(),
        })
    }

    /// Attach generation options sent with every request.
    #[must_use]
    pub fn with_options(mut self, options: GenerationOptions) -> Self {
        self.options = options;
        self
    }

    /// The generation endpoint.
    #[must_use]
    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    async fn request(&self, prompt: &str) -> ClientResult<ImageRef> {
        let body = GenerateRequest {
            prompt,
            options: &self.options,
        };
        let response = self
            .http
            .post(self.endpoint.clone())
            .json(&body)
            .send()
            .await?;
        let response = check_status(response).await?;
        let payload: GenerateResponse = serde_json::from_slice(&response.bytes().await?)?;

        if let Some(image) = payload.image.filter(|s| !s.is_empty()) {
            return ImageRef::parse(&image)
                .map_err(|e| ClientError::UnexpectedResponse(e.to_string()));
        }
        if let Some(url) = payload.url.filter(|s| !s.is_empty()) {
            return self.fetch_image(&url).await;
        }
        Err(ClientError::UnexpectedResponse(
            "No image data in response".to_string(),
        ))
    }

    /// Download an image referenced by URL, relative to the endpoint.
    async fn fetch_image(&self, location: &str) -> ClientResult<ImageRef> {
        let url = self
            .endpoint
            .join(location)
            .map_err(|e| ClientError::InvalidUrl(e.to_string()))?;
        tracing::debug!(%url, "Fetching generated image");

        let response = check_status(self.http.get(url).send().await?).await?;
        let declared = response
            .headers()
            .get(header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .filter(|v| v.starts_with("image/"))
            .map(|v| v.split(';').next().unwrap_or(v).trim().to_string());
        let bytes = response.bytes().await?;
        if bytes.is_empty() {
            return Err(ClientError::UnexpectedResponse("empty image body".to_string()));
        }
        let mime = declared.unwrap_or_else(|| sniff_mime(&bytes).to_string());
        Ok(ImageRef::from_bytes(&mime, &bytes))
    }
}

#[async_trait]
impl ImageGenerator for GenerationClient {
    #[tracing::instrument(name = "generate_image", skip(self), fields(endpoint = %self.endpoint))]
    async fn generate(&self, prompt: &str) -> MemeResult<ImageRef> {
        match self.request(prompt).await {
            Ok(image) => {
                tracing::info!(mime = image.mime(), "Image generated");
                Ok(image)
            }
            Err(e) => {
                tracing::warn!(error = %e, "Generation failed");
                Err(e.into_generation())
            }
        }
    }
}
