//! Gallery backend that talks to a ralphgen-server.

use async_trait::async_trait;
use meme_core::{GalleryBackend, GalleryItem, MemeResult, NewGalleryItem};
use reqwest::Client;
use serde::Serialize;
use serde_json::json;
use url::Url;

use crate::error::{check_status, ClientError, ClientResult};

#[derive(Debug, Serialize)]
struct SaveRequest<'a> {
    image: String,
    prompt: &'a str,
    timestamp: i64,
}

/// [`GalleryBackend`] over the server's `/api/gallery` routes.
#[derive(Debug, Clone)]
pub struct HttpGalleryBackend {
    http: Client,
    base: Url,
}

impl HttpGalleryBackend {
    /// Create a backend for the server at `base_url`.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::InvalidUrl`] if the URL is malformed, or
    /// [`ClientError::Http`] if the HTTP client fails to build.
    pub fn new(base_url: &str) -> ClientResult<Self> {
        let base = Url::parse(base_url).map_err(|e| ClientError::InvalidUrl(e.to_string()))?;
        let http = Client::builder()
            .user_agent(concat!("ralphgen/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self { http, base })
    }

    /// The server base URL.
    #[must_use]
    pub fn base(&self) -> &Url {
        &self.base
    }

    /// Absolute URL of an item's image (server-relative paths are resolved).
    #[must_use]
    pub fn image_url(&self, item: &GalleryItem) -> Option<Url> {
        if item.image.starts_with("data:") {
            return None;
        }
        self.base.join(&item.image).ok()
    }

    fn url(&self, path: &str) -> ClientResult<Url> {
        self.base
            .join(path)
            .map_err(|e| ClientError::InvalidUrl(e.to_string()))
    }

    async fn fetch_list(&self) -> ClientResult<Vec<GalleryItem>> {
        let response = self.http.get(self.url("/api/gallery")?).send().await?;
        let response = check_status(response).await?;
        Ok(serde_json::from_slice(&response.bytes().await?)?)
    }

    async fn post_item(&self, item: &NewGalleryItem) -> ClientResult<GalleryItem> {
        let body = SaveRequest {
            image: item.image.to_data_url(),
            prompt: &item.prompt,
            timestamp: item.timestamp,
        };
        let response = self
            .http
            .post(self.url("/api/gallery")?)
            .json(&body)
            .send()
            .await?;
        let response = check_status(response).await?;
        Ok(serde_json::from_slice(&response.bytes().await?)?)
    }

    async fn post_delete(&self, id: &str) -> ClientResult<()> {
        let response = self
            .http
            .post(self.url("/api/gallery/delete")?)
            .json(&json!({ "id": id }))
            .send()
            .await?;
        check_status(response).await?;
        Ok(())
    }
}

#[async_trait]
impl GalleryBackend for HttpGalleryBackend {
    async fn list(&self) -> MemeResult<Vec<GalleryItem>> {
        self.fetch_list().await.map_err(ClientError::into_persistence)
    }

    async fn create(&self, item: NewGalleryItem) -> MemeResult<GalleryItem> {
        self.post_item(&item)
            .await
            .map_err(ClientError::into_persistence)
    }

    async fn delete(&self, id: &str) -> MemeResult<()> {
        self.post_delete(id)
            .await
            .map_err(ClientError::into_persistence)
    }
}
