//! Forwarding of generation requests to the upstream image service.

use std::time::Duration;

use axum::body::Bytes;
use reqwest::{header, Client, StatusCode};
use url::Url;

/// Upstream request timeout.
pub const UPSTREAM_TIMEOUT: Duration = Duration::from_secs(120);

/// Errors raised while forwarding to the upstream.
#[derive(Debug, thiserror::Error)]
pub enum UpstreamError {
    /// The configured endpoint is not a valid URL.
    #[error("invalid upstream URL: {0}")]
    InvalidUrl(String),
    /// The upstream answered with a non-success status.
    #[error("upstream returned {status}")]
    Status {
        /// Status to relay to the caller.
        status: StatusCode,
        /// Upstream reason phrase or body.
        reason: String,
    },
    /// The upstream could not be reached or timed out.
    #[error("Backend error: {0}")]
    Unreachable(String),
    /// HTTP client construction or body read failed.
    #[error("upstream request failed: {0}")]
    Http(#[from] reqwest::Error),
}

/// HTTP client for the upstream generation endpoint.
#[derive(Debug, Clone)]
pub struct UpstreamClient {
    http: Client,
    endpoint: Url,
}

impl UpstreamClient {
    /// Create a client for `endpoint` with the default timeout.
    ///
    /// # Errors
    ///
    /// Returns [`UpstreamError::InvalidUrl`] if the URL is malformed, or
    /// [`UpstreamError::Http`] if the HTTP client fails to build.
    pub fn new(endpoint: impl AsRef<str>) -> Result<Self, UpstreamError> {
        Self::with_timeout(endpoint, UPSTREAM_TIMEOUT)
    }

    /// Create a client with a custom timeout.
    ///
    /// # Errors
    ///
    /// Same as [`UpstreamClient::new`].
    pub fn with_timeout(endpoint: impl AsRef<str>, timeout: Duration) -> Result<Self, UpstreamError> {
        let endpoint = Url::parse(endpoint.as_ref())
            .map_err(|e| UpstreamError::InvalidUrl(e.to_string()))?;
        let http = Client::builder()
            .user_agent(concat!("ralphgen-server/", env!("CARGO_PKG_VERSION")))
            .timeout(timeout)
            .build()?;
        Ok(Self { http, endpoint })
    }

    /// The configured endpoint.
    #[must_use]
    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    /// Forward a JSON request body verbatim and return the response body.
    ///
    /// # Errors
    ///
    /// Returns [`UpstreamError::Status`] for a non-success upstream status and
    /// [`UpstreamError::Unreachable`] for connection failures and timeouts.
    pub async fn forward(&self, body: Bytes) -> Result<Bytes, UpstreamError> {
        let response = self
            .http
            .post(self.endpoint.clone())
            .header(header::CONTENT_TYPE, "application/json")
            .body(body)
            .send()
            .await
            .map_err(|e| {
                if e.is_connect() || e.is_timeout() || e.is_request() {
                    UpstreamError::Unreachable(e.to_string())
                } else {
                    UpstreamError::Http(e)
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let reason = status
                .canonical_reason()
                .unwrap_or("Upstream error")
                .to_string();
            tracing::warn!(%status, "Upstream generation failed");
            return Err(UpstreamError::Status { status, reason });
        }

        Ok(response.bytes().await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_json, header as header_matcher, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[test]
    fn test_invalid_url() {
        assert!(matches!(
            UpstreamClient::new("not a url"),
            Err(UpstreamError::InvalidUrl(_))
        ));
    }

    #[tokio::test]
    #[cfg_attr(
        target_os = "macos",
        ignore = "wiremock/reqwest system-configuration issue on macOS"
    )]
    async fn test_forward_passes_body_through() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/generate"))
            .and(header_matcher("content-type", "application/json"))
            .and(body_json(serde_json::json!({"prompt": "ralphwiggum waves"})))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(serde_json::json!({"image": "data:image/png;base64,AAAA"})),
            )
            .expect(1)
            .mount(&server)
            .await;

        let client = UpstreamClient::new(format!("{}/generate", server.uri())).expect("client");
        let body = client
            .forward(Bytes::from_static(br#"{"prompt":"ralphwiggum waves"}"#))
            .await
            .expect("forward");
        let json: serde_json::Value = serde_json::from_slice(&body).expect("json");
        assert_eq!(json["image"], "data:image/png;base64,AAAA");
    }

    #[tokio::test]
    #[cfg_attr(
        target_os = "macos",
        ignore = "wiremock/reqwest system-configuration issue on macOS"
    )]
    async fn test_forward_relays_status() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;

        let client = UpstreamClient::new(server.uri()).expect("client");
        let err = client
            .forward(Bytes::from_static(b"{}"))
            .await
            .expect_err("503");
        assert!(matches!(
            err,
            UpstreamError::Status { status, .. } if status == StatusCode::SERVICE_UNAVAILABLE
        ));
    }

    #[tokio::test]
    async fn test_forward_unreachable() {
        let port = portpicker::pick_unused_port().expect("port");
        let client = UpstreamClient::new(format!("http://127.0.0.1:{port}/generate"))
            .expect("client");
        let err = client
            .forward(Bytes::from_static(b"{}"))
            .await
            .expect_err("nothing listening");
        assert!(matches!(err, UpstreamError::Unreachable(_)));
    }
}
