//! Client configuration: command-line arguments and runtime config discovery.

use std::path::PathBuf;
use std::time::Duration;

use clap::{Parser, Subcommand};
use serde::Deserialize;
use url::Url;

/// Generation endpoint used when the server's runtime config is unavailable.
pub const DEFAULT_Z_IMAGE_ENDPOINT: &str = "http://localhost:8000/generate";

/// Default ralphgen-server base URL.
pub const DEFAULT_SERVER_URL: &str = "http://127.0.0.1:8080";

const CONFIG_TIMEOUT: Duration = Duration::from_secs(5);

/// Command-line arguments for ralphgen.
#[derive(Debug, Clone, Parser)]
#[command(name = "ralphgen")]
#[command(about = "Generate Ralph Wiggum memes, caption them and browse the gallery")]
#[command(version)]
pub struct CliArgs {
    /// ralphgen-server base URL (gallery and runtime config)
    #[arg(long, env = "RALPHGEN_SERVER", default_value = DEFAULT_SERVER_URL)]
    pub server: String,

    /// Image generation endpoint; overrides the server's runtime config
    #[arg(long, env = "Z_IMAGE_ENDPOINT")]
    pub endpoint: Option<String>,

    /// What to do
    #[command(subcommand)]
    pub action: Action,
}

/// Client subcommands.
#[derive(Debug, Clone, Subcommand)]
pub enum Action {
    /// Generate an image, caption it, export a PNG and save it to the gallery
    Generate {
        /// Prompt text ("ralph" and "wiggum" are rewritten to the trigger word)
        prompt: String,

        /// Caption line; repeat for top, bottom and extra captions
        #[arg(long = "caption", short = 'c')]
        captions: Vec<String>,

        /// Caption font
        #[arg(long, default_value = "Impact")]
        font: String,

        /// Directory the PNG is written to
        #[arg(long, default_value = ".")]
        out_dir: PathBuf,

        /// Fixed generation seed
        #[arg(long)]
        seed: Option<u64>,
    },
    /// Browse or manage saved memes
    Gallery {
        /// Gallery operation
        #[command(subcommand)]
        command: GalleryAction,
    },
    /// Print the resolved generation endpoint
    Config,
}

/// Gallery subcommands.
#[derive(Debug, Clone, Subcommand)]
pub enum GalleryAction {
    /// List saved memes with their scatter placement
    List,
    /// Delete a saved meme
    Delete {
        /// Gallery item ID
        id: String,
    },
}

/// Resolved client configuration.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// ralphgen-server base URL.
    pub server: String,
    /// Explicit generation endpoint, if given.
    pub endpoint: Option<String>,
}

impl ClientConfig {
    /// Create a config pointing at `server`.
    #[must_use]
    pub fn new(server: impl Into<String>) -> Self {
        Self {
            server: server.into(),
            endpoint: None,
        }
    }

    /// The generation endpoint: the explicit one, else the server's runtime
    /// config, else [`DEFAULT_Z_IMAGE_ENDPOINT`].
    pub async fn resolve_endpoint(&self) -> String {
        match &self.endpoint {
            Some(endpoint) => endpoint.clone(),
            None => fetch_runtime_config(&self.server).await,
        }
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self::new(DEFAULT_SERVER_URL)
    }
}

impl From<&CliArgs> for ClientConfig {
    fn from(args: &CliArgs) -> Self {
        Self {
            server: args.server.clone(),
            endpoint: args.endpoint.clone(),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RuntimeConfig {
    z_image_endpoint: Option<String>,
}

/// Fetch `GET /api/config` once.
///
/// Any failure falls back to [`DEFAULT_Z_IMAGE_ENDPOINT`] silently (logged at
/// debug level only).
pub async fn fetch_runtime_config(server: &str) -> String {
    match try_fetch_runtime_config(server).await {
        Ok(Some(endpoint)) => endpoint,
        Ok(None) => DEFAULT_Z_IMAGE_ENDPOINT.to_string(),
        Err(e) => {
            tracing::debug!(error = %e, "Runtime config unavailable, using default endpoint");
            DEFAULT_Z_IMAGE_ENDPOINT.to_string()
        }
    }
}

async fn try_fetch_runtime_config(server: &str) -> anyhow::Result<Option<String>> {
    let url = Url::parse(server)?.join("/api/config")?;
    let client = reqwest::Client::builder().timeout(CONFIG_TIMEOUT).build()?;
    let config: RuntimeConfig = client
        .get(url)
        .send()
        .await?
        .error_for_status()?
        .json()
        .await?;
    Ok(config.z_image_endpoint.filter(|e| !e.is_empty()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[test]
    fn test_parse_generate() {
        let args = CliArgs::try_parse_from([
            "ralphgen",
            "generate",
            "ralph in space",
            "-c",
            "TOP",
            "--caption",
            "BOTTOM",
        ])
        .expect("parse");
        match args.action {
            Action::Generate {
                prompt, captions, font, ..
            } => {
                assert_eq!(prompt, "ralph in space");
                assert_eq!(captions, ["TOP", "BOTTOM"]);
                assert_eq!(font, "Impact");
            }
            other => panic!("unexpected action: {other:?}"),
        }
    }

    #[test]
    fn test_explicit_endpoint_wins() {
        let args = CliArgs::try_parse_from([
            "ralphgen",
            "--endpoint",
            "http://gpu:8000/generate",
            "config",
        ])
        .expect("parse");
        let config = ClientConfig::from(&args);
        assert_eq!(config.endpoint.as_deref(), Some("http://gpu:8000/generate"));
    }

    #[tokio::test]
    #[cfg_attr(
        target_os = "macos",
        ignore = "wiremock/reqwest system-configuration issue on macOS"
    )]
    async fn test_runtime_config_fetched() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/config"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(serde_json::json!({"zImageEndpoint": "http://gpu:8000/generate"})),
            )
            .mount(&server)
            .await;

        assert_eq!(
            fetch_runtime_config(&server.uri()).await,
            "http://gpu:8000/generate"
        );
    }

    #[tokio::test]
    #[cfg_attr(
        target_os = "macos",
        ignore = "wiremock/reqwest system-configuration issue on macOS"
    )]
    async fn test_runtime_config_falls_back() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;
        assert_eq!(
            fetch_runtime_config(&server.uri()).await,
            DEFAULT_Z_IMAGE_ENDPOINT
        );

        assert_eq!(
            fetch_runtime_config("not a url").await,
            DEFAULT_Z_IMAGE_ENDPOINT
        );
    }
}
