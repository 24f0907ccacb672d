//! Server configuration.

use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::path::PathBuf;

use clap::Parser;

/// Default listening port.
pub const DEFAULT_PORT: u16 = 8080;

/// Default upstream image generation endpoint.
pub const DEFAULT_Z_IMAGE_ENDPOINT: &str = "http://localhost:8000/generate";

/// Command-line arguments for ralphgen-server.
#[derive(Debug, Clone, Parser)]
#[command(name = "ralphgen-server")]
#[command(about = "RalphGen gallery, config and generate-proxy service")]
#[command(version)]
pub struct CliArgs {
    /// Port to listen on
    #[arg(long, env = "PORT", default_value_t = DEFAULT_PORT)]
    pub port: u16,

    /// Address to bind (localhost by default)
    #[arg(long, env = "RALPHGEN_HOST", default_value_t = IpAddr::V4(Ipv4Addr::LOCALHOST))]
    pub host: IpAddr,

    /// Upstream image generation endpoint
    #[arg(long, env = "Z_IMAGE_ENDPOINT", default_value = DEFAULT_Z_IMAGE_ENDPOINT)]
    pub z_image_endpoint: String,

    /// Directory holding gallery images and index.json
    #[arg(long, env = "GALLERY_DIR", default_value = "gallery")]
    pub gallery_dir: PathBuf,

    /// Directory of static front-end files served at `/`
    #[arg(long, env = "RALPHGEN_WEB_DIR")]
    pub web_dir: Option<PathBuf>,
}

/// Resolved server configuration.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Socket address to bind.
    pub addr: SocketAddr,
    /// Upstream image generation endpoint.
    pub z_image_endpoint: String,
    /// Gallery directory.
    pub gallery_dir: PathBuf,
    /// Optional static file directory.
    pub web_dir: Option<PathBuf>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            addr: SocketAddr::from(([127, 0, 0, 1], DEFAULT_PORT)),
            z_image_endpoint: DEFAULT_Z_IMAGE_ENDPOINT.to_string(),
            gallery_dir: PathBuf::from("gallery"),
            web_dir: None,
        }
    }
}

impl From<CliArgs> for ServerConfig {
    fn from(args: CliArgs) -> Self {
        Self {
            addr: SocketAddr::new(args.host, args.port),
            z_image_endpoint: args.z_image_endpoint,
            gallery_dir: args.gallery_dir,
            web_dir: args.web_dir,
        }
    }
}
