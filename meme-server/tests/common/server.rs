//! Test server harness for integration tests.
//!
//! Spins up the real router on a random port, backed by a temporary gallery
//! directory.

use std::net::SocketAddr;
use std::path::Path;

use meme_server::{build_router, AppState, DiskGallery, UpstreamClient};
use tempfile::TempDir;
use tokio::net::TcpListener;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;

/// A test server instance with control handles.
pub struct TestServer {
    addr: SocketAddr,
    gallery_dir: TempDir,
    shutdown_tx: Option<oneshot::Sender<()>>,
    handle: JoinHandle<()>,
}

impl TestServer {
    /// Start a server whose upstream points at a closed port.
    ///
    /// # Panics
    ///
    /// Panics if no port is available or server fails to bind.
    pub async fn start() -> Self {
        let port = portpicker::pick_unused_port().expect("no available port");
        Self::with_upstream(&format!("http://127.0.0.1:{port}/generate")).await
    }

    /// Start a server that forwards generation requests to `endpoint`.
    ///
    /// # Panics
    ///
    /// Panics if no port is available or server fails to bind.
    pub async fn with_upstream(endpoint: &str) -> Self {
        let port = portpicker::pick_unused_port().expect("no available port");
        let addr = SocketAddr::from(([127, 0, 0, 1], port));

        let gallery_dir = TempDir::new().expect("temp dir");
        let gallery = DiskGallery::open(gallery_dir.path()).expect("open gallery");
        let upstream = UpstreamClient::new(endpoint).expect("upstream client");
        let app = build_router(AppState::new(gallery, upstream));

        let listener = TcpListener::bind(addr).await.expect("failed to bind");
        let actual_addr = listener.local_addr().expect("failed to get local addr");

        let (shutdown_tx, shutdown_rx) = oneshot::channel();

        let handle = tokio::spawn(async move {
            axum::serve(listener, app)
                .with_graceful_shutdown(async {
                    let _ = shutdown_rx.await;
                })
                .await
                .expect("server error");
        });

        // Give the server a moment to start
        tokio::time::sleep(tokio::time::Duration::from_millis(10)).await;

        Self {
            addr: actual_addr,
            gallery_dir,
            shutdown_tx: Some(shutdown_tx),
            handle,
        }
    }

    /// Absolute URL for a path on this server.
    pub fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }

    /// The temporary gallery directory.
    #[allow(dead_code)]
    pub fn gallery_dir(&self) -> &Path {
        self.gallery_dir.path()
    }

    /// Gracefully shut down the server.
    pub async fn shutdown(mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
        let _ = tokio::time::timeout(tokio::time::Duration::from_secs(5), self.handle).await;
    }
}
