//! Test server harness for integration tests.
//!
//! Spins up the real design API on a random port, backed by a temp data
//! directory and an asset store chosen by the test.

use std::net::SocketAddr;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use design_server::asset::{AssetError, AssetSource, AssetStore, AssetUrl};
use design_server::config::DEFAULT_MAX_BODY_BYTES;
use design_server::{build_router, AppState, DesignRepository, DirectoryAssetStore};
use tempfile::TempDir;
use tokio::net::TcpListener;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;

/// Asset store that rejects every upload.
#[derive(Debug, Default)]
pub struct FailingStore {
    attempts: AtomicUsize,
}

impl FailingStore {
    /// Number of uploads attempted so far.
    #[allow(dead_code)]
    pub fn attempts(&self) -> usize {
        self.attempts.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl AssetStore for FailingStore {
    async fn upload(&self, _source: AssetSource) -> Result<AssetUrl, AssetError> {
        self.attempts.fetch_add(1, Ordering::SeqCst);
        Err(AssetError::Rejected(503))
    }
}

/// A test server instance with control handles.
pub struct TestServer {
    addr: SocketAddr,
    repository: DesignRepository,
    data_dir: TempDir,
    asset_dir: TempDir,
    shutdown_tx: Option<oneshot::Sender<()>>,
    handle: JoinHandle<()>,
}

impl TestServer {
    /// Start a server that stores assets in a temp directory.
    ///
    /// # Panics
    ///
    /// Panics if no port is available or server fails to bind.
    pub async fn start() -> Self {
        let asset_dir = TempDir::new().expect("asset tempdir");
        let store = DirectoryAssetStore::new(asset_dir.path(), "https://cdn.test/assets");
        Self::start_inner(Arc::new(store), asset_dir, None).await
    }

    /// Start a server with a custom asset store.
    #[allow(dead_code)]
    pub async fn start_with_assets(assets: Arc<dyn AssetStore>) -> Self {
        let asset_dir = TempDir::new().expect("asset tempdir");
        Self::start_inner(assets, asset_dir, None).await
    }

    /// Start a server over an existing data directory (simulates a restart).
    #[allow(dead_code)]
    pub async fn restart(self) -> Self {
        let Self {
            data_dir,
            asset_dir,
            shutdown_tx,
            handle,
            ..
        } = self;
        if let Some(tx) = shutdown_tx {
            let _ = tx.send(());
        }
        let _ = tokio::time::timeout(tokio::time::Duration::from_secs(5), handle).await;

        let store = DirectoryAssetStore::new(asset_dir.path(), "https://cdn.test/assets");
        Self::start_inner(Arc::new(store), asset_dir, Some(data_dir)).await
    }

    async fn start_inner(
        assets: Arc<dyn AssetStore>,
        asset_dir: TempDir,
        data_dir: Option<TempDir>,
    ) -> Self {
        let port = portpicker::pick_unused_port().expect("no available port");
        let addr = SocketAddr::from(([127, 0, 0, 1], port));

        let data_dir = match data_dir {
            Some(dir) => dir,
            None => TempDir::new().expect("data tempdir"),
        };
        let repository = DesignRepository::with_data_dir(data_dir.path()).expect("repository");
        let state = AppState::new(repository.clone(), assets);
        let app = build_router(state, DEFAULT_MAX_BODY_BYTES);

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
            repository,
            data_dir,
            asset_dir,
            shutdown_tx: Some(shutdown_tx),
            handle,
        }
    }

    /// Get the server's socket address.
    #[allow(dead_code)]
    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    /// Absolute URL for `path`.
    pub fn url(&self, path: &str) -> String {
        format!("http://{}{path}", self.addr)
    }

    /// URL of the design collection.
    pub fn designs_url(&self) -> String {
        self.url("/api/designs")
    }

    /// URL of one design.
    pub fn design_url(&self, id: &str) -> String {
        self.url(&format!("/api/designs/{id}"))
    }

    /// Repository behind the server (for test assertions).
    #[allow(dead_code)]
    pub fn repository(&self) -> &DesignRepository {
        &self.repository
    }

    /// Directory that persisted designs land in.
    #[allow(dead_code)]
    pub fn data_dir(&self) -> &Path {
        self.data_dir.path()
    }

    /// Directory that the default asset store writes to.
    #[allow(dead_code)]
    pub fn asset_dir(&self) -> &Path {
        self.asset_dir.path()
    }

    /// Gracefully shut down the server.
    #[allow(dead_code)]
    pub async fn shutdown(mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
        let _ = tokio::time::timeout(tokio::time::Duration::from_secs(5), self.handle).await;
    }
}
