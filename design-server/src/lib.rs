//! # Design Server Library
//!
//! Save API for product canvas designs. Untrusted editor payloads are
//! normalized by `design-core`, inline images are moved to an asset store,
//! and the result is persisted.
//!
//! This library is used by both the binary and integration tests.

use std::sync::Arc;

use axum::{extract::DefaultBodyLimit, routing::get, Router};

pub mod asset;
pub mod config;
pub mod health;
pub mod metrics;
pub mod payload;
pub mod repository;
pub mod resolver;
pub mod routes;
pub mod sanitizer;
pub mod validation;

pub use asset::{AssetError, AssetStore, DirectoryAssetStore, HttpAssetStore};
pub use config::{AssetBackend, ServerArgs, ServerConfig};
pub use repository::{DesignRecord, DesignRepository, DesignSummary};
pub use resolver::AssetResolver;
pub use sanitizer::{DocumentSanitizer, SaveError, SaveMode, SanitizedDesign};

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    /// Persisted designs.
    pub repository: DesignRepository,
    /// Save-time sanitizer.
    pub sanitizer: DocumentSanitizer,
}

impl AppState {
    /// Build state that stores inline images in `assets`.
    #[must_use]
    pub fn new(repository: DesignRepository, assets: Arc<dyn AssetStore>) -> Self {
        Self {
            repository,
            sanitizer: DocumentSanitizer::new(AssetResolver::new(assets)),
        }
    }
}

/// Construct the configured asset store.
///
/// # Errors
///
/// Returns [`AssetError::InvalidUrl`] if the HTTP endpoint does not parse.
pub fn build_asset_store(backend: &AssetBackend) -> Result<Arc<dyn AssetStore>, AssetError> {
    let store: Arc<dyn AssetStore> = match backend {
        AssetBackend::Http { endpoint } => Arc::new(HttpAssetStore::new(endpoint)?),
        AssetBackend::Directory { dir, base_url } => {
            Arc::new(DirectoryAssetStore::new(dir.clone(), base_url.clone()))
        }
    };
    Ok(store)
}

/// Build the API and health routes.
///
/// The binary layers tracing, CORS and metrics on top of this.
pub fn build_router(state: AppState, max_body_bytes: usize) -> Router {
    Router::new()
        .route(
            "/api/designs",
            get(routes::list_designs).post(routes::create_design),
        )
        .route(
            "/api/designs/{id}",
            get(routes::get_design)
                .put(routes::update_design)
                .delete(routes::delete_design),
        )
        .route("/health/live", get(health::liveness))
        .route("/health/ready", get(health::readiness))
        .route("/health", get(health::readiness))
        .layer(DefaultBodyLimit::max(max_body_bytes))
        .with_state(state)
}
