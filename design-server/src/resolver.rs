//! Inline image resolution.
//!
//! [`AssetResolver`] turns a data URI into a stored-asset URL with two tries:
//!
//! 1. hand the data URI to the store as-is;
//! 2. if that fails, decode it into a scoped temp file and upload the file.
//!
//! The temp file is a [`tempfile::NamedTempFile`] and is removed when it drops,
//! whichever way the upload goes. Resolution never errors; `None` means no
//! asset was produced and the caller decides what that costs.

use std::path::PathBuf;
use std::sync::Arc;

use crate::asset::{decode_data_uri, AssetError, AssetSource, AssetStore, AssetUrl};
use crate::metrics;
use crate::repository::current_timestamp_ms;

/// Two-tier data URI uploader.
#[derive(Clone)]
pub struct AssetResolver {
    store: Arc<dyn AssetStore>,
    temp_dir: Option<PathBuf>,
}

impl AssetResolver {
    /// Resolve through `store`, staging fallback files in the system temp dir.
    #[must_use]
    pub fn new(store: Arc<dyn AssetStore>) -> Self {
        Self {
            store,
            temp_dir: None,
        }
    }

    /// Stage fallback files in `dir` instead of the system temp dir.
    #[must_use]
    pub fn with_temp_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.temp_dir = Some(dir.into());
        self
    }

    /// Upload `data_uri` and return its durable URL, or `None` if both
    /// paths failed.
    #[tracing::instrument(name = "resolve_asset", skip_all, fields(len = data_uri.len()))]
    pub async fn resolve(&self, data_uri: &str) -> Option<AssetUrl> {
        match self
            .store
            .upload(AssetSource::DataUri(data_uri.to_string()))
            .await
        {
            Ok(url) => {
                metrics::record_asset_upload("primary", true);
                return Some(url);
            }
            Err(err) => {
                metrics::record_asset_upload("primary", false);
                tracing::warn!("Direct data URI upload failed, retrying from file: {err}");
            }
        }

        match self.upload_via_temp_file(data_uri).await {
            Ok(url) => {
                metrics::record_asset_upload("fallback", true);
                Some(url)
            }
            Err(err) => {
                metrics::record_asset_upload("fallback", false);
                tracing::warn!("File upload fallback failed, no asset produced: {err}");
                None
            }
        }
    }

    async fn upload_via_temp_file(&self, data_uri: &str) -> Result<AssetUrl, AssetError> {
        let (bytes, ext) = decode_data_uri(data_uri)?;

        let prefix = format!("design-asset-{}-", current_timestamp_ms());
        let suffix = format!(".{ext}");
        let mut builder = tempfile::Builder::new();
        builder.prefix(&prefix).suffix(&suffix);
        let temp = match &self.temp_dir {
            Some(dir) => builder.tempfile_in(dir)?,
            None => builder.tempfile()?,
        };

        tokio::fs::write(temp.path(), &bytes).await?;
        let result = self
            .store
            .upload(AssetSource::File(temp.path().to_path_buf()))
            .await;

        if let Err(err) = temp.close() {
            tracing::warn!("Failed to remove temporary asset file: {err}");
        }
        result
    }
}
