//! External asset stores.
//!
//! An [`AssetStore`] turns image bytes into a durable URL. Two
//! implementations ship here: [`HttpAssetStore`] talks to a remote upload
//! endpoint, [`DirectoryAssetStore`] writes into a local directory for
//! development.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use base64::Engine;
use design_core::DataUri;
use reqwest::{header::CONTENT_TYPE, Client};
use serde::Deserialize;
use serde_json::json;
use thiserror::Error;
use url::Url;

/// Durable reference returned by an asset store.
pub type AssetUrl = String;

/// Header carrying the original file name on file uploads.
pub const FILE_NAME_HEADER: &str = "X-File-Name";

/// What to upload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AssetSource {
    /// An inline `data:<mime>;base64,<payload>` string.
    DataUri(String),
    /// A file on local disk.
    File(PathBuf),
}

/// Errors that can occur when uploading an asset.
#[derive(Debug, Error)]
pub enum AssetError {
    /// The configured endpoint is not a valid URL.
    #[error("invalid asset store URL: {0}")]
    InvalidUrl(String),
    /// The input was not a data URI.
    #[error("input is not a base64 data URI")]
    InvalidDataUri,
    /// The base64 payload did not decode.
    #[error("failed to decode base64 payload: {0}")]
    Decode(#[from] base64::DecodeError),
    /// HTTP layer failed (connection, timeout, etc.).
    #[error("asset store HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),
    /// The store answered with a non-success status.
    #[error("asset store rejected upload with status {0}")]
    Rejected(u16),
    /// The store's response carried no usable URL.
    #[error("asset store response did not contain a url")]
    MissingUrl,
    /// Reading or writing a local file failed.
    #[error("asset I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// An external binary store.
#[async_trait]
pub trait AssetStore: Send + Sync {
    /// Store `source` and return its durable URL.
    async fn upload(&self, source: AssetSource) -> Result<AssetUrl, AssetError>;
}

/// Decode a data URI into its bytes and file extension.
///
/// # Errors
///
/// Returns [`AssetError::InvalidDataUri`] if `uri` does not match the
/// data-URI grammar and [`AssetError::Decode`] if the payload is not base64.
pub fn decode_data_uri(uri: &str) -> Result<(Vec<u8>, &'static str), AssetError> {
    let parsed = DataUri::parse(uri).ok_or(AssetError::InvalidDataUri)?;
    let bytes = base64::engine::general_purpose::STANDARD.decode(parsed.payload)?;
    Ok((bytes, parsed.extension()))
}

/// MIME type for an asset file, from its extension.
#[must_use]
pub fn content_type_for(path: &Path) -> &'static str {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase);
    match ext.as_deref() {
        Some("png") => "image/png",
        Some("jpg" | "jpeg") => "image/jpeg",
        Some("gif") => "image/gif",
        Some("webp") => "image/webp",
        Some("svg") => "image/svg+xml",
        _ => "application/octet-stream",
    }
}

// ---------------------------------------------------------------------------
// HTTP store
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct UploadResponse {
    secure_url: Option<String>,
    url: Option<String>,
}

/// Asset store backed by a remote HTTP upload endpoint.
///
/// Data URIs are sent as `{"file": "<uri>"}`; files are sent as the raw body
/// with their content type and an `X-File-Name` header. The response must be
/// JSON with a `secure_url` or `url` field.
#[derive(Clone)]
pub struct HttpAssetStore {
    inner: Arc<InnerStore>,
}

struct InnerStore {
    http: Client,
    endpoint: Url,
}

impl HttpAssetStore {
    /// Create a store that uploads to `endpoint`.
    ///
    /// # Errors
    ///
    /// Returns [`AssetError::InvalidUrl`] if the URL is malformed.
    /// Returns [`AssetError::Http`] if the HTTP client fails to build.
    pub fn new(endpoint: impl AsRef<str>) -> Result<Self, AssetError> {
        let endpoint =
            Url::parse(endpoint.as_ref()).map_err(|e| AssetError::InvalidUrl(e.to_string()))?;
        let http = Client::builder()
            .user_agent(concat!("design-server/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self {
            inner: Arc::new(InnerStore { http, endpoint }),
        })
    }
}

#[async_trait]
impl AssetStore for HttpAssetStore {
    async fn upload(&self, source: AssetSource) -> Result<AssetUrl, AssetError> {
        let request = self.inner.http.post(self.inner.endpoint.clone());
        let request = match source {
            AssetSource::DataUri(uri) => request.json(&json!({ "file": uri })),
            AssetSource::File(path) => {
                let bytes = tokio::fs::read(&path).await?;
                let file_name = path
                    .file_name()
                    .and_then(|n| n.to_str())
                    .unwrap_or("upload")
                    .to_string();
                request
                    .header(CONTENT_TYPE, content_type_for(&path))
                    .header(FILE_NAME_HEADER, file_name)
                    .body(bytes)
            }
        };

        let response = request.send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(AssetError::Rejected(status.as_u16()));
        }
        let body: UploadResponse = response.json().await?;
        let non_blank =
            |url: &Option<String>| url.as_deref().is_some_and(|u| !u.trim().is_empty());
        [body.secure_url, body.url]
            .into_iter()
            .find(non_blank)
            .flatten()
            .ok_or(AssetError::MissingUrl)
    }
}

// ---------------------------------------------------------------------------
// Directory store
// ---------------------------------------------------------------------------

/// Asset store that writes into a local directory.
#[derive(Debug, Clone)]
pub struct DirectoryAssetStore {
    dir: PathBuf,
    base_url: String,
}

impl DirectoryAssetStore {
    /// Store files in `dir`, addressed as `<base_url>/<file>`.
    #[must_use]
    pub fn new(dir: impl Into<PathBuf>, base_url: impl Into<String>) -> Self {
        Self {
            dir: dir.into(),
            base_url: base_url.into(),
        }
    }
}

#[async_trait]
impl AssetStore for DirectoryAssetStore {
    async fn upload(&self, source: AssetSource) -> Result<AssetUrl, AssetError> {
        let (bytes, ext) = match source {
            AssetSource::DataUri(uri) => decode_data_uri(&uri)?,
            AssetSource::File(path) => {
                let ext = match content_type_for(&path) {
                    "image/png" => "png",
                    "image/jpeg" => "jpg",
                    "image/gif" => "gif",
                    "image/webp" => "webp",
                    "image/svg+xml" => "svg",
                    _ => "bin",
                };
                (tokio::fs::read(&path).await?, ext)
            }
        };

        tokio::fs::create_dir_all(&self.dir).await?;
        let file_name = format!("{}.{ext}", uuid::Uuid::new_v4().simple());
        tokio::fs::write(self.dir.join(&file_name), bytes).await?;
        tracing::debug!("Stored asset {file_name} in {}", self.dir.display());

        Ok(format!("{}/{file_name}", self.base_url.trim_end_matches('/')))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const PIXEL: &str = "data:image/png;base64,iVBORw0KGgoAAAANSUhEUgAAAAEAAAABCAYAAAAfFcSJAAAADUlEQVR42mP8z8DwHwAFBQIAX8jx0gAAAABJRU5ErkJggg==";

    #[test]
    fn test_decode_data_uri() {
        let (bytes, ext) = decode_data_uri(PIXEL).expect("decode");
        assert_eq!(ext, "png");
        assert_eq!(&bytes[1..4], b"PNG");
        assert!(matches!(
            decode_data_uri("https://example.com/a.png"),
            Err(AssetError::InvalidDataUri)
        ));
    }

    #[test]
    fn test_content_type_for() {
        assert_eq!(content_type_for(Path::new("a.PNG")), "image/png");
        assert_eq!(content_type_for(Path::new("a.jpeg")), "image/jpeg");
        assert_eq!(content_type_for(Path::new("a.svg")), "image/svg+xml");
        assert_eq!(content_type_for(Path::new("noext")), "application/octet-stream");
    }

    #[test]
    fn test_invalid_url_error() {
        let result = HttpAssetStore::new("not a url");
        assert!(matches!(result, Err(AssetError::InvalidUrl(_))));
    }

    #[tokio::test]
    async fn test_directory_store_writes_file() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = DirectoryAssetStore::new(dir.path().join("assets"), "/assets/");
        let url = store
            .upload(AssetSource::DataUri(PIXEL.to_string()))
            .await
            .expect("upload");

        assert!(url.starts_with("/assets/"));
        assert!(url.ends_with(".png"));
        let name = url.trim_start_matches("/assets/");
        assert!(dir.path().join("assets").join(name).exists());
    }

    #[tokio::test]
    async fn test_directory_store_rejects_plain_urls() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = DirectoryAssetStore::new(dir.path(), "/assets");
        let result = store
            .upload(AssetSource::DataUri("https://example.com/x.png".into()))
            .await;
        assert!(matches!(result, Err(AssetError::InvalidDataUri)));
    }

    #[tokio::test]
    #[cfg_attr(
        target_os = "macos",
        ignore = "wiremock/reqwest system-configuration issue on macOS"
    )]
    async fn http_store_uploads_data_uri_as_json() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/upload"))
            .and(body_json(json!({ "file": PIXEL })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "secure_url": "https://cdn.example.com/a.png",
                "url": "http://cdn.example.com/a.png"
            })))
            .mount(&server)
            .await;

        let store = HttpAssetStore::new(format!("{}/upload", server.uri())).expect("store");
        let url = store
            .upload(AssetSource::DataUri(PIXEL.to_string()))
            .await
            .expect("upload");
        assert_eq!(url, "https://cdn.example.com/a.png");
    }

    #[tokio::test]
    #[cfg_attr(
        target_os = "macos",
        ignore = "wiremock/reqwest system-configuration issue on macOS"
    )]
    async fn http_store_uploads_file_with_headers() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/upload"))
            .and(header("content-type", "image/png"))
            .and(header("x-file-name", "logo.png"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({ "url": "https://cdn.example.com/logo.png" })),
            )
            .mount(&server)
            .await;

        let dir = tempfile::tempdir().expect("tempdir");
        let file = dir.path().join("logo.png");
        std::fs::write(&file, b"png-bytes").expect("write");

        let store = HttpAssetStore::new(format!("{}/upload", server.uri())).expect("store");
        let url = store.upload(AssetSource::File(file)).await.expect("upload");
        assert_eq!(url, "https://cdn.example.com/logo.png");
    }

    #[tokio::test]
    #[cfg_attr(
        target_os = "macos",
        ignore = "wiremock/reqwest system-configuration issue on macOS"
    )]
    async fn http_store_surfaces_rejection() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(413))
            .mount(&server)
            .await;

        let store = HttpAssetStore::new(server.uri()).expect("store");
        let result = store.upload(AssetSource::DataUri(PIXEL.to_string())).await;
        assert!(matches!(result, Err(AssetError::Rejected(413))));
    }

    #[tokio::test]
    #[cfg_attr(
        target_os = "macos",
        ignore = "wiremock/reqwest system-configuration issue on macOS"
    )]
    async fn http_store_requires_url_in_response() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "ok": true })))
            .mount(&server)
            .await;

        let store = HttpAssetStore::new(server.uri()).expect("store");
        let result = store.upload(AssetSource::DataUri(PIXEL.to_string())).await;
        assert!(matches!(result, Err(AssetError::MissingUrl)));
    }

    #[tokio::test]
    #[cfg_attr(
        target_os = "macos",
        ignore = "wiremock/reqwest system-configuration issue on macOS"
    )]
    async fn http_store_skips_blank_secure_url() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "secure_url": "",
                "url": "http://cdn.example.com/a.png"
            })))
            .mount(&server)
            .await;

        let store = HttpAssetStore::new(server.uri()).expect("store");
        let url = store
            .upload(AssetSource::DataUri(PIXEL.to_string()))
            .await
            .expect("plain url is used");
        assert_eq!(url, "http://cdn.example.com/a.png");
    }
}
