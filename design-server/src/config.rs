//! Command-line and environment configuration.

use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::path::PathBuf;

use clap::Parser;

/// Default port for the design server.
pub const DEFAULT_PORT: u16 = 9480;

/// Default request body limit (20 MiB). Inline images make save payloads large.
pub const DEFAULT_MAX_BODY_BYTES: usize = 20 * 1024 * 1024;

/// Command-line arguments for design-server.
#[derive(Debug, Clone, Parser)]
#[command(name = "design-server")]
#[command(about = "Product canvas design save server")]
#[command(version)]
pub struct ServerArgs {
    /// Listen port
    #[arg(long, env = "DESIGN_PORT", default_value_t = DEFAULT_PORT)]
    pub port: u16,

    /// Listen address
    #[arg(long, env = "DESIGN_BIND", default_value_t = IpAddr::V4(Ipv4Addr::LOCALHOST))]
    pub bind: IpAddr,

    /// Directory for persisted designs (in-memory only if absent)
    #[arg(long, env = "DESIGN_DATA_DIR")]
    pub data_dir: Option<PathBuf>,

    /// HTTP asset store upload URL (e.g., <https://assets.example.com/upload>)
    #[arg(long, env = "DESIGN_ASSET_ENDPOINT")]
    pub asset_endpoint: Option<String>,

    /// Local directory asset store, used when no endpoint is configured
    #[arg(long, env = "DESIGN_ASSET_DIR", default_value = "./assets")]
    pub asset_dir: PathBuf,

    /// URL prefix for assets written to the local directory
    #[arg(long, env = "DESIGN_ASSET_BASE_URL", default_value = "/assets")]
    pub asset_base_url: String,

    /// Request body limit in bytes
    #[arg(long, env = "DESIGN_MAX_BODY_BYTES", default_value_t = DEFAULT_MAX_BODY_BYTES)]
    pub max_body_bytes: usize,
}

/// Where uploaded assets go.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AssetBackend {
    /// Remote HTTP asset store.
    Http {
        /// Upload endpoint.
        endpoint: String,
    },
    /// Local directory, served under `base_url`.
    Directory {
        /// Target directory.
        dir: PathBuf,
        /// Public URL prefix.
        base_url: String,
    },
}

/// Resolved server configuration.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Socket to listen on.
    pub addr: SocketAddr,
    /// Persistence directory.
    pub data_dir: Option<PathBuf>,
    /// Asset store selection.
    pub assets: AssetBackend,
    /// Request body limit in bytes.
    pub max_body_bytes: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            addr: SocketAddr::from(([127, 0, 0, 1], DEFAULT_PORT)),
            data_dir: None,
            assets: AssetBackend::Directory {
                dir: PathBuf::from("./assets"),
                base_url: "/assets".to_string(),
            },
            max_body_bytes: DEFAULT_MAX_BODY_BYTES,
        }
    }
}

impl From<ServerArgs> for ServerConfig {
    fn from(args: ServerArgs) -> Self {
        let assets = match args.asset_endpoint.filter(|e| !e.trim().is_empty()) {
            Some(endpoint) => AssetBackend::Http { endpoint },
            None => AssetBackend::Directory {
                dir: args.asset_dir,
                base_url: args.asset_base_url,
            },
        };
        Self {
            addr: SocketAddr::new(args.bind, args.port),
            data_dir: args.data_dir,
            assets,
            max_body_bytes: args.max_body_bytes,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let args = ServerArgs::try_parse_from(["design-server"]).expect("parse");
        let config = ServerConfig::from(args);
        assert_eq!(config.addr, SocketAddr::from(([127, 0, 0, 1], 9480)));
        assert_eq!(config.max_body_bytes, 20 * 1024 * 1024);
        assert!(config.data_dir.is_none());
        assert_eq!(
            config.assets,
            AssetBackend::Directory {
                dir: PathBuf::from("./assets"),
                base_url: "/assets".into(),
            }
        );
    }

    #[test]
    fn test_endpoint_selects_http_store() {
        let args = ServerArgs::try_parse_from([
            "design-server",
            "--port",
            "8000",
            "--asset-endpoint",
            "https://assets.example.com/upload",
        ])
        .expect("parse");
        let config = ServerConfig::from(args);
        assert_eq!(config.addr.port(), 8000);
        assert_eq!(
            config.assets,
            AssetBackend::Http {
                endpoint: "https://assets.example.com/upload".into()
            }
        );
    }

    #[test]
    fn test_blank_endpoint_falls_back_to_directory() {
        let args = ServerArgs::try_parse_from(["design-server", "--asset-endpoint", "  "])
            .expect("parse");
        assert!(matches!(
            ServerConfig::from(args).assets,
            AssetBackend::Directory { .. }
        ));
    }
}
