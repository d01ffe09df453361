//! Asset serving pipeline.
//!
//! # Data Flow
//! ```text
//! claimed request path
//!     → key.rs (prefix stripping, AssetKey)
//!     → locator.rs (asset root, cache root, tier substitutes)
//!     → hit:  encrypt.rs decides raw stream vs. encrypted text
//!     → miss: fetcher.rs (partial mode) or 404
//! ```
//!
//! # Design Decisions
//! - Configuration is captured once; the service is shared read-only
//! - Status codes are the only error signal; bodies stay empty
//! - Concurrent fetches of one asset are not coalesced; the cache
//!   promotion step tolerates the race

pub mod encrypt;
pub mod error;
pub mod fetcher;
pub mod key;
pub mod locator;
pub mod staging;

use std::path::Path;
use std::time::Instant;

use axum::body::{Body, Bytes};
use axum::http::{header, HeaderValue, Request};
use axum::response::{IntoResponse, Response};
use futures_util::stream;
use tokio::fs::File;
use tokio::io::AsyncReadExt;

use crate::config::{AssetServerConfig, AssetServerMode, GatewayConfig};
use crate::observability::metrics;

pub use encrypt::EncryptionGate;
pub use error::AssetError;
pub use fetcher::RemoteFetcher;
pub use key::{resolve_path, AssetKey, QualityTier};
pub use locator::LocalAssetLocator;
pub use staging::{Promotion, StagingFile};

/// Read size for streaming local files.
const LOCAL_READ_SIZE: usize = 64 * 1024;

/// Error building the asset service from configuration.
#[derive(Debug, thiserror::Error)]
pub enum SetupError {
    #[error("invalid auto_encrypt_regexp: {0}")]
    Pattern(#[from] regex::Error),

    #[error("failed to build upstream client: {0}")]
    Client(#[from] reqwest::Error),
}

/// Where a served asset came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssetSource {
    Local,
    Encrypted,
    Upstream,
}

impl AssetSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            AssetSource::Local => "local",
            AssetSource::Encrypted => "encrypted",
            AssetSource::Upstream => "upstream",
        }
    }
}

/// The asset server: everything behind the port gate.
#[derive(Debug)]
pub struct AssetService {
    config: AssetServerConfig,
    locator: LocalAssetLocator,
    encryption: EncryptionGate,
    /// Only present in partial mode.
    fetcher: Option<RemoteFetcher>,
}

impl AssetService {
    pub fn from_config(config: &GatewayConfig) -> Result<Self, SetupError> {
        let assets = &config.asset_server;
        let fetcher = match assets.mode {
            AssetServerMode::Partial => Some(RemoteFetcher::from_config(assets, &config.timeouts)?),
            AssetServerMode::None | AssetServerMode::Full => None,
        };

        Ok(Self {
            config: assets.clone(),
            locator: LocalAssetLocator::from_config(assets),
            encryption: EncryptionGate::from_config(assets)?,
            fetcher,
        })
    }

    /// Answer a claimed request. Never fails: errors become status codes.
    pub async fn handle(&self, request: Request<Body>) -> Response {
        let start = Instant::now();
        let request_id = request
            .headers()
            .get("x-request-id")
            .and_then(|v| v.to_str().ok())
            .unwrap_or("unknown")
            .to_string();
        let path = request.uri().path().to_string();

        match self.serve(&path).await {
            Ok((source, response)) => {
                tracing::debug!(
                    request_id = %request_id,
                    path = %path,
                    source = source.as_str(),
                    "Serving asset"
                );
                metrics::record_asset_request(source.as_str(), response.status().as_u16(), start);
                response
            }
            Err(e) => {
                let status = e.status();
                match &e {
                    AssetError::Upstream(_) | AssetError::Io(_) | AssetError::UpstreamTimeout => {
                        tracing::warn!(request_id = %request_id, path = %path, error = %e, "Asset request failed")
                    }
                    _ => tracing::debug!(request_id = %request_id, path = %path, error = %e, "Asset request rejected"),
                }
                metrics::record_asset_request("none", status.as_u16(), start);
                e.into_response()
            }
        }
    }

    /// Resolve `path` and produce the asset response.
    pub async fn serve(&self, path: &str) -> Result<(AssetSource, Response), AssetError> {
        let key = resolve_path(&self.config, path)?;

        if let Some(local) = self.locator.locate(&key).await {
            return self.serve_local(&local).await;
        }

        match &self.fetcher {
            Some(fetcher) => Ok((AssetSource::Upstream, fetcher.fetch(&key).await?)),
            None => Err(AssetError::NotFound),
        }
    }

    async fn serve_local(&self, local: &Path) -> Result<(AssetSource, Response), AssetError> {
        let (source, mut response) = if self.encryption.applies_to(local) {
            let encrypted = self.encryption.encrypt_file(local).await?;
            (AssetSource::Encrypted, Response::new(Body::from(encrypted)))
        } else {
            let file = File::open(local).await?;
            let length = file.metadata().await?.len();
            let mut response = Response::new(Body::from_stream(file_chunks(file)));
            response
                .headers_mut()
                .insert(header::CONTENT_LENGTH, HeaderValue::from(length));
            (AssetSource::Local, response)
        };

        response
            .headers_mut()
            .insert(header::CONTENT_TYPE, HeaderValue::from_static("application/octet-stream"));
        Ok((source, response))
    }
}

fn file_chunks(file: File) -> impl futures_util::Stream<Item = std::io::Result<Bytes>> + Send {
    stream::try_unfold(file, |mut file| async move {
        let mut buf = vec![0u8; LOCAL_READ_SIZE];
        let read = file.read(&mut buf).await?;
        if read == 0 {
            return Ok(None);
        }
        buf.truncate(read);
        Ok::<_, std::io::Error>(Some((Bytes::from(buf), file)))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::StatusCode;
    use tempfile::TempDir;

    async fn body_bytes(response: Response) -> Vec<u8> {
        axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap()
            .to_vec()
    }

    fn service(dir: &TempDir, mode: AssetServerMode, tweak: impl FnOnce(&mut AssetServerConfig)) -> AssetService {
        let mut config = GatewayConfig::default();
        config.asset_server.mode = mode;
        config.asset_server.provider_url = "http://127.0.0.1:9/".into();
        config.asset_server.asset_root = dir.path().join("assets").to_string_lossy().into_owned();
        config.asset_server.cache_root = dir.path().join("assets-cache").to_string_lossy().into_owned();
        tweak(&mut config.asset_server);
        AssetService::from_config(&config).unwrap()
    }

    fn write(dir: &TempDir, rel: &str, content: &[u8]) {
        let path = dir.path().join(rel);
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(path, content).unwrap();
    }

    #[tokio::test]
    async fn local_hit_streams_raw_bytes() {
        let dir = TempDir::new().unwrap();
        let content: Vec<u8> = (0..200_000u32).map(|i| (i % 251) as u8).collect();
        write(&dir, "assets/WIN/big.bundle", &content);

        let svc = service(&dir, AssetServerMode::Full, |_| {});
        let (source, response) = svc.serve("/any/WIN/big.bundle").await.unwrap();

        assert_eq!(source, AssetSource::Local);
        assert_eq!(response.headers()[header::CONTENT_TYPE], "application/octet-stream");
        assert_eq!(response.headers()[header::CONTENT_LENGTH], "200000");
        assert_eq!(body_bytes(response).await, content);
    }

    #[tokio::test]
    async fn local_hit_matching_pattern_is_encrypted() {
        let dir = TempDir::new().unwrap();
        write(&dir, "assets/WIN/Main.xml", b"<Main/>");

        let svc = service(&dir, AssetServerMode::Full, |c| {
            c.auto_encrypt_regexp = r"\.xml$".into();
            c.auto_encrypt_key = "k".into();
        });
        let (source, response) = svc.serve("/any/WIN/Main.xml").await.unwrap();

        assert_eq!(source, AssetSource::Encrypted);
        assert_eq!(response.headers()[header::CONTENT_TYPE], "application/octet-stream");
        let body = body_bytes(response).await;
        assert_eq!(body, crate::cipher::encrypt("<Main/>", "k").into_bytes());
        assert_ne!(body, b"<Main/>");
    }

    #[tokio::test]
    async fn full_mode_miss_is_not_found() {
        let dir = TempDir::new().unwrap();
        let svc = service(&dir, AssetServerMode::Full, |_| {});
        let err = svc.serve("/any/WIN/missing.bundle").await.unwrap_err();
        assert!(matches!(err, AssetError::NotFound));
    }

    #[tokio::test]
    async fn disabled_mode_is_bad_request() {
        let dir = TempDir::new().unwrap();
        let svc = service(&dir, AssetServerMode::None, |_| {});
        let response = svc
            .handle(Request::builder().uri("/a/b").body(Body::empty()).unwrap())
            .await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn unreachable_provider_is_not_found() {
        let dir = TempDir::new().unwrap();
        let svc = service(&dir, AssetServerMode::Partial, |_| {});
        let response = svc
            .handle(Request::builder().uri("/p/WIN/a.bundle").body(Body::empty()).unwrap())
            .await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert!(!dir.path().join("assets-cache/WIN").exists());
    }
}
