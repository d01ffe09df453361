//! Remote fetch with write-through caching.
//!
//! # Data Flow
//! ```text
//! provider ──chunk──┬──▶ staging file ──(complete)──▶ promote to cache_root/<key>
//!                   └──▶ response body (single-slot channel) ──▶ client
//! ```
//!
//! Both writes of a chunk are joined before the next chunk is read, so a
//! request holds at most one chunk in memory and chunks stay in order.

use std::io;
use std::path::PathBuf;
use std::time::Duration;

use axum::body::{Body, Bytes};
use axum::http::{header, HeaderValue};
use axum::response::Response;
use futures_util::{stream, StreamExt};
use percent_encoding::{utf8_percent_encode, AsciiSet, CONTROLS};
use tokio::sync::mpsc;

use crate::assets::error::AssetError;
use crate::assets::key::AssetKey;
use crate::assets::staging::StagingFile;
use crate::config::{AssetServerConfig, TimeoutConfig};
use crate::observability::metrics;

/// Upper bound on bytes handed to the sinks at once.
pub const CHUNK_SIZE: usize = 4 * 1024;

/// Characters escaped when a key segment is placed in the provider URL.
const SEGMENT: &AsciiSet = &CONTROLS
    .add(b' ')
    .add(b'"')
    .add(b'#')
    .add(b'%')
    .add(b'<')
    .add(b'>')
    .add(b'?')
    .add(b'`')
    .add(b'{')
    .add(b'}');

type BodySender = mpsc::Sender<Result<Bytes, io::Error>>;

#[derive(Debug, Clone)]
pub struct RemoteFetcher {
    client: reqwest::Client,
    provider_url: String,
    /// `None` when caching is off: bodies are piped straight through.
    cache_root: Option<PathBuf>,
    header_timeout: Option<Duration>,
}

impl RemoteFetcher {
    pub fn from_config(
        config: &AssetServerConfig,
        timeouts: &TimeoutConfig,
    ) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder().build()?;

        Ok(Self {
            client,
            provider_url: config.provider_url.clone(),
            cache_root: config.use_cache.then(|| PathBuf::from(&config.cache_root)),
            header_timeout: timeouts.upstream_secs.map(Duration::from_secs),
        })
    }

    /// Provider URL for `key`.
    pub fn upstream_url(&self, key: &AssetKey) -> String {
        let path = key
            .as_str()
            .split('/')
            .map(|segment| utf8_percent_encode(segment, SEGMENT).to_string())
            .collect::<Vec<_>>()
            .join("/");

        if self.provider_url.ends_with('/') {
            format!("{}{}", self.provider_url, path)
        } else {
            format!("{}/{}", self.provider_url, path)
        }
    }

    /// Fetch `key` from the provider and build the client response.
    ///
    /// Errors returned here happen before the response starts. Failures during
    /// the body transfer abort the body stream instead.
    pub async fn fetch(&self, key: &AssetKey) -> Result<Response, AssetError> {
        let url = self.upstream_url(key);
        tracing::debug!(asset_key = %key, url = %url, "Fetching from provider");

        let request = self.client.get(&url).send();
        let mut upstream = match self.header_timeout {
            Some(limit) => tokio::time::timeout(limit, request)
                .await
                .map_err(|_| AssetError::UpstreamTimeout)??,
            None => request.await?,
        };

        let status = upstream.status();
        if !status.is_success() {
            return Err(AssetError::UpstreamStatus(status));
        }

        let content_type = upstream
            .headers()
            .get(header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.split(';').next())
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .and_then(|v| HeaderValue::from_str(v).ok());
        let content_length = upstream.content_length();

        // Nothing has reached the client yet, so a failure here is still a 404.
        let first = upstream.chunk().await?;

        let body = match &self.cache_root {
            None => Body::from_stream(stream::iter(first.map(Ok)).chain(upstream.bytes_stream())),
            Some(root) => {
                let staging = StagingFile::create(&key.under(root)).await?;
                let (tx, rx) = mpsc::channel(1);
                tokio::spawn(tee_into_cache(upstream, first, staging, tx, key.clone()));
                Body::from_stream(stream::unfold(rx, |mut rx| async move {
                    rx.recv().await.map(|item| (item, rx))
                }))
            }
        };

        let mut response = Response::new(body);
        if let Some(content_type) = content_type {
            response.headers_mut().insert(header::CONTENT_TYPE, content_type);
        }
        if let Some(length) = content_length {
            response
                .headers_mut()
                .insert(header::CONTENT_LENGTH, HeaderValue::from(length));
        }
        Ok(response)
    }
}

/// Copy the upstream body, starting with the already-read `first` chunk, into
/// `staging` and `tx` in lockstep, then promote.
async fn tee_into_cache(
    mut upstream: reqwest::Response,
    first: Option<Bytes>,
    mut staging: StagingFile,
    tx: BodySender,
    key: AssetKey,
) {
    let copied = async {
        let mut total = 0u64;
        let mut next = first;
        while let Some(chunk) = next {
            let mut offset = 0;
            while offset < chunk.len() {
                let end = chunk.len().min(offset + CHUNK_SIZE);
                let piece = chunk.slice(offset..end);

                tokio::try_join!(
                    async { staging.write(&piece).await.map_err(AssetError::from) },
                    async {
                        tx.send(Ok(piece.clone()))
                            .await
                            .map_err(|_| AssetError::ClientGone)
                    },
                )?;

                offset = end;
            }
            total += chunk.len() as u64;
            next = upstream.chunk().await?;
        }
        Ok::<u64, AssetError>(total)
    }
    .await;

    match copied {
        Ok(total) => {
            metrics::record_upstream_bytes(total);
            match staging.commit().await {
                Ok(promotion) => {
                    metrics::record_cache_commit(promotion.as_str());
                    tracing::debug!(
                        asset_key = %key,
                        bytes = total,
                        outcome = promotion.as_str(),
                        "Cache entry promoted"
                    );
                }
                Err(e) => {
                    // The client already has every byte; only the cache copy is lost.
                    metrics::record_cache_commit("failed");
                    tracing::warn!(asset_key = %key, error = %e, "Failed to promote cache entry");
                }
            }
        }
        Err(e) => {
            staging.discard().await;
            metrics::record_cache_commit("aborted");
            tracing::warn!(asset_key = %key, error = %e, "Upstream transfer aborted");
            // Terminate the body with an error so the client sees a truncated transfer.
            let _ = tx.send(Err(io::Error::other(e.to_string()))).await;
        }
    }
}
