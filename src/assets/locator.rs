//! Local asset lookup.
//!
//! # Lookup Order
//! ```text
//! asset_root/<key>
//!     → cache_root/<key>            (partial mode with cache only)
//!     → tier substitutes of <key>   (if enabled) against the same roots
//!     → absent
//! ```
//!
//! Lookups only stat files: no network I/O, nothing is created.

use std::path::{Path, PathBuf};

use crate::assets::key::AssetKey;
use crate::assets::staging::is_staging_name;
use crate::config::{AssetServerConfig, AssetServerMode};

#[derive(Debug, Clone)]
pub struct LocalAssetLocator {
    asset_root: PathBuf,
    /// Present only when fetched assets are cached and consulted.
    cache_root: Option<PathBuf>,
    substitute_tiers: bool,
}

impl LocalAssetLocator {
    pub fn from_config(config: &AssetServerConfig) -> Self {
        let cache_root = (config.mode == AssetServerMode::Partial && config.use_cache)
            .then(|| PathBuf::from(&config.cache_root));

        Self {
            asset_root: PathBuf::from(&config.asset_root),
            cache_root,
            substitute_tiers: config.substitute_missing_local_assets,
        }
    }

    fn roots_for(&self, key: &AssetKey) -> impl Iterator<Item = &Path> {
        // In-flight downloads in the cache root are never served.
        let cache = self
            .cache_root
            .as_deref()
            .filter(|_| !is_staging_name(key.file_name()));
        std::iter::once(self.asset_root.as_path()).chain(cache)
    }

    /// Find a local file for `key`.
    pub async fn locate(&self, key: &AssetKey) -> Option<PathBuf> {
        if let Some(found) = self.first_existing(key).await {
            return Some(found);
        }

        if self.substitute_tiers {
            for substitute in key.tier_substitutes() {
                if let Some(found) = self.first_existing(&substitute).await {
                    tracing::debug!(
                        asset_key = %key,
                        substitute = %substitute,
                        "Serving other quality tier"
                    );
                    return Some(found);
                }
            }
        }

        None
    }

    async fn first_existing(&self, key: &AssetKey) -> Option<PathBuf> {
        for root in self.roots_for(key) {
            let candidate = key.under(root);
            if is_file(&candidate).await {
                return Some(candidate);
            }
        }
        None
    }
}

async fn is_file(path: &Path) -> bool {
    tokio::fs::metadata(path)
        .await
        .map(|meta| meta.is_file())
        .unwrap_or(false)
}
