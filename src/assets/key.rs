//! Request path → asset key.
//!
//! # Responsibilities
//! - Strip the addressing prefix (fixed or any first segment)
//! - Percent-decode and validate the remainder
//! - Produce quality-tier substitutes of a key
//!
//! # Design Decisions
//! - Keys never contain empty, `.` or `..` segments, so joining a key onto a
//!   root can never escape it
//! - Tier markers only match whole directory segments, never the file name

use std::fmt;
use std::path::{Path, PathBuf};

use percent_encoding::percent_decode_str;

use crate::assets::error::AssetError;
use crate::config::{AssetServerConfig, AssetServerMode};

/// Normalized relative path identifying an asset.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct AssetKey(String);

impl AssetKey {
    /// Validate a decoded relative path.
    pub fn parse(raw: &str) -> Result<Self, AssetError> {
        if raw.is_empty() {
            return Err(AssetError::MalformedPath("empty asset key".into()));
        }
        if raw.contains(['\\', '\0']) {
            return Err(AssetError::MalformedPath(format!("illegal character in `{raw}`")));
        }
        if raw
            .split('/')
            .any(|segment| segment.is_empty() || segment == "." || segment == "..")
        {
            return Err(AssetError::MalformedPath(format!("illegal segment in `{raw}`")));
        }
        Ok(Self(raw.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Last segment of the key.
    pub fn file_name(&self) -> &str {
        self.0.rsplit('/').next().unwrap_or(&self.0)
    }

    /// Location of this key under `root`.
    pub fn under(&self, root: &Path) -> PathBuf {
        root.join(&self.0)
    }

    /// Keys with one quality tier swapped for another, in lookup order.
    ///
    /// For every tier present as a directory segment, each other tier is tried
    /// once. Substitutes are never substituted again.
    pub fn tier_substitutes(&self) -> Vec<AssetKey> {
        let segments: Vec<&str> = self.0.split('/').collect();
        let (dirs, file) = segments.split_at(segments.len() - 1);

        let mut substitutes = Vec::new();
        for tier in QualityTier::ALL {
            if !dirs.contains(&tier.as_str()) {
                continue;
            }
            for other in QualityTier::ALL.iter().filter(|t| **t != tier) {
                let mut swapped: Vec<&str> = dirs
                    .iter()
                    .map(|s| if *s == tier.as_str() { other.as_str() } else { *s })
                    .collect();
                swapped.extend_from_slice(file);
                substitutes.push(AssetKey(swapped.join("/")));
            }
        }
        substitutes
    }
}

impl fmt::Display for AssetKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Content fidelity markers that can stand in for one another.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QualityTier {
    High,
    Mid,
    Low,
}

impl QualityTier {
    pub const ALL: [QualityTier; 3] = [QualityTier::High, QualityTier::Mid, QualityTier::Low];

    pub fn as_str(&self) -> &'static str {
        match self {
            QualityTier::High => "High",
            QualityTier::Mid => "Mid",
            QualityTier::Low => "Low",
        }
    }
}

/// Derive the asset key for a request path.
pub fn resolve_path(config: &AssetServerConfig, path: &str) -> Result<AssetKey, AssetError> {
    if config.mode == AssetServerMode::None {
        return Err(AssetError::Unavailable);
    }

    let remainder = if config.use_any_url_prefix {
        match path.get(1..).and_then(|rest| rest.find('/')) {
            Some(slash) => &path[slash + 2..],
            None => return Err(AssetError::MalformedPath(format!("no prefix segment in `{path}`"))),
        }
    } else if config.url_prefix.is_empty() {
        path.strip_prefix('/').unwrap_or(path)
    } else {
        path.strip_prefix('/')
            .and_then(|p| p.strip_prefix(config.url_prefix.as_str()))
            .and_then(|p| p.strip_prefix('/'))
            .ok_or_else(|| AssetError::PrefixMismatch {
                prefix: config.url_prefix.clone(),
            })?
    };

    let decoded = percent_decode_str(remainder)
        .decode_utf8()
        .map_err(|_| AssetError::MalformedPath(format!("`{remainder}` is not UTF-8")))?;

    AssetKey::parse(&decoded)
}
