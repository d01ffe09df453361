//! On-the-fly encryption of locally served assets.
//!
//! Applies only to local hits. Fetched assets are passed through as received,
//! even when their path would match.

use std::path::Path;

use regex::Regex;

use crate::cipher;
use crate::config::AssetServerConfig;

#[derive(Debug, Clone)]
pub struct EncryptionGate {
    pattern: Option<Regex>,
    key: String,
}

impl EncryptionGate {
    /// Compile the configured pattern. An empty pattern disables the gate.
    pub fn from_config(config: &AssetServerConfig) -> Result<Self, regex::Error> {
        let pattern = if config.auto_encrypt_regexp.is_empty() {
            None
        } else {
            Some(Regex::new(&config.auto_encrypt_regexp)?)
        };

        Ok(Self {
            pattern,
            key: config.auto_encrypt_key.clone(),
        })
    }

    /// Whether the resolved local file must be encrypted before sending.
    pub fn applies_to(&self, local_path: &Path) -> bool {
        self.pattern
            .as_ref()
            .is_some_and(|p| p.is_match(&local_path.to_string_lossy()))
    }

    /// Read `local_path` as text and encrypt it.
    pub async fn encrypt_file(&self, local_path: &Path) -> std::io::Result<String> {
        let raw = tokio::fs::read(local_path).await?;
        let decoded = String::from_utf8_lossy(&raw);
        let text = decoded.strip_prefix('\u{feff}').unwrap_or(&decoded);
        Ok(cipher::encrypt(text, &self.key))
    }
}
