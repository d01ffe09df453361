//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the gateway.
//! All types derive Serde traits for deserialization from config files.

use serde::{Deserialize, Serialize};

/// Root configuration for the asset gateway.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct GatewayConfig {
    /// Listener configuration (bind addresses).
    pub listener: ListenerConfig,

    /// Asset server settings.
    pub asset_server: AssetServerConfig,

    /// Timeout configuration.
    pub timeouts: TimeoutConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind addresses (e.g., "0.0.0.0:5000"). One listener per entry.
    pub bind_addresses: Vec<String>,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_addresses: vec!["0.0.0.0:5000".to_string(), "0.0.0.0:5001".to_string()],
        }
    }
}

/// How the asset server answers requests on its port.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum AssetServerMode {
    /// Serving disabled; every request is rejected.
    #[default]
    #[serde(alias = "None")]
    None,
    /// Local assets only.
    #[serde(alias = "Full")]
    Full,
    /// Local assets, falling back to the provider.
    #[serde(alias = "Partial")]
    Partial,
}

/// Asset server configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct AssetServerConfig {
    /// Serving mode.
    pub mode: AssetServerMode,

    /// Local port whose connections belong to the asset server.
    pub port: u16,

    /// Fixed first path segment, used when `use_any_url_prefix` is off.
    pub url_prefix: String,

    /// Treat any first path segment as an ignored prefix.
    pub use_any_url_prefix: bool,

    /// Persist fetched assets under `cache_root`.
    pub use_cache: bool,

    /// Upstream provider base URL (e.g., "https://media.example.com/").
    pub provider_url: String,

    /// Try other quality tiers (High/Mid/Low) when an asset is missing.
    pub substitute_missing_local_assets: bool,

    /// Pattern matched against the resolved local path; empty disables encryption.
    pub auto_encrypt_regexp: String,

    /// Key handed to the cipher for matched assets.
    pub auto_encrypt_key: String,

    /// Primary asset directory.
    pub asset_root: String,

    /// Directory holding fetched assets.
    pub cache_root: String,
}

impl Default for AssetServerConfig {
    fn default() -> Self {
        Self {
            mode: AssetServerMode::None,
            port: 5001,
            url_prefix: String::new(),
            use_any_url_prefix: true,
            use_cache: true,
            provider_url: String::new(),
            substitute_missing_local_assets: false,
            auto_encrypt_regexp: String::new(),
            auto_encrypt_key: String::new(),
            asset_root: "assets".to_string(),
            cache_root: "assets-cache".to_string(),
        }
    }
}

/// Timeout configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TimeoutConfig {
    /// Request timeout for non-asset routes in seconds.
    pub request_secs: u64,

    /// Upper bound on waiting for upstream response headers, in seconds.
    /// Unset means no timeout.
    pub upstream_secs: Option<u64>,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            request_secs: 30,
            upstream_secs: None,
        }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error) when RUST_LOG is unset.
    pub log_level: String,

    /// Emit JSON log lines instead of the human-readable format.
    pub json_logs: bool,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            json_logs: false,
            metrics_enabled: false,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}
