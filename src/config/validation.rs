//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate value ranges (ports valid, addresses parse)
//! - Check that the asset port is actually served
//! - Compile-check the encryption pattern
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: GatewayConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::net::SocketAddr;

use crate::config::schema::{AssetServerMode, GatewayConfig};

/// A single semantic problem found in a configuration.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("no bind addresses configured")]
    NoBindAddresses,

    #[error("invalid bind address `{0}`")]
    InvalidBindAddress(String),

    #[error("asset server port must be non-zero")]
    ZeroAssetPort,

    #[error("asset server port {0} is not among the bind addresses")]
    AssetPortNotBound(u16),

    #[error("provider_url `{0}` must be an absolute http(s) URL")]
    InvalidProviderUrl(String),

    #[error("auto_encrypt_regexp does not compile: {0}")]
    InvalidEncryptPattern(String),

    #[error("request timeout must be greater than zero")]
    ZeroRequestTimeout,
}

/// Validate a parsed configuration.
pub fn validate_config(config: &GatewayConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();
    let assets = &config.asset_server;

    if config.listener.bind_addresses.is_empty() {
        errors.push(ValidationError::NoBindAddresses);
    }

    let mut bound_ports = Vec::new();
    for address in &config.listener.bind_addresses {
        match address.parse::<SocketAddr>() {
            Ok(addr) => bound_ports.push(addr.port()),
            Err(_) => errors.push(ValidationError::InvalidBindAddress(address.clone())),
        }
    }

    if assets.mode != AssetServerMode::None {
        if assets.port == 0 {
            errors.push(ValidationError::ZeroAssetPort);
        } else if !bound_ports.contains(&assets.port) {
            errors.push(ValidationError::AssetPortNotBound(assets.port));
        }
    }

    if assets.mode == AssetServerMode::Partial {
        let valid = url::Url::parse(&assets.provider_url)
            .map(|u| matches!(u.scheme(), "http" | "https"))
            .unwrap_or(false);
        if !valid {
            errors.push(ValidationError::InvalidProviderUrl(assets.provider_url.clone()));
        }
    }

    if !assets.auto_encrypt_regexp.is_empty() {
        if let Err(e) = regex::Regex::new(&assets.auto_encrypt_regexp) {
            errors.push(ValidationError::InvalidEncryptPattern(e.to_string()));
        }
    }

    if config.timeouts.request_secs == 0 {
        errors.push(ValidationError::ZeroRequestTimeout);
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
