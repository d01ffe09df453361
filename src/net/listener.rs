//! TCP listener setup.
//!
//! # Responsibilities
//! - Bind every configured address
//! - Fail fast if any address cannot be bound

use std::net::SocketAddr;
use tokio::net::TcpListener;

use crate::config::ListenerConfig;

/// Error type for listener operations.
#[derive(Debug, thiserror::Error)]
pub enum ListenerError {
    /// Address string did not parse.
    #[error("Invalid bind address `{address}`: {source}")]
    Address {
        address: String,
        source: std::net::AddrParseError,
    },
    /// Failed to bind to address.
    #[error("Failed to bind {address}: {source}")]
    Bind {
        address: SocketAddr,
        source: std::io::Error,
    },
}

/// Bind one listener per configured address, in configuration order.
pub async fn bind_all(config: &ListenerConfig) -> Result<Vec<TcpListener>, ListenerError> {
    let mut listeners = Vec::with_capacity(config.bind_addresses.len());

    for address in &config.bind_addresses {
        let addr: SocketAddr = address.parse().map_err(|source| ListenerError::Address {
            address: address.clone(),
            source,
        })?;

        let listener = TcpListener::bind(addr)
            .await
            .map_err(|source| ListenerError::Bind { address: addr, source })?;

        tracing::info!(
            address = %listener.local_addr().unwrap_or(addr),
            "Listener bound"
        );
        listeners.push(listener);
    }

    Ok(listeners)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn binds_every_address() {
        let config = ListenerConfig {
            bind_addresses: vec!["127.0.0.1:0".into(), "127.0.0.1:0".into()],
        };
        let listeners = bind_all(&config).await.unwrap();
        assert_eq!(listeners.len(), 2);
        assert_ne!(
            listeners[0].local_addr().unwrap(),
            listeners[1].local_addr().unwrap()
        );
    }

    #[tokio::test]
    async fn rejects_unparseable_address() {
        let config = ListenerConfig {
            bind_addresses: vec!["localhost".into()],
        };
        let err = bind_all(&config).await.unwrap_err();
        assert!(matches!(err, ListenerError::Address { .. }));
    }
}
