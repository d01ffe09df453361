//! Per-connection metadata captured at accept time.
//!
//! # Responsibilities
//! - Record the local and peer socket addresses of each connection
//! - Generate unique connection IDs for tracing
//! - Expose both to handlers through axum's `ConnectInfo`

use std::net::SocketAddr;
use std::sync::atomic::{AtomicU64, Ordering};

use axum::extract::connect_info::Connected;
use axum::serve::IncomingStream;
use tokio::net::TcpListener;

/// Global atomic counter for connection IDs.
/// Using relaxed ordering is sufficient since we only need uniqueness, not synchronization.
static CONNECTION_ID_COUNTER: AtomicU64 = AtomicU64::new(1);

/// Unique identifier for a connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ConnectionId(u64);

impl ConnectionId {
    /// Generate a new unique connection ID.
    pub fn new() -> Self {
        Self(CONNECTION_ID_COUNTER.fetch_add(1, Ordering::Relaxed))
    }
}

impl Default for ConnectionId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "conn-{}", self.0)
    }
}

/// Addresses of an accepted connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConnectionMeta {
    pub id: ConnectionId,
    /// Address the connection was accepted on. `None` if the OS refused to report it.
    pub local_addr: Option<SocketAddr>,
    pub remote_addr: SocketAddr,
}

impl ConnectionMeta {
    pub fn new(local_addr: Option<SocketAddr>, remote_addr: SocketAddr) -> Self {
        Self {
            id: ConnectionId::new(),
            local_addr,
            remote_addr,
        }
    }

    /// Port the connection was accepted on.
    pub fn local_port(&self) -> Option<u16> {
        self.local_addr.map(|addr| addr.port())
    }
}

impl Connected<IncomingStream<'_, TcpListener>> for ConnectionMeta {
    fn connect_info(stream: IncomingStream<'_, TcpListener>) -> Self {
        let local_addr = stream.io().local_addr().ok();
        let meta = Self::new(local_addr, *stream.remote_addr());
        tracing::trace!(
            connection_id = %meta.id,
            remote_addr = %meta.remote_addr,
            local_addr = ?meta.local_addr,
            "Connection accepted"
        );
        meta
    }
}
