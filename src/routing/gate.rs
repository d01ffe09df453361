//! Interceptor gates.
//!
//! # Responsibilities
//! - Decide, from connection metadata alone, whether a request is claimed
//!   by an interceptor or delegated to the next handler
//! - Compose with the middleware chain: a declining gate hands the request on
//!
//! # Design Decisions
//! - Gates are pure predicates: no side effects, no state
//! - Unknown local address never matches

use crate::net::ConnectionMeta;

/// Trait for claiming connections.
pub trait Gate: Send + Sync + std::fmt::Debug {
    /// Returns true if requests on this connection belong to the interceptor.
    fn claims(&self, conn: &ConnectionMeta) -> bool;
}

/// Claims connections accepted on one local port.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PortGate {
    port: u16,
}

impl PortGate {
    pub fn new(port: u16) -> Self {
        Self { port }
    }
}

impl Gate for PortGate {
    fn claims(&self, conn: &ConnectionMeta) -> bool {
        conn.local_port() == Some(self.port)
    }
}
