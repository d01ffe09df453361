//! Network layer subsystem.
//!
//! # Data Flow
//! ```text
//! Configured bind addresses
//!     → listener.rs (bind one TcpListener per address)
//!     → connection.rs (capture local/peer address per accepted connection)
//!     → Hand off to HTTP layer (ConnectInfo<ConnectionMeta>)
//! ```
//!
//! # Design Decisions
//! - All listeners share one router; the accepting port decides ownership
//! - A bind failure on any address aborts startup

pub mod connection;
pub mod listener;

pub use connection::{ConnectionId, ConnectionMeta};
pub use listener::{bind_all, ListenerError};
