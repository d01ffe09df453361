//! Routing subsystem.
//!
//! # Data Flow
//! ```text
//! Incoming Request (+ ConnectionMeta)
//!     → gate.rs (does an interceptor claim this connection?)
//!     → claimed: asset pipeline
//!     → otherwise: application routes (analytics, ping)
//! ```
//!
//! # Design Decisions
//! - Gates built at startup, immutable at runtime
//! - Ownership decided by connection metadata, never by path

pub mod gate;

pub use gate::{Gate, PortGate};
