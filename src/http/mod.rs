//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection (ConnectionMeta)
//!     → server.rs (Axum setup, request ID, tracing)
//!     → asset gate: claimed → assets pipeline
//!                   otherwise → common.rs (analytics, ping)
//!     → Send to client
//! ```

pub mod common;
pub mod request;
pub mod server;

pub use request::{MakeRequestUuidV4, X_REQUEST_ID};
pub use server::HttpServer;
