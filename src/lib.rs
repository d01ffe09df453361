//! Asset delivery gateway for the game client.
//!
//! Serves asset files from local storage, falls back to an upstream provider
//! on a miss while writing the fetched bytes through to a local cache, and
//! answers the handful of stub endpoints the client pings.

pub mod assets;
pub mod cipher;
pub mod config;
pub mod http;
pub mod lifecycle;
pub mod net;
pub mod observability;
pub mod routing;

pub use assets::AssetService;
pub use config::GatewayConfig;
pub use http::HttpServer;
pub use lifecycle::Shutdown;
