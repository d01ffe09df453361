//! Asset pipeline errors and their HTTP mapping.
//!
//! No error bodies are produced; status codes carry the whole answer.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

#[derive(Debug, thiserror::Error)]
pub enum AssetError {
    /// Asset serving is disabled (`mode = none`).
    #[error("asset server disabled")]
    Unavailable,

    /// Path has no prefix segment, or the remainder is not a valid asset key.
    #[error("malformed asset path: {0}")]
    MalformedPath(String),

    /// Path does not start with the configured URL prefix.
    #[error("path does not start with /{prefix}/")]
    PrefixMismatch { prefix: String },

    /// No local copy and no provider to ask.
    #[error("asset not found")]
    NotFound,

    /// Provider answered with a non-success status.
    #[error("upstream returned {0}")]
    UpstreamStatus(reqwest::StatusCode),

    /// Provider unreachable or the transfer broke off.
    #[error("upstream request failed: {0}")]
    Upstream(#[from] reqwest::Error),

    /// Staging or reading a file failed.
    #[error("filesystem error: {0}")]
    Io(#[from] std::io::Error),

    /// Client went away mid-transfer.
    #[error("client disconnected")]
    ClientGone,

    /// No upstream headers within the configured timeout.
    #[error("upstream timed out")]
    UpstreamTimeout,
}

impl AssetError {
    pub fn status(&self) -> StatusCode {
        match self {
            AssetError::Unavailable
            | AssetError::MalformedPath(_)
            | AssetError::PrefixMismatch { .. } => StatusCode::BAD_REQUEST,
            AssetError::NotFound
            | AssetError::UpstreamStatus(_)
            | AssetError::Upstream(_)
            | AssetError::Io(_)
            | AssetError::ClientGone
            | AssetError::UpstreamTimeout => StatusCode::NOT_FOUND,
        }
    }
}

impl IntoResponse for AssetError {
    fn into_response(self) -> Response {
        self.status().into_response()
    }
}
