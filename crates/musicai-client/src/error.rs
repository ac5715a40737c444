//! Client error types.

use std::path::{Path, PathBuf};
use std::time::Duration;

use thiserror::Error;

/// Result type for client operations.
pub type ClientResult<T> = Result<T, ClientError>;

/// Errors that can occur while talking to the API or handling results locally.
#[derive(Debug, Error)]
pub enum ClientError {
    /// Non-2xx response from the API or a signed storage URL.
    #[error("HTTP {status} from {url}: {body}")]
    Http {
        status: u16,
        url: String,
        body: String,
    },

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Operation not allowed for the job's current status.
    #[error("Invalid job state: {0}")]
    InvalidState(String),

    #[error("IO error at {}: {source}", path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Timed out after {0:?}")]
    Timeout(Duration),

    #[error("Wait cancelled")]
    Cancelled,
}

impl ClientError {
    pub fn from_http_status(status: u16, url: impl Into<String>, body: impl Into<String>) -> Self {
        Self::Http {
            status,
            url: url.into(),
            body: body.into(),
        }
    }

    pub fn io(path: impl AsRef<Path>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.as_ref().to_path_buf(),
            source,
        }
    }

    pub fn invalid_state(msg: impl Into<String>) -> Self {
        Self::InvalidState(msg.into())
    }

    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// HTTP-level or network-level failure.
    pub fn is_transport(&self) -> bool {
        matches!(self, ClientError::Http { .. } | ClientError::Network(_))
    }

    /// Local filesystem failure.
    pub fn is_local_io(&self) -> bool {
        matches!(self, ClientError::Io { .. })
    }

    pub fn is_invalid_state(&self) -> bool {
        matches!(self, ClientError::InvalidState(_))
    }

    /// The resource does not exist (404/410).
    pub fn is_not_found(&self) -> bool {
        matches!(self.status(), Some(404) | Some(410))
    }

    /// HTTP status code, when the failure carried one.
    pub fn status(&self) -> Option<u16> {
        match self {
            ClientError::Http { status, .. } => Some(*status),
            ClientError::Network(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }
}
