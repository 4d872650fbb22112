//! Error types for the sync service

use hyper::StatusCode;

/// Main error type for ingestion, sync and HTTP operations
#[derive(Debug, thiserror::Error)]
pub enum SyncError {
    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Decode error: {0}")]
    Decode(String),

    #[error("Workbook error: {0}")]
    Workbook(String),

    #[error("Remote fetch error: {0}")]
    Remote(String),

    #[error("Watcher error: {0}")]
    Watch(String),

    #[error("I/O error: {0}")]
    Io(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl SyncError {
    /// Convert error to HTTP status code
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Remote(_) => StatusCode::SERVICE_UNAVAILABLE,
            Self::Decode(_) | Self::Workbook(_) => StatusCode::UNPROCESSABLE_ENTITY,
            Self::Watch(_) | Self::Io(_) | Self::Config(_) | Self::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl From<std::io::Error> for SyncError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err.to_string())
    }
}

impl From<serde_json::Error> for SyncError {
    fn from(err: serde_json::Error) -> Self {
        Self::Decode(format!("JSON error: {}", err))
    }
}

impl From<hyper::Error> for SyncError {
    fn from(err: hyper::Error) -> Self {
        Self::Internal(format!("HTTP error: {}", err))
    }
}

impl From<calamine::Error> for SyncError {
    fn from(err: calamine::Error) -> Self {
        Self::Workbook(err.to_string())
    }
}

impl From<reqwest::Error> for SyncError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::Remote(format!("timed out: {}", err))
        } else {
            Self::Remote(err.to_string())
        }
    }
}

impl From<notify::Error> for SyncError {
    fn from(err: notify::Error) -> Self {
        Self::Watch(err.to_string())
    }
}

impl From<tokio::task::JoinError> for SyncError {
    fn from(err: tokio::task::JoinError) -> Self {
        Self::Internal(format!("blocking task failed: {}", err))
    }
}

/// Result type alias for sync operations
pub type Result<T> = std::result::Result<T, SyncError>;
