//! Error types for the client application.

use thiserror::Error;
use tms_remote::RemoteError;

/// Application-level failures; all of them abort startup.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error(transparent)]
    Remote(#[from] RemoteError),
}

/// Result type alias for application operations.
pub type AppResult<T> = std::result::Result<T, AppError>;
