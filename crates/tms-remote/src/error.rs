//! Remote call failures and their structured metadata.
//!
//! Rejected calls carry server-supplied metadata: an exception class, an
//! error code, and descriptions of up to ten child exceptions. The code is
//! what startup classification keys on; everything else is for logs.

use thiserror::Error;
use tracing::{error, warn};

/// The service only sends details for this many child exceptions.
pub const MAX_CHILD_EXCEPTION_DETAILS: usize = 10;

/// Error codes the client recognizes.
pub mod error_codes {
    /// Portfolio creation rejected because the portfolio already exists.
    pub const CANNOT_CREATE_PORTFOLIO: &str = "CannotCreatePortfolio";
}

/// Server-supplied failure metadata.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ErrorDetails {
    /// Remote exception class name, when reported.
    pub exception_class: Option<String>,
    /// Remote error code, when reported.
    pub error_code: Option<String>,
    /// Child exception descriptions, at most
    /// [`MAX_CHILD_EXCEPTION_DETAILS`] entries.
    pub child_messages: Vec<String>,
}

impl ErrorDetails {
    /// Details carrying only an error code.
    #[must_use]
    pub fn with_code(code: impl Into<String>) -> Self {
        Self {
            error_code: Some(code.into()),
            ..Self::default()
        }
    }
}

/// Failures surfaced by the remote service boundary.
#[derive(Debug, Clone, Error)]
pub enum RemoteError {
    /// A unary call was rejected by the service.
    #[error("Remote call rejected: {message}")]
    Rejected {
        message: String,
        details: ErrorDetails,
    },

    /// An event stream terminated abnormally.
    #[error("Event stream failed: {0}")]
    Stream(String),

    /// Push on a request channel that was already closed.
    #[error("Request channel is closed")]
    RequestChannelClosed,

    /// Transport-level failure.
    #[error("Transport failure: {0}")]
    Transport(String),
}

impl RemoteError {
    /// A rejection with an error code and message.
    #[must_use]
    pub fn rejected(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Rejected {
            message: message.into(),
            details: ErrorDetails::with_code(code),
        }
    }

    /// Server-supplied error code, when present.
    #[must_use]
    pub fn error_code(&self) -> Option<&str> {
        match self {
            Self::Rejected { details, .. } => details.error_code.as_deref(),
            _ => None,
        }
    }

    /// Server-supplied failure metadata, when present.
    #[must_use]
    pub fn details(&self) -> Option<&ErrorDetails> {
        match self {
            Self::Rejected { details, .. } => Some(details),
            _ => None,
        }
    }
}

/// Result type alias for remote operations.
pub type RemoteResult<T> = std::result::Result<T, RemoteError>;

/// Log a failed remote interaction, rendering any server metadata.
///
/// Child exception details beyond [`MAX_CHILD_EXCEPTION_DETAILS`] are not
/// sent remotely, so at most that many are printed.
pub fn log_remote_failure(context: &str, err: &RemoteError) {
    error!(context, error = %err, "Remote interaction failed");
    if let Some(details) = err.details() {
        warn!(
            context,
            exception_class = details.exception_class.as_deref().unwrap_or("unknown"),
            error_code = details.error_code.as_deref().unwrap_or("unknown"),
            "Remote exception details"
        );
        for (idx, message) in details
            .child_messages
            .iter()
            .take(MAX_CHILD_EXCEPTION_DETAILS)
            .enumerate()
        {
            warn!(context, child = idx, %message, "Remote child exception");
        }
    }
}
