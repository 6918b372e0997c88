//! Error types for tms-engine.

use thiserror::Error;
use tms_core::{OrderId, TargetId};
use tms_remote::RemoteError;

/// Failures surfaced while handling subscription events.
///
/// These never escape a consumer loop; they are logged at the point of
/// occurrence and consumption continues.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("Unknown target {0}")]
    UnknownTarget(TargetId),

    #[error("Unknown order {0}")]
    UnknownOrder(OrderId),

    #[error("Event is missing required field {0}")]
    MissingField(&'static str),

    #[error(transparent)]
    Remote(#[from] RemoteError),
}

/// Result type alias for engine operations.
pub type Result<T> = std::result::Result<T, EngineError>;
