//! Error types for the product creation workflow

use artisan_studio_core::{DraftError, StageKind};
use artisan_studio_http::ApiError;
use thiserror::Error;

/// Errors returned by workflow operations
#[derive(Clone, Debug, Error)]
pub enum WorkflowError {
    /// Local validation failed before any network call
    #[error("{0}")]
    Validation(String),

    /// Another stage is in flight
    #[error("Busy: {running} is still running")]
    Busy {
        /// Stage currently running
        running: StageKind,
    },

    /// The session was saved or abandoned
    #[error("Session closed")]
    Closed,

    /// A stage failed without invalidating the session
    #[error("{stage} failed: {reason}")]
    StageDegraded {
        /// Failed stage
        stage: StageKind,
        /// Failure reason
        reason: String,
    },

    /// The stage was cancelled
    #[error("Cancelled")]
    Cancelled,

    /// A backend call failed
    #[error(transparent)]
    Api(#[from] ApiError),
}

impl From<DraftError> for WorkflowError {
    fn from(err: DraftError) -> Self {
        Self::Validation(err.to_string())
    }
}
