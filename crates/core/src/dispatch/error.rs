//! Error types for worker dispatch.

use thiserror::Error;

use crate::transfer::TargetContext;

/// Errors that can occur when handing a job to a worker.
#[derive(Debug, Error)]
pub enum DispatchError {
    /// No worker is serving the target context.
    #[error("Target unreachable: {0}")]
    Unreachable(TargetContext),

    /// The worker cannot use this kind of handle.
    #[error("Unsupported handle for target {0}")]
    UnsupportedHandle(TargetContext),
}

/// Errors raised on the worker side while producing content.
#[derive(Debug, Error)]
pub enum WorkerError {
    /// The producer has nothing for this target.
    #[error("No content for target {0}")]
    NoContent(TargetContext),

    /// Writing into the transferred handle failed.
    #[error("Failed to write artifact: {0}")]
    Write(#[from] std::io::Error),

    /// The blocking write task did not complete.
    #[error("Write task failed: {0}")]
    TaskFailed(String),
}

impl From<tokio::task::JoinError> for WorkerError {
    fn from(e: tokio::task::JoinError) -> Self {
        Self::TaskFailed(e.to_string())
    }
}
