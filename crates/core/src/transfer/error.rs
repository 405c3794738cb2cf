//! Error types for the transfer layer.

use thiserror::Error;

use super::types::TargetContext;

/// Errors that can occur while producing a transferable handle.
#[derive(Debug, Error)]
pub enum TransferError {
    /// The OS refused to duplicate the handle.
    #[error("Failed to duplicate handle for {target}")]
    DuplicateFailed {
        target: TargetContext,
        #[source]
        source: std::io::Error,
    },
}
