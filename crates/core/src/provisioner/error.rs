//! Error types for the provisioner module.

use std::path::PathBuf;
use thiserror::Error;

use crate::transfer::TransferError;

/// Errors that can occur while creating or closing an output file.
#[derive(Debug, Error)]
pub enum ProvisionError {
    /// The output file could not be created.
    #[error("Failed to create file: {path}")]
    CreateFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A parent directory could not be created.
    #[error("Failed to create directory: {path}")]
    DirectoryCreationFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The file was created but no handle could be produced for the worker.
    #[error("Failed to transfer handle for {path}")]
    TransferFailed {
        path: PathBuf,
        #[source]
        source: TransferError,
    },

    /// Flushing or closing the controller handle failed.
    #[error("Failed to close file: {path}")]
    CloseFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The blocking task running the file operation did not complete.
    #[error("File task failed: {0}")]
    TaskFailed(String),
}

impl From<tokio::task::JoinError> for ProvisionError {
    fn from(e: tokio::task::JoinError) -> Self {
        Self::TaskFailed(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = ProvisionError::CreateFailed {
            path: PathBuf::from("/bad/path"),
            source: std::io::Error::new(std::io::ErrorKind::NotFound, "missing"),
        };
        assert_eq!(err.to_string(), "Failed to create file: /bad/path");

        let err = ProvisionError::TaskFailed("cancelled".to_string());
        assert_eq!(err.to_string(), "File task failed: cancelled");
    }
}
