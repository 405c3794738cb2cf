//! Trait definitions for the provisioner module.

use std::path::Path;

use async_trait::async_trait;

use crate::transfer::{ControllerHandle, TargetContext, TransferableHandle};

use super::error::ProvisionError;

/// Result of a successful file creation: one handle per side.
#[derive(Debug)]
pub struct ProvisionedFile {
    /// Stays with the job until the controller-side close.
    pub controller: ControllerHandle,
    /// Goes to the worker named by the target context.
    pub worker: TransferableHandle,
}

/// Creates and closes output files without blocking the caller.
#[async_trait]
pub trait FileProvisioner: Send + Sync {
    /// Returns the name of this provisioner implementation.
    fn name(&self) -> &str;

    /// Creates the file at `path` and produces a handle for `target`.
    ///
    /// Overwrite semantics for existing files are up to the implementation.
    async fn create_file(
        &self,
        path: &Path,
        target: &TargetContext,
    ) -> Result<ProvisionedFile, ProvisionError>;

    /// Closes the controller's handle.
    async fn close_file(&self, handle: ControllerHandle) -> Result<(), ProvisionError>;
}
