//! Trait definitions for the transfer layer.

use std::fs::File;

use super::error::TransferError;
use super::types::{TargetContext, TransferableHandle};

/// Produces a handle usable by `target` from the controller's open file.
///
/// Called from the provisioner's blocking context, never from the
/// coordinator loop, so implementations may make blocking OS calls.
pub trait HandleTransfer: Send + Sync {
    /// Returns the name of this transfer implementation.
    fn name(&self) -> &str;

    /// Creates a transferable handle for `target`.
    ///
    /// The controller keeps `file`; the returned handle is independent of it.
    fn transfer(
        &self,
        file: &File,
        target: &TargetContext,
    ) -> Result<TransferableHandle, TransferError>;
}
