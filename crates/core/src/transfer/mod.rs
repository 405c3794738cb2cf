//! Handle transfer layer.
//!
//! The controller opens the output file and keeps one handle for itself.
//! The worker lives in another execution context and needs its own handle
//! to the same open file. This module defines both handle types and the
//! `HandleTransfer` trait that turns the controller's open file into a
//! handle usable by a given target context.
//!
//! The coordinator never looks inside a handle. Handles are either backed by
//! an OS file or by an opaque token (used by in-memory provisioners).

mod duplicate;
mod error;
mod traits;
mod types;

pub use duplicate::DuplicateTransfer;
pub use error::TransferError;
pub use traits::HandleTransfer;
pub use types::{ControllerHandle, TargetContext, TransferableHandle};
