//! Trait definitions for worker dispatch.

use async_trait::async_trait;

use crate::job::JobId;
use crate::transfer::{TargetContext, TransferableHandle};

use super::error::{DispatchError, WorkerError};

/// Sends "begin generation" instructions to workers.
///
/// Called from the coordinator loop, so implementations must return
/// promptly and do their work elsewhere.
pub trait WorkerDispatcher: Send + Sync {
    /// Returns the name of this dispatcher implementation.
    fn name(&self) -> &str;

    /// Instructs the worker serving `target` to generate into `handle`.
    ///
    /// Ownership of `handle` passes to the worker. An error means the
    /// instruction could not be delivered at all.
    fn begin_generation(
        &self,
        job_id: JobId,
        target: &TargetContext,
        handle: TransferableHandle,
    ) -> Result<(), DispatchError>;
}

/// Produces the artifact bytes for a target context.
#[async_trait]
pub trait ContentProducer: Send + Sync {
    /// Whether this producer has content for `target`.
    fn serves(&self, target: &TargetContext) -> bool;

    /// Produces the full artifact for `target`.
    async fn produce(&self, target: &TargetContext) -> Result<Vec<u8>, WorkerError>;
}
