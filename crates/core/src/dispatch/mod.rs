//! Worker dispatch.
//!
//! The coordinator tells a worker to begin generation through a
//! `WorkerDispatcher`. The call is fire-and-forget: the worker answers later
//! through `CoordinatorHandle::generation_complete`, with the job id it was
//! given here.
//!
//! `LocalWorker` is an in-process worker that writes the bytes of a
//! `ContentProducer` into the transferred handle.

mod config;
mod error;
mod local;
mod traits;

pub use config::WorkerConfig;
pub use error::{DispatchError, WorkerError};
pub use local::{LocalWorker, StaticContent};
pub use traits::{ContentProducer, WorkerDispatcher};
