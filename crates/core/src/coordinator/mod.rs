//! Generation coordinator.
//!
//! Accepts generation requests, has the provisioner create the output file,
//! hands the worker its handle, and reconciles the worker's completion
//! signal back to the caller's callback:
//! - **Start**: id minted and job registered before any asynchronous step
//! - **Created**: dispatch to the worker, or fail without dispatch
//! - **Completed**: close the controller handle, then fire the callback

mod config;
mod handle;
mod runner;
mod types;

pub use config::CoordinatorConfig;
pub use handle::{command_channel, CommandReceiver, CoordinatorHandle};
pub use runner::{create_coordinator, GenerationCoordinator};
pub use types::{CoordinatorError, CoordinatorStatus};
