//! Testing utilities and mock implementations.
//!
//! This module provides mock implementations of the coordinator's
//! collaborator traits, so the job lifecycle can be exercised without real
//! files or workers.
//!
//! # Example
//!
//! ```rust,ignore
//! use handoff_core::testing::{fixtures, MockDispatcher, MockProvisioner};
//!
//! let provisioner = MockProvisioner::new();
//! let dispatcher = MockDispatcher::new();
//!
//! let (handle, coordinator) = create_coordinator(
//!     fixtures::coordinator_config(),
//!     Arc::new(provisioner.clone()),
//!     Arc::new(dispatcher.clone()),
//! );
//! tokio::spawn(coordinator.run());
//! ```

mod mock_dispatcher;
mod mock_provisioner;

pub use mock_dispatcher::{MockDispatcher, RecordedDispatch};
pub use mock_provisioner::{MockProvisioner, ProvisionerCall};

use std::sync::{Mutex, MutexGuard, PoisonError};

/// Locks mock state, recovering it if a panicking test poisoned the lock.
fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Test fixtures and helper functions.
pub mod fixtures {
    use crate::coordinator::CoordinatorConfig;
    use crate::transfer::TargetContext;

    /// Process id used for fixture targets.
    pub const WORKER_PROCESS: u32 = 4242;

    /// A target context in the fixture worker process.
    pub fn target(session_id: u32) -> TargetContext {
        TargetContext::new(WORKER_PROCESS, session_id)
    }

    /// Coordinator config with a small command buffer and no timeout.
    pub fn coordinator_config() -> CoordinatorConfig {
        CoordinatorConfig {
            command_buffer: 32,
            ..CoordinatorConfig::default()
        }
    }
}
