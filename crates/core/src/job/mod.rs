//! Job records and the registry that owns them.

mod registry;
mod types;

pub use registry::{JobRegistry, PhaseCounts, RegistryError};
pub use types::{GenerateCallback, Job, JobId, JobOutcome, JobPhase, GENERATION_FAILED};
