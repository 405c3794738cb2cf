//! Job identity and record types.

use std::fmt;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::time::Instant;

use crate::transfer::{ControllerHandle, TargetContext, TransferableHandle};

/// Size reported to a callback when the job failed.
pub const GENERATION_FAILED: i64 = -1;

/// Correlation key for every asynchronous reply about a job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct JobId(u64);

impl JobId {
    pub fn new(raw: u64) -> Self {
        Self(raw)
    }

    pub fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Invoked exactly once with `(output_path, size_in_bytes)`.
///
/// A size of [`GENERATION_FAILED`] signals failure.
pub type GenerateCallback = Box<dyn FnOnce(&Path, i64) + Send + 'static>;

/// Where a job is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobPhase {
    /// Waiting for the provisioner to create the output file.
    Creating,
    /// Dispatched to the worker, waiting for its completion signal.
    Generating,
    /// Waiting for the controller handle to be closed.
    Closing,
}

impl JobPhase {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Creating => "creating",
            Self::Generating => "generating",
            Self::Closing => "closing",
        }
    }
}

/// Why a job concluded. Used for logs and metrics only; the callback only
/// ever sees the size.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobOutcome {
    Success,
    ProvisionFailed,
    GenerationFailed,
    DispatchFailed,
    WorkerGone,
    TimedOut,
    Shutdown,
}

impl JobOutcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Success => "success",
            Self::ProvisionFailed => "provision_failed",
            Self::GenerationFailed => "generation_failed",
            Self::DispatchFailed => "dispatch_failed",
            Self::WorkerGone => "worker_gone",
            Self::TimedOut => "timed_out",
            Self::Shutdown => "shutdown",
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success)
    }
}

/// One in-flight generation request.
pub struct Job {
    pub id: JobId,
    pub output_path: PathBuf,
    pub target: TargetContext,
    pub phase: JobPhase,
    /// Open between successful creation and the controller-side close.
    pub controller_handle: Option<ControllerHandle>,
    /// Held only between creation and dispatch.
    pub worker_handle: Option<TransferableHandle>,
    /// Set when the target context went away while the file was being created.
    pub target_gone: bool,
    pub created_at: DateTime<Utc>,
    pub dispatched_at: Option<Instant>,
    callback: GenerateCallback,
}

impl Job {
    pub fn new(
        id: JobId,
        output_path: PathBuf,
        target: TargetContext,
        callback: GenerateCallback,
    ) -> Self {
        Self {
            id,
            output_path,
            target,
            phase: JobPhase::Creating,
            controller_handle: None,
            worker_handle: None,
            target_gone: false,
            created_at: Utc::now(),
            dispatched_at: None,
            callback,
        }
    }

    /// Consumes the job and fires its callback.
    pub fn complete(self, size: i64) {
        (self.callback)(&self.output_path, size);
    }
}

impl fmt::Debug for Job {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Job")
            .field("id", &self.id)
            .field("output_path", &self.output_path)
            .field("target", &self.target)
            .field("phase", &self.phase)
            .field("controller_handle", &self.controller_handle.is_some())
            .field("worker_handle", &self.worker_handle.is_some())
            .field("target_gone", &self.target_gone)
            .field("created_at", &self.created_at)
            .finish_non_exhaustive()
    }
}
