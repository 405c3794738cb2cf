//! Types for the generation coordinator.

use std::path::PathBuf;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::sync::oneshot;

use crate::job::{GenerateCallback, JobId, JobOutcome, PhaseCounts};
use crate::provisioner::{ProvisionError, ProvisionedFile};
use crate::transfer::TargetContext;

/// Errors surfaced by `CoordinatorHandle` queries.
///
/// Generation results never use this type; they only reach the callback.
#[derive(Debug, Error)]
pub enum CoordinatorError {
    /// The coordinator loop is no longer running.
    #[error("coordinator stopped")]
    Stopped,
}

/// Snapshot of the coordinator's state.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CoordinatorStatus {
    /// Whether new jobs are accepted.
    pub accepting: bool,
    /// Jobs currently in the registry.
    pub live_jobs: usize,
    /// Live jobs broken down by phase.
    pub phases: PhaseCounts,
    /// Creation time of the oldest live job.
    pub oldest_job_created_at: Option<DateTime<Utc>>,
    pub total_started: u64,
    pub total_succeeded: u64,
    pub total_failed: u64,
    /// Completion signals for unknown or already finishing jobs.
    pub stray_signals: u64,
}

pub(crate) struct StartRequest {
    pub id: JobId,
    pub target: TargetContext,
    pub output_path: PathBuf,
    pub callback: GenerateCallback,
}

/// Messages from handles to the coordinator loop.
pub(crate) enum Command {
    Start(StartRequest),
    GenerationComplete { id: JobId, size: i64 },
    ContextTornDown(TargetContext),
    Status(oneshot::Sender<CoordinatorStatus>),
    Shutdown,
}

/// Results of file operations, posted back onto the coordinator loop.
pub(crate) enum Reply {
    FileCreated {
        id: JobId,
        result: Result<ProvisionedFile, ProvisionError>,
    },
    FileClosed {
        id: JobId,
        size: i64,
        outcome: JobOutcome,
        result: Result<(), ProvisionError>,
    },
}
