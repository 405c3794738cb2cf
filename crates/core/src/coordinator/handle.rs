use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use tokio::sync::{mpsc, oneshot};
use tracing::{error, warn};

use crate::job::{JobId, GENERATION_FAILED};
use crate::transfer::TargetContext;

use super::types::{Command, CoordinatorError, CoordinatorStatus, StartRequest};

/// Receiving end of the coordinator's command channel.
///
/// Passed to `GenerationCoordinator::new`.
pub struct CommandReceiver {
    pub(crate) rx: mpsc::Receiver<Command>,
}

/// Handle for talking to the coordinator loop.
///
/// Cheaply cloneable. All clones share one id counter, so ids are unique for
/// the whole process no matter which clone minted them.
#[derive(Clone)]
pub struct CoordinatorHandle {
    tx: mpsc::Sender<Command>,
    next_id: Arc<AtomicU64>,
}

/// Create the command channel between handles and the coordinator loop.
///
/// Use this directly when a collaborator (such as a worker) needs a handle
/// before the coordinator itself can be built. A `buffer_size` of 0 is
/// treated as 1.
pub fn command_channel(buffer_size: usize) -> (CoordinatorHandle, CommandReceiver) {
    let (tx, rx) = mpsc::channel(buffer_size.max(1));
    let handle = CoordinatorHandle {
        tx,
        next_id: Arc::new(AtomicU64::new(1)),
    };
    (handle, CommandReceiver { rx })
}

impl CoordinatorHandle {
    /// Start generating an artifact for `target` into `output_path`.
    ///
    /// Returns the job id immediately. The outcome is only ever reported
    /// through `callback`, which fires exactly once. If the coordinator has
    /// stopped, it fires right away with a failure.
    pub async fn start<F>(
        &self,
        target: TargetContext,
        output_path: impl Into<PathBuf>,
        callback: F,
    ) -> JobId
    where
        F: FnOnce(&Path, i64) + Send + 'static,
    {
        let id = JobId::new(self.next_id.fetch_add(1, Ordering::Relaxed));
        let request = StartRequest {
            id,
            target,
            output_path: output_path.into(),
            callback: Box::new(callback),
        };

        if let Err(mpsc::error::SendError(command)) = self.tx.send(Command::Start(request)).await
        {
            if let Command::Start(request) = command {
                warn!(job_id = %id, "Coordinator stopped, failing job");
                (request.callback)(&request.output_path, GENERATION_FAILED);
            }
        }

        id
    }

    /// Report that the worker finished job `id`.
    ///
    /// `size` is the artifact size in bytes, or -1 if generation failed.
    /// Signals for unknown jobs are ignored by the coordinator.
    pub async fn generation_complete(&self, id: JobId, size: i64) {
        if let Err(e) = self
            .tx
            .send(Command::GenerationComplete { id, size })
            .await
        {
            error!(job_id = %id, "Failed to report generation result: {}", e);
        }
    }

    /// Report a completion without waiting for channel capacity.
    ///
    /// Returns true if the signal was queued.
    pub fn try_generation_complete(&self, id: JobId, size: i64) -> bool {
        match self.tx.try_send(Command::GenerationComplete { id, size }) {
            Ok(()) => true,
            Err(e) => {
                error!(job_id = %id, "Failed to report generation result: {}", e);
                false
            }
        }
    }

    /// Tell the coordinator that `target` is gone.
    ///
    /// Every live job addressed to it fails.
    pub async fn context_torn_down(&self, target: TargetContext) {
        if let Err(e) = self.tx.send(Command::ContextTornDown(target)).await {
            error!(%target, "Failed to report context teardown: {}", e);
        }
    }

    /// Fetch a status snapshot.
    pub async fn status(&self) -> Result<CoordinatorStatus, CoordinatorError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.tx
            .send(Command::Status(reply_tx))
            .await
            .map_err(|_| CoordinatorError::Stopped)?;
        reply_rx.await.map_err(|_| CoordinatorError::Stopped)
    }

    /// Ask the coordinator to stop accepting jobs and exit once the
    /// remaining ones have concluded.
    pub async fn shutdown(&self) {
        if self.tx.send(Command::Shutdown).await.is_err() {
            warn!("Coordinator already stopped");
        }
    }

    /// Whether the coordinator loop has exited.
    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }
}
