//! Generation coordinator loop.
//!
//! One task owns the job registry and processes, in order:
//! - commands from `CoordinatorHandle`s (start, worker completion, teardown)
//! - replies from file operations it spawned (created, closed)
//! - timeout sweeps, when a generation timeout is configured
//!
//! File creation and closing run on spawned tasks; their results come back
//! as replies, so the loop never waits on file I/O.

use std::sync::Arc;

use tokio::sync::mpsc;
use tokio::time::{Instant, Interval, MissedTickBehavior};
use tracing::{debug, info, warn};

use crate::dispatch::WorkerDispatcher;
use crate::job::{Job, JobId, JobOutcome, JobPhase, JobRegistry, RegistryError, GENERATION_FAILED};
use crate::metrics;
use crate::provisioner::{FileProvisioner, ProvisionError, ProvisionedFile};
use crate::transfer::{ControllerHandle, TargetContext};

use super::config::CoordinatorConfig;
use super::handle::{command_channel, CommandReceiver, CoordinatorHandle};
use super::types::{Command, CoordinatorStatus, Reply, StartRequest};

#[derive(Debug, Default)]
struct Totals {
    started: u64,
    succeeded: u64,
    failed: u64,
    stray_signals: u64,
}

/// Drives every job from start request to callback.
///
/// Build with [`create_coordinator`] (or [`command_channel`] plus
/// [`GenerationCoordinator::new`]) and spawn [`GenerationCoordinator::run`].
pub struct GenerationCoordinator {
    config: CoordinatorConfig,
    commands: mpsc::Receiver<Command>,
    replies_tx: mpsc::Sender<Reply>,
    replies_rx: mpsc::Receiver<Reply>,
    provisioner: Arc<dyn FileProvisioner>,
    dispatcher: Arc<dyn WorkerDispatcher>,
    registry: JobRegistry,
    totals: Totals,
    accepting: bool,
}

impl GenerationCoordinator {
    pub fn new(
        config: CoordinatorConfig,
        commands: CommandReceiver,
        provisioner: Arc<dyn FileProvisioner>,
        dispatcher: Arc<dyn WorkerDispatcher>,
    ) -> Self {
        let (replies_tx, replies_rx) = mpsc::channel(config.channel_capacity());

        Self {
            config,
            commands: commands.rx,
            replies_tx,
            replies_rx,
            provisioner,
            dispatcher,
            registry: JobRegistry::new(),
            totals: Totals::default(),
            accepting: true,
        }
    }

    /// Run the loop until shutdown, consuming the coordinator.
    ///
    /// This should be spawned as a background task. It returns once shutdown
    /// was requested (or every handle was dropped) and every remaining job
    /// has fired its callback.
    pub async fn run(mut self) {
        info!(
            provisioner = self.provisioner.name(),
            dispatcher = self.dispatcher.name(),
            "Generation coordinator started"
        );

        let mut sweep = self.config.generation_timeout().map(|_| {
            let mut interval = tokio::time::interval(self.config.sweep_interval());
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
            interval
        });
        let mut commands_open = true;

        loop {
            if !self.accepting && self.registry.is_empty() {
                break;
            }

            tokio::select! {
                command = self.commands.recv(), if commands_open => match command {
                    Some(command) => self.handle_command(command),
                    None => {
                        commands_open = false;
                        self.begin_shutdown();
                    }
                },
                Some(reply) = self.replies_rx.recv() => self.handle_reply(reply),
                _ = next_sweep(&mut sweep) => self.sweep_timeouts(),
            }
        }

        info!(
            started = self.totals.started,
            succeeded = self.totals.succeeded,
            failed = self.totals.failed,
            "Generation coordinator shutting down"
        );
    }

    fn handle_command(&mut self, command: Command) {
        match command {
            Command::Start(request) => self.on_start(request),
            Command::GenerationComplete { id, size } => self.on_generation_complete(id, size),
            Command::ContextTornDown(target) => self.on_context_torn_down(target),
            Command::Status(reply) => {
                let _ = reply.send(self.status());
            }
            Command::Shutdown => self.begin_shutdown(),
        }
    }

    fn handle_reply(&mut self, reply: Reply) {
        match reply {
            Reply::FileCreated { id, result } => self.on_file_created(id, result),
            Reply::FileClosed {
                id,
                size,
                outcome,
                result,
            } => {
                if let Err(e) = result {
                    warn!(job_id = %id, error = %e, "Closing output file failed");
                }
                self.finish(id, size, outcome);
            }
        }
    }

    fn on_start(&mut self, request: StartRequest) {
        let StartRequest {
            id,
            target,
            output_path,
            callback,
        } = request;
        let job = Job::new(id, output_path, target, callback);

        if !self.accepting {
            debug!(job_id = %id, "Not accepting jobs, failing start");
            self.conclude(job, GENERATION_FAILED, JobOutcome::Shutdown);
            return;
        }

        let path = job.output_path.clone();
        if let Err(RegistryError::DuplicateId(job)) = self.registry.insert(job) {
            warn!(job_id = %id, "Job id already live, failing start");
            self.conclude(*job, GENERATION_FAILED, JobOutcome::ProvisionFailed);
            return;
        }

        self.totals.started += 1;
        metrics::JOBS_STARTED.inc();
        metrics::JOBS_LIVE.inc();
        debug!(job_id = %id, %target, path = %path.display(), "Job accepted, creating file");

        let provisioner = Arc::clone(&self.provisioner);
        let replies = self.replies_tx.clone();
        tokio::spawn(async move {
            let started = std::time::Instant::now();
            // A panicking provisioner still yields a reply.
            let result =
                tokio::spawn(async move { provisioner.create_file(&path, &target).await })
                    .await
                    .unwrap_or_else(|e| Err(ProvisionError::from(e)));
            metrics::FILE_OP_DURATION
                .with_label_values(&["create"])
                .observe(started.elapsed().as_secs_f64());
            let _ = replies.send(Reply::FileCreated { id, result }).await;
        });
    }

    fn on_file_created(&mut self, id: JobId, result: Result<ProvisionedFile, ProvisionError>) {
        let accepting = self.accepting;
        let Some(job) = self.registry.get_mut(id) else {
            // Nothing removes a job while it is creating; keep the file closed anyway.
            if let Ok(file) = result {
                self.spawn_close(id, file.controller, GENERATION_FAILED, JobOutcome::Shutdown);
            }
            return;
        };

        let file = match result {
            Ok(file) => file,
            Err(e) => {
                warn!(job_id = %id, path = %job.output_path.display(), error = %e, "File creation failed");
                self.finish(id, GENERATION_FAILED, JobOutcome::ProvisionFailed);
                return;
            }
        };

        job.controller_handle = Some(file.controller);
        job.worker_handle = Some(file.worker);

        let abort = if job.target_gone {
            Some(JobOutcome::WorkerGone)
        } else if !accepting {
            Some(JobOutcome::Shutdown)
        } else {
            None
        };
        if let Some(outcome) = abort {
            // The worker handle is dropped unsent.
            job.worker_handle = None;
            self.begin_close(id, GENERATION_FAILED, outcome);
            return;
        }

        let Some(worker_handle) = job.worker_handle.take() else {
            return;
        };
        job.phase = JobPhase::Generating;
        job.dispatched_at = Some(Instant::now());
        let target = job.target;

        match self.dispatcher.begin_generation(id, &target, worker_handle) {
            Ok(()) => debug!(job_id = %id, %target, "Dispatched begin generation"),
            Err(e) => {
                warn!(job_id = %id, %target, error = %e, "Dispatch failed");
                self.begin_close(id, GENERATION_FAILED, JobOutcome::DispatchFailed);
            }
        }
    }

    fn on_generation_complete(&mut self, id: JobId, size: i64) {
        let phase = self.registry.get(id).map(|job| job.phase);
        if phase != Some(JobPhase::Generating) {
            self.totals.stray_signals += 1;
            metrics::STRAY_SIGNALS.inc();
            debug!(job_id = %id, size, "Ignoring completion for unknown or finishing job");
            return;
        }

        if size >= 0 {
            self.begin_close(id, size, JobOutcome::Success);
        } else {
            self.begin_close(id, GENERATION_FAILED, JobOutcome::GenerationFailed);
        }
    }

    fn on_context_torn_down(&mut self, target: TargetContext) {
        let ids = self.registry.ids_for_target(&target);
        debug!(%target, jobs = ids.len(), "Target context torn down");

        for id in ids {
            let Some(job) = self.registry.get_mut(id) else {
                continue;
            };
            let phase = job.phase;
            match phase {
                JobPhase::Creating => job.target_gone = true,
                JobPhase::Generating => {
                    self.begin_close(id, GENERATION_FAILED, JobOutcome::WorkerGone)
                }
                JobPhase::Closing => {}
            }
        }
    }

    fn sweep_timeouts(&mut self) {
        let Some(timeout) = self.config.generation_timeout() else {
            return;
        };
        let now = Instant::now();

        let expired: Vec<JobId> = self
            .registry
            .iter()
            .filter(|job| job.phase == JobPhase::Generating)
            .filter(|job| {
                job.dispatched_at
                    .is_some_and(|at| now.duration_since(at) >= timeout)
            })
            .map(|job| job.id)
            .collect();

        for id in expired {
            warn!(job_id = %id, timeout_ms = timeout.as_millis() as u64, "Worker did not report in time");
            self.begin_close(id, GENERATION_FAILED, JobOutcome::TimedOut);
        }
    }

    fn begin_shutdown(&mut self) {
        if !self.accepting {
            return;
        }
        self.accepting = false;
        info!(live_jobs = self.registry.len(), "Coordinator stopping");

        // Creating jobs are failed when their file arrives; closing ones finish normally.
        for id in self.registry.ids_in_phase(JobPhase::Generating) {
            self.begin_close(id, GENERATION_FAILED, JobOutcome::Shutdown);
        }
    }

    /// Move a job to closing and close its controller handle off the loop.
    fn begin_close(&mut self, id: JobId, size: i64, outcome: JobOutcome) {
        let Some(job) = self.registry.get_mut(id) else {
            return;
        };
        if job.phase == JobPhase::Closing {
            return;
        }
        job.phase = JobPhase::Closing;

        match job.controller_handle.take() {
            Some(handle) => self.spawn_close(id, handle, size, outcome),
            None => self.finish(id, size, outcome),
        }
    }

    fn spawn_close(&self, id: JobId, handle: ControllerHandle, size: i64, outcome: JobOutcome) {
        let provisioner = Arc::clone(&self.provisioner);
        let replies = self.replies_tx.clone();
        tokio::spawn(async move {
            let started = std::time::Instant::now();
            let result = tokio::spawn(async move { provisioner.close_file(handle).await })
                .await
                .unwrap_or_else(|e| Err(ProvisionError::from(e)));
            metrics::FILE_OP_DURATION
                .with_label_values(&["close"])
                .observe(started.elapsed().as_secs_f64());
            let _ = replies
                .send(Reply::FileClosed {
                    id,
                    size,
                    outcome,
                    result,
                })
                .await;
        });
    }

    /// Remove a job and fire its callback.
    fn finish(&mut self, id: JobId, size: i64, outcome: JobOutcome) {
        let Some(job) = self.registry.remove(id) else {
            return;
        };
        metrics::JOBS_LIVE.dec();
        self.conclude(job, size, outcome);
    }

    fn conclude(&mut self, job: Job, size: i64, outcome: JobOutcome) {
        if outcome.is_success() {
            self.totals.succeeded += 1;
            info!(job_id = %job.id, path = %job.output_path.display(), size, "Generation succeeded");
        } else {
            self.totals.failed += 1;
            warn!(job_id = %job.id, path = %job.output_path.display(), reason = outcome.as_str(), "Generation failed");
        }
        metrics::JOBS_FINISHED
            .with_label_values(&[outcome.as_str()])
            .inc();

        job.complete(size);
    }

    fn status(&self) -> CoordinatorStatus {
        CoordinatorStatus {
            accepting: self.accepting,
            live_jobs: self.registry.len(),
            phases: self.registry.phase_counts(),
            oldest_job_created_at: self.registry.oldest_created_at(),
            total_started: self.totals.started,
            total_succeeded: self.totals.succeeded,
            total_failed: self.totals.failed,
            stray_signals: self.totals.stray_signals,
        }
    }
}

async fn next_sweep(sweep: &mut Option<Interval>) {
    match sweep {
        Some(interval) => {
            interval.tick().await;
        }
        None => std::future::pending::<()>().await,
    }
}

/// Create a coordinator and its handle.
///
/// Returns:
/// - `CoordinatorHandle` - for starting jobs and reporting worker results
/// - `GenerationCoordinator` - spawn this with `tokio::spawn(coordinator.run())`
pub fn create_coordinator(
    config: CoordinatorConfig,
    provisioner: Arc<dyn FileProvisioner>,
    dispatcher: Arc<dyn WorkerDispatcher>,
) -> (CoordinatorHandle, GenerationCoordinator) {
    let (handle, commands) = command_channel(config.channel_capacity());
    let coordinator = GenerationCoordinator::new(config, commands, provisioner, dispatcher);
    (handle, coordinator)
}
