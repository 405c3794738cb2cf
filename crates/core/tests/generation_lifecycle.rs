//! Generation lifecycle integration tests.
//!
//! These tests drive the coordinator through its public handle with a mock
//! provisioner and dispatcher, playing the worker by hand:
//! - Successful and failed jobs reach the callback exactly once
//! - Close precedes the callback
//! - Interleaved jobs for different targets stay independent
//! - Stray signals never disturb live jobs

use std::collections::HashSet;
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use futures::future::join_all;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;

use handoff_core::{
    create_coordinator,
    testing::{fixtures, MockDispatcher, MockProvisioner, ProvisionerCall},
    CoordinatorConfig, CoordinatorHandle, JobId, TargetContext, GENERATION_FAILED,
};

const TEST_WAIT: Duration = Duration::from_secs(2);

type Outcome = oneshot::Receiver<(PathBuf, i64)>;

/// Test helper running a coordinator over mocks.
struct TestHarness {
    handle: CoordinatorHandle,
    provisioner: MockProvisioner,
    dispatcher: MockDispatcher,
    task: JoinHandle<()>,
}

impl TestHarness {
    fn new() -> Self {
        Self::with_config(fixtures::coordinator_config())
    }

    fn with_config(config: CoordinatorConfig) -> Self {
        let provisioner = MockProvisioner::new();
        let dispatcher = MockDispatcher::new();
        let (handle, coordinator) = create_coordinator(
            config,
            Arc::new(provisioner.clone()),
            Arc::new(dispatcher.clone()),
        );
        let task = tokio::spawn(coordinator.run());

        Self {
            handle,
            provisioner,
            dispatcher,
            task,
        }
    }

    async fn start(&self, target: TargetContext, path: &str) -> (JobId, Outcome) {
        let (tx, rx) = oneshot::channel();
        let id = self
            .handle
            .start(target, path, move |path, size| {
                let _ = tx.send((path.to_path_buf(), size));
            })
            .await;
        (id, rx)
    }

    async fn wait_for_dispatches(&self, count: usize) {
        assert!(
            self.dispatcher.wait_for_dispatches(count, TEST_WAIT).await,
            "expected {} dispatches, saw {}",
            count,
            self.dispatcher.dispatch_count()
        );
    }

    async fn live_jobs(&self) -> usize {
        self.handle
            .status()
            .await
            .expect("coordinator should be running")
            .live_jobs
    }

    async fn stop(self) {
        self.handle.shutdown().await;
        drop(self.handle);
        tokio::time::timeout(TEST_WAIT, self.task)
            .await
            .expect("coordinator should exit")
            .expect("coordinator task panicked");
    }
}

async fn outcome(rx: Outcome) -> (PathBuf, i64) {
    tokio::time::timeout(TEST_WAIT, rx)
        .await
        .expect("callback should fire")
        .expect("callback dropped without firing")
}

#[tokio::test]
async fn test_successful_generation_reaches_callback() {
    let harness = TestHarness::new();
    let t1 = fixtures::target(1);

    let (id, rx) = harness.start(t1, "/tmp/out1").await;
    harness.wait_for_dispatches(1).await;
    assert_eq!(harness.dispatcher.dispatched_to(&t1), vec![id]);

    harness.handle.generation_complete(id, 4096).await;

    assert_eq!(outcome(rx).await, (PathBuf::from("/tmp/out1"), 4096));
    assert_eq!(harness.live_jobs().await, 0);
    harness.stop().await;
}

#[tokio::test]
async fn test_failed_creation_never_dispatches() {
    let harness = TestHarness::new();
    harness.provisioner.fail_path("/bad/path");
    let t2 = fixtures::target(2);

    let (_, rx) = harness.start(t2, "/bad/path").await;

    assert_eq!(
        outcome(rx).await,
        (PathBuf::from("/bad/path"), GENERATION_FAILED)
    );
    assert_eq!(harness.dispatcher.dispatch_count(), 0);
    assert_eq!(harness.provisioner.close_count(), 0);
    assert_eq!(harness.live_jobs().await, 0);
    harness.stop().await;
}

#[tokio::test]
async fn test_close_precedes_callback() {
    let harness = TestHarness::new();
    let provisioner = harness.provisioner.clone();
    let closed_at_callback = Arc::new(Mutex::new(None));
    let observed = Arc::clone(&closed_at_callback);
    let (tx, rx) = oneshot::channel();

    let id = harness
        .handle
        .start(fixtures::target(1), "/tmp/ordered", move |path, size| {
            *observed.lock().unwrap() = Some(provisioner.was_closed(path));
            let _ = tx.send((path.to_path_buf(), size));
        })
        .await;
    harness.wait_for_dispatches(1).await;
    harness.handle.generation_complete(id, 12).await;

    assert_eq!(outcome(rx).await.1, 12);
    assert_eq!(*closed_at_callback.lock().unwrap(), Some(true));
    assert_eq!(
        harness.provisioner.calls(),
        vec![
            ProvisionerCall::Create {
                path: PathBuf::from("/tmp/ordered"),
                target: fixtures::target(1),
            },
            ProvisionerCall::Close {
                path: PathBuf::from("/tmp/ordered"),
            },
        ]
    );
    harness.stop().await;
}

#[tokio::test]
async fn test_out_of_order_completion_keeps_jobs_independent() {
    let harness = TestHarness::new();
    let (id_a, rx_a) = harness.start(fixtures::target(1), "/tmp/a").await;
    let (id_b, rx_b) = harness.start(fixtures::target(2), "/tmp/b").await;
    harness.wait_for_dispatches(2).await;

    harness.handle.generation_complete(id_b, 20).await;
    assert_eq!(outcome(rx_b).await, (PathBuf::from("/tmp/b"), 20));
    assert_eq!(harness.live_jobs().await, 1);

    harness.handle.generation_complete(id_a, 10).await;
    assert_eq!(outcome(rx_a).await, (PathBuf::from("/tmp/a"), 10));
    assert_eq!(harness.live_jobs().await, 0);
    harness.stop().await;
}

#[tokio::test]
async fn test_many_jobs_fire_exactly_once() {
    const JOBS: usize = 40;

    let harness = TestHarness::new();
    let fired = Arc::new(AtomicUsize::new(0));
    let mut ids = Vec::with_capacity(JOBS);
    let mut receivers = Vec::with_capacity(JOBS);

    for n in 0..JOBS {
        let (tx, rx) = oneshot::channel();
        let fired = Arc::clone(&fired);
        let id = harness
            .handle
            .start(
                fixtures::target(n as u32 % 4),
                format!("/tmp/job-{}", n),
                move |_, size| {
                    fired.fetch_add(1, Ordering::SeqCst);
                    let _ = tx.send(size);
                },
            )
            .await;
        ids.push(id);
        receivers.push(rx);
    }

    let unique: HashSet<JobId> = ids.iter().copied().collect();
    assert_eq!(unique.len(), JOBS);
    harness.wait_for_dispatches(JOBS).await;

    // Complete in reverse, each twice; the repeat must be a no-op
    for (n, id) in ids.iter().enumerate().rev() {
        harness.handle.generation_complete(*id, n as i64).await;
        harness.handle.generation_complete(*id, 999).await;
    }

    let sizes = tokio::time::timeout(TEST_WAIT, join_all(receivers))
        .await
        .expect("all callbacks should fire");
    for (n, size) in sizes.into_iter().enumerate() {
        assert_eq!(size.unwrap(), n as i64);
    }
    assert_eq!(fired.load(Ordering::SeqCst), JOBS);
    assert_eq!(harness.provisioner.close_count(), JOBS);

    let status = harness.handle.status().await.unwrap();
    assert_eq!(status.live_jobs, 0);
    assert_eq!(status.total_succeeded, JOBS as u64);
    assert!(status.stray_signals >= JOBS as u64);
    harness.stop().await;
}

#[tokio::test]
async fn test_unknown_signal_is_ignored() {
    let harness = TestHarness::new();
    let (id, rx) = harness.start(fixtures::target(1), "/tmp/live").await;
    harness.wait_for_dispatches(1).await;

    harness
        .handle
        .generation_complete(JobId::new(id.get() + 1000), 5)
        .await;
    assert_eq!(harness.live_jobs().await, 1);

    harness.handle.generation_complete(id, 7).await;
    assert_eq!(outcome(rx).await.1, 7);
    harness.stop().await;
}

#[tokio::test]
async fn test_teardown_fails_only_that_target() {
    let harness = TestHarness::new();
    let gone = fixtures::target(1);
    let alive = fixtures::target(2);
    let (_, rx_gone) = harness.start(gone, "/tmp/gone").await;
    let (id_alive, rx_alive) = harness.start(alive, "/tmp/alive").await;
    harness.wait_for_dispatches(2).await;

    harness.handle.context_torn_down(gone).await;
    assert_eq!(outcome(rx_gone).await.1, GENERATION_FAILED);
    assert!(harness.provisioner.was_closed("/tmp/gone"));

    harness.handle.generation_complete(id_alive, 3).await;
    assert_eq!(outcome(rx_alive).await.1, 3);
    harness.stop().await;
}

#[tokio::test]
async fn test_timeout_fails_silent_worker() {
    let config = fixtures::coordinator_config()
        .with_generation_timeout(Duration::from_millis(50))
        .with_sweep_interval(Duration::from_millis(10));
    let harness = TestHarness::with_config(config);

    let (id, rx) = harness.start(fixtures::target(1), "/tmp/silent").await;
    assert_eq!(outcome(rx).await.1, GENERATION_FAILED);
    assert!(harness.provisioner.was_closed("/tmp/silent"));

    // A late report for the timed-out job changes nothing
    harness.handle.generation_complete(id, 10).await;
    assert_eq!(harness.live_jobs().await, 0);
    harness.stop().await;
}

#[tokio::test]
async fn test_start_after_shutdown_fails_immediately() {
    let harness = TestHarness::new();
    let handle = harness.handle.clone();
    harness.stop().await;

    let (tx, rx) = oneshot::channel();
    handle
        .start(fixtures::target(1), "/tmp/late", move |path, size| {
            let _ = tx.send((path.to_path_buf(), size));
        })
        .await;

    assert_eq!(
        outcome(rx).await,
        (PathBuf::from("/tmp/late"), GENERATION_FAILED)
    );
    assert!(handle.status().await.is_err());
}

#[tokio::test]
async fn test_status_reports_started_jobs() {
    let harness = TestHarness::new();
    let (_, _rx) = harness.start(fixtures::target(1), "/tmp/s").await;
    harness.wait_for_dispatches(1).await;

    let status = tokio_test::assert_ok!(harness.handle.status().await);
    assert!(status.accepting);
    assert_eq!(status.live_jobs, 1);
    assert_eq!(status.phases.generating, 1);
    assert_eq!(status.total_started, 1);
    assert!(status.oldest_job_created_at.is_some());
    harness.stop().await;
}
