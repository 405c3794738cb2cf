//! Mock dispatcher for testing.

use std::collections::HashSet;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::sync::Notify;

use crate::dispatch::{DispatchError, WorkerDispatcher};
use crate::job::JobId;
use crate::transfer::{TargetContext, TransferableHandle};

use super::lock;

/// A recorded "begin generation" instruction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedDispatch {
    pub job_id: JobId,
    pub target: TargetContext,
    /// Token of the handed-off handle, when it was token-backed.
    pub handle_token: Option<u64>,
}

/// Mock implementation of the WorkerDispatcher trait.
///
/// Records dispatches instead of reaching a worker. Tests play the worker by
/// calling `CoordinatorHandle::generation_complete` with the recorded ids.
#[derive(Debug, Clone, Default)]
pub struct MockDispatcher {
    dispatches: Arc<Mutex<Vec<RecordedDispatch>>>,
    unreachable: Arc<Mutex<HashSet<TargetContext>>>,
    notify: Arc<Notify>,
}

impl MockDispatcher {
    /// Create a new mock dispatcher.
    pub fn new() -> Self {
        Self::default()
    }

    /// Make dispatches to `target` fail as unreachable.
    pub fn set_unreachable(&self, target: TargetContext) {
        lock(&self.unreachable).insert(target);
    }

    /// Get all recorded dispatches.
    pub fn dispatches(&self) -> Vec<RecordedDispatch> {
        lock(&self.dispatches).clone()
    }

    /// Get the number of dispatches performed.
    pub fn dispatch_count(&self) -> usize {
        lock(&self.dispatches).len()
    }

    /// Ids of jobs dispatched to `target`.
    pub fn dispatched_to(&self, target: &TargetContext) -> Vec<JobId> {
        self.dispatches()
            .into_iter()
            .filter(|d| d.target == *target)
            .map(|d| d.job_id)
            .collect()
    }

    /// Wait until at least `count` dispatches were recorded.
    ///
    /// Returns false if `timeout` elapsed first.
    pub async fn wait_for_dispatches(&self, count: usize, timeout: Duration) -> bool {
        let wait = async {
            loop {
                let notified = self.notify.notified();
                if self.dispatch_count() >= count {
                    return;
                }
                notified.await;
            }
        };
        tokio::time::timeout(timeout, wait).await.is_ok()
    }
}

impl WorkerDispatcher for MockDispatcher {
    fn name(&self) -> &str {
        "mock"
    }

    fn begin_generation(
        &self,
        job_id: JobId,
        target: &TargetContext,
        handle: TransferableHandle,
    ) -> Result<(), DispatchError> {
        if lock(&self.unreachable).contains(target) {
            return Err(DispatchError::Unreachable(*target));
        }

        lock(&self.dispatches).push(RecordedDispatch {
            job_id,
            target: *target,
            handle_token: handle.as_token(),
        });
        self.notify.notify_waiters();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_records_dispatch() {
        let dispatcher = MockDispatcher::new();
        let target = TargetContext::new(1, 2);

        dispatcher
            .begin_generation(JobId::new(4), &target, TransferableHandle::token(9))
            .unwrap();

        assert_eq!(
            dispatcher.dispatches(),
            vec![RecordedDispatch {
                job_id: JobId::new(4),
                target,
                handle_token: Some(9),
            }]
        );
        assert_eq!(dispatcher.dispatched_to(&target), vec![JobId::new(4)]);
    }

    #[tokio::test]
    async fn test_unreachable_target() {
        let dispatcher = MockDispatcher::new();
        let target = TargetContext::new(1, 2);
        dispatcher.set_unreachable(target);

        let result =
            dispatcher.begin_generation(JobId::new(1), &target, TransferableHandle::token(0));
        assert!(matches!(result, Err(DispatchError::Unreachable(_))));
        assert_eq!(dispatcher.dispatch_count(), 0);
    }

    #[tokio::test]
    async fn test_wait_for_dispatches() {
        let dispatcher = MockDispatcher::new();
        let background = dispatcher.clone();

        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(20)).await;
            background
                .begin_generation(
                    JobId::new(1),
                    &TargetContext::new(1, 1),
                    TransferableHandle::token(0),
                )
                .unwrap();
        });

        assert!(
            dispatcher
                .wait_for_dispatches(1, Duration::from_secs(1))
                .await
        );
    }

    #[tokio::test]
    async fn test_wait_for_dispatches_times_out() {
        let dispatcher = MockDispatcher::new();
        assert!(
            !dispatcher
                .wait_for_dispatches(1, Duration::from_millis(20))
                .await
        );
    }
}
