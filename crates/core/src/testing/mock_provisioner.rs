//! Mock provisioner for testing.

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;

use crate::provisioner::{FileProvisioner, ProvisionError, ProvisionedFile};
use crate::transfer::{ControllerHandle, TargetContext, TransferableHandle};

use super::lock;

/// A recorded provisioner call, in the order it was made.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProvisionerCall {
    Create { path: PathBuf, target: TargetContext },
    Close { path: PathBuf },
}

/// Mock implementation of the FileProvisioner trait.
///
/// Hands out token-backed handles instead of touching the file system:
/// - Records create/close calls in order for assertions
/// - Fails creation for chosen paths, or for every path
/// - Simulates slow creation
/// - Panics inside create/close, to exercise task failure handling
///
/// State is shared between clones and readable without awaiting, so it can
/// be inspected from inside a generation callback.
///
/// # Example
///
/// ```rust,ignore
/// use handoff_core::testing::MockProvisioner;
///
/// let provisioner = MockProvisioner::new();
/// provisioner.fail_path("/bad/path");
///
/// // ... run jobs ...
///
/// assert_eq!(provisioner.close_count(), 1);
/// ```
#[derive(Debug, Clone, Default)]
pub struct MockProvisioner {
    calls: Arc<Mutex<Vec<ProvisionerCall>>>,
    failing_paths: Arc<Mutex<HashSet<PathBuf>>>,
    fail_all: Arc<AtomicBool>,
    create_delay: Arc<Mutex<Duration>>,
    panicking_paths: Arc<Mutex<HashSet<PathBuf>>>,
    panic_on_close: Arc<AtomicBool>,
    next_token: Arc<AtomicU64>,
}

impl MockProvisioner {
    /// Create a new mock provisioner.
    pub fn new() -> Self {
        Self::default()
    }

    /// Make creation fail for `path`.
    pub fn fail_path(&self, path: impl Into<PathBuf>) {
        lock(&self.failing_paths).insert(path.into());
    }

    /// Make creation panic for `path`.
    pub fn panic_path(&self, path: impl Into<PathBuf>) {
        lock(&self.panicking_paths).insert(path.into());
    }

    /// Make every close panic.
    pub fn set_panic_on_close(&self, panic: bool) {
        self.panic_on_close.store(panic, Ordering::SeqCst);
    }

    /// Make creation fail for every path.
    pub fn set_fail_all(&self, fail: bool) {
        self.fail_all.store(fail, Ordering::SeqCst);
    }

    /// Set the simulated creation duration.
    pub fn set_create_delay(&self, delay: Duration) {
        *lock(&self.create_delay) = delay;
    }

    /// Get all recorded calls.
    pub fn calls(&self) -> Vec<ProvisionerCall> {
        lock(&self.calls).clone()
    }

    /// Paths passed to `create_file`.
    pub fn created_paths(&self) -> Vec<PathBuf> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                ProvisionerCall::Create { path, .. } => Some(path),
                ProvisionerCall::Close { .. } => None,
            })
            .collect()
    }

    /// Paths whose controller handle was closed.
    pub fn closed_paths(&self) -> Vec<PathBuf> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                ProvisionerCall::Close { path } => Some(path),
                ProvisionerCall::Create { .. } => None,
            })
            .collect()
    }

    /// Get the number of closes performed.
    pub fn close_count(&self) -> usize {
        self.closed_paths().len()
    }

    /// Whether `path` has been closed.
    pub fn was_closed(&self, path: impl AsRef<Path>) -> bool {
        self.closed_paths().iter().any(|p| p == path.as_ref())
    }

    fn record(&self, call: ProvisionerCall) {
        lock(&self.calls).push(call);
    }

    fn should_fail(&self, path: &Path) -> bool {
        self.fail_all.load(Ordering::SeqCst)
            || lock(&self.failing_paths).contains(path)
    }
}

#[async_trait]
impl FileProvisioner for MockProvisioner {
    fn name(&self) -> &str {
        "mock"
    }

    async fn create_file(
        &self,
        path: &Path,
        target: &TargetContext,
    ) -> Result<ProvisionedFile, ProvisionError> {
        self.record(ProvisionerCall::Create {
            path: path.to_path_buf(),
            target: *target,
        });

        let delay = *lock(&self.create_delay);
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }

        if lock(&self.panicking_paths).contains(path) {
            panic!("simulated provisioner panic for {}", path.display());
        }

        if self.should_fail(path) {
            return Err(ProvisionError::CreateFailed {
                path: path.to_path_buf(),
                source: std::io::Error::new(
                    std::io::ErrorKind::PermissionDenied,
                    "simulated creation failure",
                ),
            });
        }

        let token = self.next_token.fetch_add(1, Ordering::SeqCst);
        Ok(ProvisionedFile {
            controller: ControllerHandle::token(path, token),
            worker: TransferableHandle::token(token),
        })
    }

    async fn close_file(&self, handle: ControllerHandle) -> Result<(), ProvisionError> {
        self.record(ProvisionerCall::Close {
            path: handle.path().to_path_buf(),
        });
        if self.panic_on_close.load(Ordering::SeqCst) {
            panic!("simulated provisioner panic on close");
        }
        Ok(())
    }
}
