//! Handle and target types shared by the provisioner, dispatcher and coordinator.

use std::fmt;
use std::fs::File;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// Identifies the worker context a job is addressed to.
///
/// A process identifier plus a session within that process is enough to
/// route a "begin generation" instruction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TargetContext {
    /// Which worker process.
    pub process_id: u32,
    /// Which session inside that process.
    pub session_id: u32,
}

impl TargetContext {
    pub fn new(process_id: u32, session_id: u32) -> Self {
        Self {
            process_id,
            session_id,
        }
    }
}

impl fmt::Display for TargetContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.process_id, self.session_id)
    }
}

#[derive(Debug)]
enum HandleRepr {
    File(File),
    Token(u64),
}

/// The controller's own handle to an output file.
///
/// Owned by exactly one job. Closing consumes the handle, so it cannot be
/// touched after close.
#[derive(Debug)]
pub struct ControllerHandle {
    path: PathBuf,
    repr: HandleRepr,
}

impl ControllerHandle {
    /// Wraps an open OS file.
    pub fn from_file(path: impl Into<PathBuf>, file: File) -> Self {
        Self {
            path: path.into(),
            repr: HandleRepr::File(file),
        }
    }

    /// Creates a handle that is not backed by an OS file.
    pub fn token(path: impl Into<PathBuf>, token: u64) -> Self {
        Self {
            path: path.into(),
            repr: HandleRepr::Token(token),
        }
    }

    /// Path the handle was opened for.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// The underlying file, if this handle is file-backed.
    pub fn as_file(&self) -> Option<&File> {
        match &self.repr {
            HandleRepr::File(file) => Some(file),
            HandleRepr::Token(_) => None,
        }
    }

    /// The opaque token, if this handle is token-backed.
    pub fn as_token(&self) -> Option<u64> {
        match self.repr {
            HandleRepr::Token(token) => Some(token),
            HandleRepr::File(_) => None,
        }
    }

    pub fn into_file(self) -> Option<File> {
        match self.repr {
            HandleRepr::File(file) => Some(file),
            HandleRepr::Token(_) => None,
        }
    }
}

/// A handle the worker can use to write the artifact.
///
/// Handed to the dispatcher exactly once; the worker consumes it.
#[derive(Debug)]
pub struct TransferableHandle {
    repr: HandleRepr,
}

impl TransferableHandle {
    pub fn from_file(file: File) -> Self {
        Self {
            repr: HandleRepr::File(file),
        }
    }

    pub fn token(token: u64) -> Self {
        Self {
            repr: HandleRepr::Token(token),
        }
    }

    pub fn as_token(&self) -> Option<u64> {
        match self.repr {
            HandleRepr::Token(token) => Some(token),
            HandleRepr::File(_) => None,
        }
    }

    /// Consumes the handle, yielding the OS file if there is one.
    pub fn into_file(self) -> Option<File> {
        match self.repr {
            HandleRepr::File(file) => Some(file),
            HandleRepr::Token(_) => None,
        }
    }
}

#[cfg(unix)]
impl TransferableHandle {
    /// Raw descriptor for transports that pass fds between processes.
    pub fn as_raw_fd(&self) -> Option<std::os::unix::io::RawFd> {
        use std::os::unix::io::AsRawFd;

        match &self.repr {
            HandleRepr::File(file) => Some(file.as_raw_fd()),
            HandleRepr::Token(_) => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_target_display() {
        let target = TargetContext::new(42, 7);
        assert_eq!(target.to_string(), "42:7");
    }

    #[test]
    fn test_target_serialization() {
        let target = TargetContext::new(1, 2);
        let json = serde_json::to_string(&target).unwrap();
        assert_eq!(json, r#"{"process_id":1,"session_id":2}"#);

        let parsed: TargetContext = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, target);
    }

    #[test]
    fn test_token_handles() {
        let controller = ControllerHandle::token("/tmp/out", 9);
        assert_eq!(controller.path(), Path::new("/tmp/out"));
        assert_eq!(controller.as_token(), Some(9));
        assert!(controller.as_file().is_none());
        assert!(controller.into_file().is_none());

        let worker = TransferableHandle::token(9);
        assert_eq!(worker.as_token(), Some(9));
        assert!(worker.into_file().is_none());
    }

    #[test]
    fn test_file_handles() {
        let file = tempfile::tempfile().unwrap();
        let controller = ControllerHandle::from_file("/tmp/out", file);
        assert!(controller.as_file().is_some());
        assert!(controller.as_token().is_none());

        let worker = TransferableHandle::from_file(tempfile::tempfile().unwrap());
        assert!(worker.as_token().is_none());
        assert!(worker.into_file().is_some());
    }
}
