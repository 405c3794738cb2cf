//! Handle transfer by OS handle duplication.

use std::fs::File;

use super::error::TransferError;
use super::traits::HandleTransfer;
use super::types::{TargetContext, TransferableHandle};

/// Duplicates the controller's file handle for the worker.
///
/// Both handles share the same open file description. This is enough for
/// workers living in the same process, and for transports that pass the raw
/// descriptor on to another process.
#[derive(Debug, Default, Clone, Copy)]
pub struct DuplicateTransfer;

impl DuplicateTransfer {
    pub fn new() -> Self {
        Self
    }
}

impl HandleTransfer for DuplicateTransfer {
    fn name(&self) -> &str {
        "duplicate"
    }

    fn transfer(
        &self,
        file: &File,
        target: &TargetContext,
    ) -> Result<TransferableHandle, TransferError> {
        let duplicate = file
            .try_clone()
            .map_err(|source| TransferError::DuplicateFailed {
                target: *target,
                source,
            })?;
        Ok(TransferableHandle::from_file(duplicate))
    }
}

#[cfg(test)]
mod tests {
    use std::io::{Read, Seek, SeekFrom, Write};

    use super::*;

    #[test]
    fn test_duplicate_shares_open_file() {
        let mut controller = tempfile::tempfile().unwrap();
        let transfer = DuplicateTransfer::new();

        let handle = transfer
            .transfer(&controller, &TargetContext::new(1, 1))
            .unwrap();
        let mut worker = handle.into_file().expect("file-backed handle");
        worker.write_all(b"written by worker").unwrap();
        worker.flush().unwrap();
        drop(worker);

        controller.seek(SeekFrom::Start(0)).unwrap();
        let mut contents = String::new();
        controller.read_to_string(&mut contents).unwrap();
        assert_eq!(contents, "written by worker");
    }

    #[test]
    fn test_name() {
        assert_eq!(DuplicateTransfer::new().name(), "duplicate");
    }
}
