//! File system provisioner implementation.

use std::fs::{self, OpenOptions};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use tracing::debug;

use crate::transfer::{ControllerHandle, DuplicateTransfer, HandleTransfer, TargetContext};

use super::config::ProvisionerConfig;
use super::error::ProvisionError;
use super::traits::{FileProvisioner, ProvisionedFile};

/// Creates output files on the local file system.
///
/// All file system calls run on tokio's blocking pool.
pub struct FsProvisioner {
    config: ProvisionerConfig,
    transfer: Arc<dyn HandleTransfer>,
}

impl FsProvisioner {
    /// Creates a provisioner with the given configuration and transfer layer.
    pub fn new(config: ProvisionerConfig, transfer: Arc<dyn HandleTransfer>) -> Self {
        Self { config, transfer }
    }

    /// Creates a provisioner with default configuration and handle duplication.
    pub fn with_defaults() -> Self {
        Self::new(ProvisionerConfig::default(), Arc::new(DuplicateTransfer::new()))
    }

    fn open_options(config: &ProvisionerConfig) -> OpenOptions {
        let mut options = OpenOptions::new();
        options.read(true).write(true);
        if config.overwrite {
            options.create(true).truncate(true);
        } else {
            options.create_new(true);
        }

        #[cfg(unix)]
        {
            use std::os::unix::fs::OpenOptionsExt;
            options.mode(config.file_mode);
        }

        options
    }

    fn create_blocking(
        config: &ProvisionerConfig,
        transfer: &dyn HandleTransfer,
        path: PathBuf,
        target: TargetContext,
    ) -> Result<ProvisionedFile, ProvisionError> {
        if config.create_parents {
            if let Some(parent) = path.parent() {
                if !parent.as_os_str().is_empty() && !parent.exists() {
                    fs::create_dir_all(parent).map_err(|source| {
                        ProvisionError::DirectoryCreationFailed {
                            path: parent.to_path_buf(),
                            source,
                        }
                    })?;
                }
            }
        }

        let file = Self::open_options(config)
            .open(&path)
            .map_err(|source| ProvisionError::CreateFailed {
                path: path.clone(),
                source,
            })?;

        // On failure `file` is dropped here, closing the controller side too.
        let worker = transfer
            .transfer(&file, &target)
            .map_err(|source| ProvisionError::TransferFailed {
                path: path.clone(),
                source,
            })?;

        Ok(ProvisionedFile {
            controller: ControllerHandle::from_file(path, file),
            worker,
        })
    }

    fn close_blocking(sync: bool, handle: ControllerHandle) -> Result<(), ProvisionError> {
        let path = handle.path().to_path_buf();
        let Some(file) = handle.into_file() else {
            return Ok(());
        };
        if sync {
            file.sync_all()
                .map_err(|source| ProvisionError::CloseFailed { path, source })?;
        }
        Ok(())
    }
}

#[async_trait]
impl FileProvisioner for FsProvisioner {
    fn name(&self) -> &str {
        "fs"
    }

    async fn create_file(
        &self,
        path: &Path,
        target: &TargetContext,
    ) -> Result<ProvisionedFile, ProvisionError> {
        debug!(path = %path.display(), %target, transfer = self.transfer.name(), "Creating output file");

        let config = self.config.clone();
        let transfer = Arc::clone(&self.transfer);
        let path = path.to_path_buf();
        let target = *target;

        tokio::task::spawn_blocking(move || {
            Self::create_blocking(&config, transfer.as_ref(), path, target)
        })
        .await?
    }

    async fn close_file(&self, handle: ControllerHandle) -> Result<(), ProvisionError> {
        debug!(path = %handle.path().display(), "Closing output file");

        let sync = self.config.sync_on_close;
        tokio::task::spawn_blocking(move || Self::close_blocking(sync, handle)).await?
    }
}
