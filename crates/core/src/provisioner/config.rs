//! Configuration for the file provisioner.

use serde::{Deserialize, Serialize};

/// Configuration for the filesystem provisioner.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProvisionerConfig {
    /// Create missing parent directories of the output path.
    #[serde(default = "default_true")]
    pub create_parents: bool,

    /// Truncate an existing file instead of failing.
    #[serde(default = "default_true")]
    pub overwrite: bool,

    /// Flush file contents to disk before closing.
    #[serde(default)]
    pub sync_on_close: bool,

    /// Permissions for created files (Unix only, octal).
    #[serde(default = "default_file_mode")]
    pub file_mode: u32,
}

fn default_true() -> bool {
    true
}

fn default_file_mode() -> u32 {
    0o644
}

impl Default for ProvisionerConfig {
    fn default() -> Self {
        Self {
            create_parents: true,
            overwrite: true,
            sync_on_close: false,
            file_mode: default_file_mode(),
        }
    }
}

impl ProvisionerConfig {
    /// Enables or disables parent directory creation.
    pub fn with_create_parents(mut self, enabled: bool) -> Self {
        self.create_parents = enabled;
        self
    }

    /// Enables or disables overwriting existing files.
    pub fn with_overwrite(mut self, enabled: bool) -> Self {
        self.overwrite = enabled;
        self
    }

    /// Enables or disables syncing on close.
    pub fn with_sync_on_close(mut self, enabled: bool) -> Self {
        self.sync_on_close = enabled;
        self
    }
}
