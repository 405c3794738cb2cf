//! Configuration for the local worker.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Configuration for the in-process worker.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkerConfig {
    /// Buffer size for writes into the transferred handle, in bytes.
    #[serde(default = "default_write_buffer_size")]
    pub write_buffer_size: usize,

    /// File whose contents the daemon's worker produces for every target.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content_path: Option<PathBuf>,
}

fn default_write_buffer_size() -> usize {
    64 * 1024 // 64 KiB
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            write_buffer_size: default_write_buffer_size(),
            content_path: None,
        }
    }
}
