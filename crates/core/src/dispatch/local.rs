//! In-process worker.

use std::collections::HashMap;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, warn};

use crate::coordinator::CoordinatorHandle;
use crate::job::{JobId, GENERATION_FAILED};
use crate::transfer::{TargetContext, TransferableHandle};

use super::config::WorkerConfig;
use super::error::{DispatchError, WorkerError};
use super::traits::{ContentProducer, WorkerDispatcher};

/// Fixed content, either for every target or per session.
#[derive(Debug, Clone, Default)]
pub struct StaticContent {
    fallback: Option<Vec<u8>>,
    sessions: HashMap<TargetContext, Vec<u8>>,
}

impl StaticContent {
    /// Serves `bytes` to every target.
    pub fn new(bytes: impl Into<Vec<u8>>) -> Self {
        Self {
            fallback: Some(bytes.into()),
            sessions: HashMap::new(),
        }
    }

    /// Serves nothing until sessions are added.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Serves `bytes` to `target` only.
    pub fn with_session(mut self, target: TargetContext, bytes: impl Into<Vec<u8>>) -> Self {
        self.sessions.insert(target, bytes.into());
        self
    }
}

#[async_trait]
impl ContentProducer for StaticContent {
    fn serves(&self, target: &TargetContext) -> bool {
        self.sessions.contains_key(target) || self.fallback.is_some()
    }

    async fn produce(&self, target: &TargetContext) -> Result<Vec<u8>, WorkerError> {
        self.sessions
            .get(target)
            .or(self.fallback.as_ref())
            .cloned()
            .ok_or(WorkerError::NoContent(*target))
    }
}

/// Worker running inside the controller process.
///
/// Writes the producer's bytes into the transferred handle on the blocking
/// pool, drops the handle, then reports the size back to the coordinator.
pub struct LocalWorker {
    config: WorkerConfig,
    producer: Arc<dyn ContentProducer>,
    reports: CoordinatorHandle,
}

impl LocalWorker {
    pub fn new(
        config: WorkerConfig,
        producer: Arc<dyn ContentProducer>,
        reports: CoordinatorHandle,
    ) -> Self {
        Self {
            config,
            producer,
            reports,
        }
    }

    async fn generate(
        producer: Arc<dyn ContentProducer>,
        target: TargetContext,
        file: File,
        buffer_size: usize,
    ) -> Result<u64, WorkerError> {
        let bytes = producer.produce(&target).await?;

        tokio::task::spawn_blocking(move || -> Result<u64, WorkerError> {
            let mut writer = BufWriter::with_capacity(buffer_size, file);
            writer.write_all(&bytes)?;
            writer.flush()?;
            Ok(bytes.len() as u64)
        })
        .await?
    }
}

impl WorkerDispatcher for LocalWorker {
    fn name(&self) -> &str {
        "local"
    }

    fn begin_generation(
        &self,
        job_id: JobId,
        target: &TargetContext,
        handle: TransferableHandle,
    ) -> Result<(), DispatchError> {
        if !self.producer.serves(target) {
            return Err(DispatchError::Unreachable(*target));
        }
        let Some(file) = handle.into_file() else {
            return Err(DispatchError::UnsupportedHandle(*target));
        };

        let producer = Arc::clone(&self.producer);
        let reports = self.reports.clone();
        let buffer_size = self.config.write_buffer_size;
        let target = *target;

        tokio::spawn(async move {
            let size = match Self::generate(producer, target, file, buffer_size).await {
                Ok(written) => {
                    debug!(%job_id, %target, size = written, "Generation finished");
                    i64::try_from(written).unwrap_or(i64::MAX)
                }
                Err(e) => {
                    warn!(%job_id, %target, error = %e, "Generation failed");
                    GENERATION_FAILED
                }
            };
            reports.generation_complete(job_id, size).await;
        });

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_static_content_fallback() {
        let content = StaticContent::new("page");
        let target = TargetContext::new(1, 1);

        assert!(content.serves(&target));
        assert_eq!(content.produce(&target).await.unwrap(), b"page");
    }

    #[tokio::test]
    async fn test_static_content_sessions() {
        let known = TargetContext::new(1, 1);
        let unknown = TargetContext::new(2, 2);
        let content = StaticContent::empty().with_session(known, "session page");

        assert!(content.serves(&known));
        assert!(!content.serves(&unknown));
        assert_eq!(content.produce(&known).await.unwrap(), b"session page");
        assert!(matches!(
            content.produce(&unknown).await,
            Err(WorkerError::NoContent(_))
        ));
    }

    #[tokio::test]
    async fn test_session_content_wins_over_fallback() {
        let target = TargetContext::new(1, 1);
        let content = StaticContent::new("fallback").with_session(target, "specific");

        assert_eq!(content.produce(&target).await.unwrap(), b"specific");
        assert_eq!(
            content.produce(&TargetContext::new(3, 3)).await.unwrap(),
            b"fallback"
        );
    }
}
