//! Authoritative `JobId -> Job` mapping.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::transfer::TargetContext;

use super::types::{Job, JobId, JobPhase};

#[derive(Debug, Error)]
pub enum RegistryError {
    /// A live job already uses this id. The rejected job is handed back so
    /// its callback can still be fired.
    #[error("job id already registered: {}", .0.id)]
    DuplicateId(Box<Job>),
}

/// Number of live jobs in each phase.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PhaseCounts {
    pub creating: usize,
    pub generating: usize,
    pub closing: usize,
}

/// Owns every live job. Only the coordinator loop touches it, so it carries
/// no locking of its own.
#[derive(Debug, Default)]
pub struct JobRegistry {
    jobs: HashMap<JobId, Job>,
}

impl JobRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, job: Job) -> Result<(), RegistryError> {
        if self.jobs.contains_key(&job.id) {
            return Err(RegistryError::DuplicateId(Box::new(job)));
        }
        self.jobs.insert(job.id, job);
        Ok(())
    }

    pub fn get(&self, id: JobId) -> Option<&Job> {
        self.jobs.get(&id)
    }

    pub fn get_mut(&mut self, id: JobId) -> Option<&mut Job> {
        self.jobs.get_mut(&id)
    }

    pub fn remove(&mut self, id: JobId) -> Option<Job> {
        self.jobs.remove(&id)
    }

    pub fn contains(&self, id: JobId) -> bool {
        self.jobs.contains_key(&id)
    }

    pub fn len(&self) -> usize {
        self.jobs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.jobs.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Job> {
        self.jobs.values()
    }

    /// Ids of live jobs addressed to `target`.
    pub fn ids_for_target(&self, target: &TargetContext) -> Vec<JobId> {
        self.jobs
            .values()
            .filter(|job| job.target == *target)
            .map(|job| job.id)
            .collect()
    }

    /// Ids of live jobs in `phase`.
    pub fn ids_in_phase(&self, phase: JobPhase) -> Vec<JobId> {
        self.jobs
            .values()
            .filter(|job| job.phase == phase)
            .map(|job| job.id)
            .collect()
    }

    pub fn phase_counts(&self) -> PhaseCounts {
        let mut counts = PhaseCounts::default();
        for job in self.jobs.values() {
            match job.phase {
                JobPhase::Creating => counts.creating += 1,
                JobPhase::Generating => counts.generating += 1,
                JobPhase::Closing => counts.closing += 1,
            }
        }
        counts
    }

    /// Creation time of the oldest live job.
    pub fn oldest_created_at(&self) -> Option<DateTime<Utc>> {
        self.jobs.values().map(|job| job.created_at).min()
    }
}
