//! Shared job status storage.

use crate::job::{JobState, JobStatus};
use chrono::{Duration, Utc};
use std::collections::HashMap;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};
use tracing::{debug, info};

/// Status snapshots keyed by job id.
///
/// Readers always get a snapshot back: unknown ids yield the `not_found`
/// sentinel. Every write stamps the snapshot with the current time, which
/// is what the retention sweep compares against.
pub trait StatusStore: Send + Sync {
    fn get(&self, job_id: &str) -> JobStatus;

    fn put(&self, job_id: &str, status: JobStatus);

    /// Replace the snapshot of `job_id` with `next(current)` only if the job
    /// is currently in state `expected`. Check and write happen under one
    /// lock. On mismatch nothing is written and the actual state is returned.
    fn transition(
        &self,
        job_id: &str,
        expected: JobState,
        next: &dyn Fn(&JobStatus) -> JobStatus,
    ) -> Result<JobStatus, JobState>;

    /// Drop every snapshot last written more than `max_age` ago and return
    /// the evicted job ids.
    fn sweep_older_than(&self, max_age: Duration) -> Vec<String>;
}

#[derive(Debug, Default)]
pub struct InMemoryStatusStore {
    jobs: RwLock<HashMap<String, JobStatus>>,
}

impl InMemoryStatusStore {
    pub fn new() -> Self {
        Self::default()
    }

    // A panicking writer cannot leave a half-written snapshot behind, so a
    // poisoned lock is still safe to use.
    fn read(&self) -> RwLockReadGuard<'_, HashMap<String, JobStatus>> {
        self.jobs.read().unwrap_or_else(|e| e.into_inner())
    }

    fn write(&self) -> RwLockWriteGuard<'_, HashMap<String, JobStatus>> {
        self.jobs.write().unwrap_or_else(|e| e.into_inner())
    }

    pub fn len(&self) -> usize {
        self.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.read().is_empty()
    }
}

impl StatusStore for InMemoryStatusStore {
    fn get(&self, job_id: &str) -> JobStatus {
        self.read()
            .get(job_id)
            .cloned()
            .unwrap_or_else(JobStatus::not_found)
    }

    fn put(&self, job_id: &str, mut status: JobStatus) {
        status.timestamp = Some(Utc::now());
        debug!("Job {} is now {:?}", job_id, status.status);
        self.write().insert(job_id.to_string(), status);
    }

    fn transition(
        &self,
        job_id: &str,
        expected: JobState,
        next: &dyn Fn(&JobStatus) -> JobStatus,
    ) -> Result<JobStatus, JobState> {
        let mut jobs = self.write();
        let Some(current) = jobs.get_mut(job_id) else {
            return Err(JobState::NotFound);
        };
        if current.status != expected {
            return Err(current.status);
        }

        let mut status = next(current);
        status.timestamp = Some(Utc::now());
        debug!("Job {} moved from {} to {}", job_id, expected, status.status);
        *current = status.clone();
        Ok(status)
    }

    fn sweep_older_than(&self, max_age: Duration) -> Vec<String> {
        let cutoff = Utc::now() - max_age;
        let mut jobs = self.write();

        let expired: Vec<String> = jobs
            .iter()
            .filter(|(_, status)| status.timestamp.map_or(true, |ts| ts < cutoff))
            .map(|(id, _)| id.clone())
            .collect();

        for id in &expired {
            jobs.remove(id);
        }

        if !expired.is_empty() {
            info!("Evicted {} expired job(s)", expired.len());
        }
        expired
    }
}
