// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! In-memory job retention.
//!
//! The 202-plus-poll pattern is load-bearing: an HTTP caller gets back a
//! `poll_url` before the job finishes, so terminal job records must outlive
//! the worker that produced them. `JobStore` keeps every job — active or
//! terminal — behind a single mutex, and sweeps jobs whose retention TTL
//! has elapsed whenever it is consulted. An active job is never evicted,
//! no matter how old it is.

use std::collections::HashMap;
use std::time::Duration;

use isxops_core::{Clock, CoreError, OperationId};
use parking_lot::Mutex;

use crate::job::{Job, JobStatus};

/// Selects a subset of jobs for `JobStore::list`.
#[derive(Debug, Clone, Default)]
pub struct JobFilter {
    pub status: Option<JobStatus>,
    pub operation_id: Option<OperationId>,
    /// Matches jobs whose request declares a step with this id.
    pub stage_id: Option<String>,
    pub limit: Option<usize>,
}

/// Aggregate counts the `/operations/jobs` endpoint surfaces alongside a
/// listing.
#[derive(Debug, Clone, Copy, Default, serde::Serialize)]
pub struct JobStats {
    pub pending: usize,
    pub running: usize,
    pub cancelling: usize,
    pub completed: usize,
    pub failed: usize,
    pub cancelled: usize,
}

impl JobStats {
    fn record(&mut self, status: JobStatus) {
        match status {
            JobStatus::Pending => self.pending += 1,
            JobStatus::Running => self.running += 1,
            JobStatus::Cancelling => self.cancelling += 1,
            JobStatus::Completed => self.completed += 1,
            JobStatus::Failed => self.failed += 1,
            JobStatus::Cancelled => self.cancelled += 1,
        }
    }
}

pub struct JobStore<C: Clock> {
    jobs: Mutex<HashMap<OperationId, Job>>,
    retention: Duration,
    clock: C,
}

impl<C: Clock> JobStore<C> {
    pub fn new(retention: Duration, clock: C) -> Self {
        Self {
            jobs: Mutex::new(HashMap::new()),
            retention,
            clock,
        }
    }

    pub fn insert(&self, job: Job) {
        self.jobs.lock().insert(job.id.clone(), job);
    }

    /// Apply `f` to the job if present; no-op (and `false`) if unknown.
    pub fn update(&self, id: &OperationId, f: impl FnOnce(&mut Job)) -> bool {
        let mut jobs = self.jobs.lock();
        match jobs.get_mut(id) {
            Some(job) => {
                f(job);
                true
            }
            None => false,
        }
    }

    pub fn get(&self, id: &OperationId) -> Result<Job, CoreError> {
        let mut jobs = self.jobs.lock();
        self.sweep(&mut jobs);
        jobs.get(id)
            .cloned()
            .ok_or_else(|| CoreError::not_found(format!("job '{id}' not found")))
    }

    pub fn remove(&self, id: &OperationId) -> Option<Job> {
        self.jobs.lock().remove(id)
    }

    pub fn list(&self, filter: &JobFilter) -> Vec<Job> {
        let mut jobs = self.jobs.lock();
        self.sweep(&mut jobs);

        let mut matched: Vec<Job> = jobs
            .values()
            .filter(|job| filter.status.map_or(true, |s| job.status == s))
            .filter(|job| {
                filter
                    .operation_id
                    .as_ref()
                    .map_or(true, |id| &job.id == id)
            })
            .filter(|job| {
                filter
                    .stage_id
                    .as_ref()
                    .map_or(true, |id| job.request.steps.iter().any(|s| &s.id == id))
            })
            .cloned()
            .collect();

        matched.sort_unstable_by(|a, b| b.created_at_ms.cmp(&a.created_at_ms));
        if let Some(limit) = filter.limit {
            matched.truncate(limit);
        }
        matched
    }

    pub fn stats(&self) -> JobStats {
        let mut jobs = self.jobs.lock();
        self.sweep(&mut jobs);

        let mut stats = JobStats::default();
        for job in jobs.values() {
            stats.record(job.status);
        }
        stats
    }

    pub fn len(&self) -> usize {
        self.jobs.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn sweep(&self, jobs: &mut HashMap<OperationId, Job>) {
        let now = self.clock.epoch_ms();
        let retention_ms = self.retention.as_millis() as u64;
        jobs.retain(|_, job| match job.completed_at_ms {
            Some(completed_at) if job.status.is_terminal() => {
                now.saturating_sub(completed_at) < retention_ms
            }
            _ => true,
        });
    }
}

#[cfg(test)]
#[path = "store_tests.rs"]
mod tests;
