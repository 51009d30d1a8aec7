// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Thin facade over `JobQueue` + `Registry`, the seam the HTTP adapter talks
//! to. Every method is async and returns value copies — nothing here hands
//! out a reference into live state.

use std::sync::Arc;
use std::time::Duration;

use isxops_core::{Clock, CoreError, IdGen, OperationId, OperationRequest, OperationState, OperationStatus, UuidIdGen};
use isxops_engine::Broadcaster;
use isxops_queue::{JobQueue, JobQueueStats};
use isxops_registry::{Registry, StepDefinitionSummary};
use isxops_storage::{Job, JobFilter};

/// Outcome of accepting a request: enough to build the HTTP 202 body.
pub struct Accepted {
    pub job_id: OperationId,
    pub operation_id: OperationId,
}

pub struct OperationService<C: Clock, G: IdGen = UuidIdGen> {
    queue: Arc<JobQueue<C, G>>,
    registry: Registry,
}

impl<C: Clock, G: IdGen> OperationService<C, G> {
    pub fn new(queue: Arc<JobQueue<C, G>>, registry: Registry) -> Self {
        Self { queue, registry }
    }

    pub fn broadcaster(&self) -> &Broadcaster {
        self.queue.broadcaster()
    }

    pub async fn execute(&self, request: OperationRequest) -> Result<Accepted, CoreError> {
        let job_id = self.queue.enqueue(request)?;
        Ok(Accepted {
            job_id: job_id.clone(),
            operation_id: job_id,
        })
    }

    pub async fn get_job(&self, id: &OperationId) -> Result<Job, CoreError> {
        self.queue.get_job(id)
    }

    pub async fn list_jobs(&self, filter: JobFilter) -> (Vec<Job>, JobQueueStats) {
        (self.queue.list_jobs(&filter), self.queue.stats())
    }

    pub async fn get_status(&self, id: &OperationId) -> Result<OperationState, CoreError> {
        self.queue.operation_state(id)
    }

    pub async fn list(&self, status: Option<OperationStatus>) -> Vec<OperationState> {
        self.queue.list_operation_states(status)
    }

    pub async fn cancel(&self, id: &OperationId) -> Result<(), CoreError> {
        self.queue.cancel(id)
    }

    pub fn list_types(&self) -> Vec<StepDefinitionSummary> {
        self.registry.list().map(StepDefinitionSummary::from).collect()
    }

    /// Stop accepting new jobs and drain the underlying queue. See
    /// `isxops_queue::JobQueue::shutdown` for the grace-period semantics.
    pub async fn shutdown(&self, grace: Duration) {
        self.queue.shutdown(grace).await;
    }
}

#[cfg(test)]
#[path = "service_tests.rs"]
mod tests;
