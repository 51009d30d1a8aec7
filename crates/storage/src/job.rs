// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! [`Job`]: the JobQueue-visible twin of an operation.

use std::collections::HashMap;

use isxops_core::{OperationId, OperationRequest};
use serde::{Deserialize, Serialize};

/// Coarse job-queue status. Distinct from [`isxops_core::OperationStatus`]:
/// a job additionally has a `cancelling` transitional state between a
/// cancel request landing and the Manager actually tearing the operation
/// down.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    Pending,
    Running,
    Cancelling,
    Completed,
    Failed,
    Cancelled,
}

impl JobStatus {
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            JobStatus::Completed | JobStatus::Failed | JobStatus::Cancelled
        )
    }
}

/// The queue-visible twin of an operation: id (shared with the operation),
/// coarse progress, timestamps, the original request, and whatever error
/// terminated it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Job {
    pub id: OperationId,
    pub status: JobStatus,
    /// 0..100, derived from step weights by the Manager as it reports
    /// progress back to the queue.
    pub progress: u8,
    pub created_at_ms: u64,
    pub started_at_ms: Option<u64>,
    pub completed_at_ms: Option<u64>,
    pub request: OperationRequest,
    pub error: Option<String>,
    #[serde(default)]
    pub metadata: HashMap<String, serde_json::Value>,
}

impl Job {
    pub fn new(id: OperationId, request: OperationRequest, created_at_ms: u64) -> Self {
        Self {
            id,
            status: JobStatus::Pending,
            progress: 0,
            created_at_ms,
            started_at_ms: None,
            completed_at_ms: None,
            request,
            error: None,
            metadata: HashMap::new(),
        }
    }

    pub fn mark_running(&mut self, now_ms: u64) {
        self.status = JobStatus::Running;
        self.started_at_ms = Some(now_ms);
    }

    pub fn mark_cancelling(&mut self) {
        if !self.status.is_terminal() {
            self.status = JobStatus::Cancelling;
        }
    }

    pub fn set_progress(&mut self, progress: u8) {
        self.progress = progress.min(100);
    }

    pub fn finish(&mut self, status: JobStatus, error: Option<String>, now_ms: u64) {
        debug_assert!(status.is_terminal());
        self.status = status;
        if status == JobStatus::Completed {
            self.progress = 100;
        }
        self.error = error;
        self.completed_at_ms = Some(now_ms);
    }

    pub fn is_complete(&self) -> bool {
        self.status.is_terminal()
    }
}

#[cfg(test)]
#[path = "job_tests.rs"]
mod tests;
