// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! In-memory record of one operation run, owned exclusively by its Manager.
//!
//! External readers only ever see a deep-copied [`OperationState`] snapshot
//! (see `Manager::status` in `isxops-engine`) — nothing outside the Manager
//! holds a mutable reference to the live copy.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::ids::OperationId;

/// Status of an entire operation run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OperationStatus {
    Pending,
    Running,
    Completed,
    Failed,
    Cancelled,
}

impl OperationStatus {
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            OperationStatus::Completed | OperationStatus::Failed | OperationStatus::Cancelled
        )
    }
}

/// Status of a single step within an operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StepStatus {
    Pending,
    Running,
    Completed,
    Failed,
    Skipped,
    Cancelled,
}

impl StepStatus {
    /// Terminal states are absorbing until an explicit resume-mode reset.
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            StepStatus::Completed
                | StepStatus::Failed
                | StepStatus::Skipped
                | StepStatus::Cancelled
        )
    }

    /// Whether this status satisfies a dependent step's "ready" condition.
    pub fn satisfies_dependency(self) -> bool {
        matches!(self, StepStatus::Completed | StepStatus::Skipped)
    }
}

/// Per-step progress, timing and error record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StepState {
    pub id: String,
    pub name: String,
    pub status: StepStatus,
    /// Monotonically non-decreasing within a single `running` episode; reset
    /// to 0 on the start of each retry attempt.
    pub progress: u8,
    pub message: Option<String>,
    pub started_at_ms: Option<u64>,
    pub ended_at_ms: Option<u64>,
    pub error: Option<String>,
    /// Number of attempts made so far (including the current one).
    pub attempt: u32,
}

impl StepState {
    pub fn pending(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            status: StepStatus::Pending,
            progress: 0,
            message: None,
            started_at_ms: None,
            ended_at_ms: None,
            error: None,
            attempt: 0,
        }
    }

    /// Set progress, enforcing monotonic non-decrease within the current
    /// attempt. A no-op (rather than a panic) on regression: a misbehaving
    /// executor must not be able to corrupt the state machine.
    pub fn set_progress(&mut self, progress: u8, message: Option<String>) {
        let progress = progress.min(100);
        if progress >= self.progress {
            self.progress = progress;
        }
        if message.is_some() {
            self.message = message;
        }
    }

    pub fn start(&mut self, attempt: u32, epoch_ms: u64) {
        self.status = StepStatus::Running;
        self.attempt = attempt;
        self.progress = 0;
        self.message = None;
        self.error = None;
        self.started_at_ms = Some(epoch_ms);
        self.ended_at_ms = None;
    }

    pub fn finish(&mut self, status: StepStatus, error: Option<String>, epoch_ms: u64) {
        debug_assert!(status.is_terminal());
        self.status = status;
        if status == StepStatus::Completed {
            self.progress = 100;
        }
        self.error = error;
        self.ended_at_ms = Some(epoch_ms);
    }
}

/// In-memory record of one operation run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OperationState {
    pub id: OperationId,
    pub status: OperationStatus,
    pub started_at_ms: Option<u64>,
    pub ended_at_ms: Option<u64>,
    pub error: Option<String>,
    /// Insertion-ordered so snapshots render steps in a stable, request order.
    pub steps: Vec<StepState>,
}

impl OperationState {
    pub fn new(id: OperationId, step_ids: &[(String, String)]) -> Self {
        Self {
            id,
            status: OperationStatus::Pending,
            started_at_ms: None,
            ended_at_ms: None,
            error: None,
            steps: step_ids
                .iter()
                .map(|(id, name)| StepState::pending(id.clone(), name.clone()))
                .collect(),
        }
    }

    pub fn step(&self, id: &str) -> Option<&StepState> {
        self.steps.iter().find(|s| s.id == id)
    }

    pub fn step_mut(&mut self, id: &str) -> Option<&mut StepState> {
        self.steps.iter_mut().find(|s| s.id == id)
    }

    pub fn step_ids(&self) -> impl Iterator<Item = &str> {
        self.steps.iter().map(|s| s.id.as_str())
    }

    pub fn all_terminal(&self) -> bool {
        self.steps.iter().all(|s| s.status.is_terminal())
    }

    pub fn any_running(&self) -> bool {
        self.steps.iter().any(|s| s.status == StepStatus::Running)
    }

    /// Implementation-defined resume policy (Open Question in the design
    /// notes): only `running`/`cancelled` steps left over from a crashed
    /// prior attempt are reset to `pending` so the Manager re-schedules
    /// them. `completed`, `failed`, and `skipped` steps preserve their
    /// terminal outcome as-is.
    pub fn reset_for_resume(&mut self) {
        for step in &mut self.steps {
            if matches!(step.status, StepStatus::Running | StepStatus::Cancelled) {
                *step = StepState::pending(step.id.clone(), step.name.clone());
            }
        }
        self.status = OperationStatus::Pending;
        self.error = None;
        self.ended_at_ms = None;
    }
}

#[cfg(test)]
#[path = "state_tests.rs"]
mod tests;
