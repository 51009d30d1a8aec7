// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Progress and lifecycle events broadcast to WebSocket subscribers.
//!
//! Events are plain values — never aliased into `OperationState` — so the
//! Broadcaster can freely clone and fan them out without touching the
//! Manager's locked state.

use serde::{Deserialize, Serialize};

use crate::ids::OperationId;

/// Kind of progress or lifecycle notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum EventKind {
    JobQueued,
    OperationStarted,
    StepStarted,
    StepProgress,
    StepCompleted,
    StepFailed,
    OperationCompleted,
    OperationCancelled,
}

/// One progress or lifecycle notification, delivered to zero or more
/// subscribers. Serializes to the wire envelope documented for `GET /ws`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Event {
    #[serde(rename = "type")]
    pub kind: EventKind,
    pub operation_id: OperationId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub step_id: Option<String>,
    pub status: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub progress: Option<u8>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    pub timestamp: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<serde_json::Value>,
}

impl Event {
    pub fn operation(
        kind: EventKind,
        operation_id: OperationId,
        status: impl Into<String>,
        timestamp: u64,
    ) -> Self {
        Self {
            kind,
            operation_id,
            step_id: None,
            status: status.into(),
            progress: None,
            message: None,
            timestamp,
            metadata: None,
        }
    }

    pub fn step(
        kind: EventKind,
        operation_id: OperationId,
        step_id: impl Into<String>,
        status: impl Into<String>,
        timestamp: u64,
    ) -> Self {
        Self {
            kind,
            operation_id,
            step_id: Some(step_id.into()),
            status: status.into(),
            progress: None,
            message: None,
            timestamp,
            metadata: None,
        }
    }

    pub fn with_progress(mut self, progress: u8) -> Self {
        self.progress = Some(progress);
        self
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }
}

#[cfg(test)]
#[path = "event_tests.rs"]
mod tests;
