// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The [`StepExecutor`] contract: the single seam between the orchestrator
//! core and whatever does a step's actual work (scraping, parsing, the rest
//! of the data pipeline). The core invokes executors by type id; it never
//! knows what any of them do.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use isxops_core::OperationId;
use tokio_util::sync::CancellationToken;

use crate::error::StepError;

/// Everything an executor needs to know about the attempt it is running,
/// short of the parameters themselves.
#[derive(Clone)]
pub struct StepContext {
    pub operation_id: OperationId,
    pub step_id: String,
    /// 0 on the first attempt, incrementing on each retry.
    pub attempt: u32,
    cancellation: CancellationToken,
}

impl StepContext {
    pub fn new(
        operation_id: OperationId,
        step_id: impl Into<String>,
        attempt: u32,
        cancellation: CancellationToken,
    ) -> Self {
        Self {
            operation_id,
            step_id: step_id.into(),
            attempt,
            cancellation,
        }
    }

    /// True once the Manager has cancelled this step (directly, or because
    /// its operation was cancelled).
    pub fn is_cancelled(&self) -> bool {
        self.cancellation.is_cancelled()
    }

    /// Resolves once this step is cancelled. Executors doing blocking I/O
    /// should race this against their own work with `tokio::select!`.
    pub async fn cancelled(&self) {
        self.cancellation.cancelled().await
    }
}

/// Callback an executor uses to report progress. Cheap to clone; safe to
/// hand to spawned subtasks.
#[derive(Clone)]
pub struct EmitHandle {
    sink: Arc<dyn Fn(u8, String) + Send + Sync>,
}

impl EmitHandle {
    pub fn new(sink: impl Fn(u8, String) + Send + Sync + 'static) -> Self {
        Self {
            sink: Arc::new(sink),
        }
    }

    /// `progress` is clamped to 0..=100. Must not be called after `run`
    /// returns.
    pub fn emit(&self, progress: u8, message: impl Into<String>) {
        (self.sink)(progress.min(100), message.into());
    }
}

/// A pluggable unit of work the Manager invokes for one DAG node.
///
/// Implementations must honour `ctx.cancelled()` promptly: returning
/// `Err(StepError::cancelled())` (or any error at all) after observing
/// cancellation is fine, but calling `emit` after returning is not.
#[async_trait]
pub trait StepExecutor: Send + Sync + 'static {
    async fn run(
        &self,
        ctx: StepContext,
        parameters: HashMap<String, serde_json::Value>,
        emit: EmitHandle,
    ) -> Result<(), StepError>;
}

#[cfg(test)]
#[path = "executor_tests.rs"]
mod tests;
