// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Slow step executor: sleeps for a configurable duration, racing the sleep
//! against cancellation. Grounds the "parallel siblings overlap" and
//! "cancel mid-flight" scenarios without needing real I/O.

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use tokio::time::sleep;

use crate::error::StepError;
use crate::executor::{EmitHandle, StepContext, StepExecutor};

const DEFAULT_DURATION_MS: u64 = 200;

#[derive(Debug, Clone, Copy, Default)]
pub struct SlowExecutor;

impl SlowExecutor {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl StepExecutor for SlowExecutor {
    async fn run(
        &self,
        ctx: StepContext,
        parameters: HashMap<String, serde_json::Value>,
        emit: EmitHandle,
    ) -> Result<(), StepError> {
        let duration_ms = parameters
            .get("duration_ms")
            .and_then(|v| v.as_u64())
            .unwrap_or(DEFAULT_DURATION_MS);

        emit.emit(0, "started");

        tokio::select! {
            _ = sleep(Duration::from_millis(duration_ms)) => {
                emit.emit(100, "completed");
                Ok(())
            }
            _ = ctx.cancelled() => Err(StepError::cancelled()),
        }
    }
}

#[cfg(test)]
#[path = "slow_tests.rs"]
mod tests;
