// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Echo step executor: walks progress from 0 to 100 in `n` increments,
//! echoing the step's parameters back as its message. Used by tests and
//! smoke requests that just want to see a step move through its lifecycle.

use std::collections::HashMap;

use async_trait::async_trait;

use crate::error::StepError;
use crate::executor::{EmitHandle, StepContext, StepExecutor};

#[derive(Debug, Clone, Copy, Default)]
pub struct EchoExecutor;

impl EchoExecutor {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl StepExecutor for EchoExecutor {
    async fn run(
        &self,
        ctx: StepContext,
        parameters: HashMap<String, serde_json::Value>,
        emit: EmitHandle,
    ) -> Result<(), StepError> {
        let steps = parameters
            .get("n")
            .and_then(|v| v.as_u64())
            .unwrap_or(1)
            .clamp(1, 100);

        for i in 1..=steps {
            if ctx.is_cancelled() {
                return Err(StepError::cancelled());
            }
            let progress = (i * 100 / steps) as u8;
            emit.emit(progress, format!("echo {i}/{steps}"));
            tokio::task::yield_now().await;
        }

        Ok(())
    }
}

#[cfg(test)]
#[path = "echo_tests.rs"]
mod tests;
