// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Fake step executor for testing the Manager and JobQueue without a real
//! data pipeline behind them.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;

use crate::error::StepError;
use crate::executor::{EmitHandle, StepContext, StepExecutor};

/// One recorded invocation.
#[derive(Debug, Clone)]
pub struct FakeRun {
    pub step_id: String,
    pub attempt: u32,
    pub parameters: HashMap<String, serde_json::Value>,
}

struct FakeExecutorState {
    runs: Vec<FakeRun>,
    result: Result<(), StepError>,
}

/// Step executor that records every invocation and returns a fixed,
/// configurable result. Defaults to succeeding.
#[derive(Clone)]
pub struct FakeExecutor {
    inner: Arc<Mutex<FakeExecutorState>>,
}

impl Default for FakeExecutor {
    fn default() -> Self {
        Self {
            inner: Arc::new(Mutex::new(FakeExecutorState {
                runs: Vec::new(),
                result: Ok(()),
            })),
        }
    }
}

impl FakeExecutor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every future `run` call returns this result instead of `Ok(())`.
    pub fn set_result(&self, result: Result<(), StepError>) {
        self.inner.lock().result = result;
    }

    pub fn runs(&self) -> Vec<FakeRun> {
        self.inner.lock().runs.clone()
    }

    pub fn run_count(&self) -> usize {
        self.inner.lock().runs.len()
    }
}

#[async_trait]
impl StepExecutor for FakeExecutor {
    async fn run(
        &self,
        ctx: StepContext,
        parameters: HashMap<String, serde_json::Value>,
        emit: EmitHandle,
    ) -> Result<(), StepError> {
        let mut state = self.inner.lock();
        state.runs.push(FakeRun {
            step_id: ctx.step_id.clone(),
            attempt: ctx.attempt,
            parameters,
        });
        let result = state.result.clone();
        drop(state);
        if result.is_ok() {
            emit.emit(100, "fake run completed");
        }
        result
    }
}

#[cfg(test)]
#[path = "fake_tests.rs"]
mod tests;
