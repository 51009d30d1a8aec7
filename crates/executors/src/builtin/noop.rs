// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! No-op step executor.

use std::collections::HashMap;

use async_trait::async_trait;

use crate::error::StepError;
use crate::executor::{EmitHandle, StepContext, StepExecutor};

/// Completes immediately without doing anything. Useful as a DAG joint in
/// requests that need a named node but no actual work (and in tests that
/// only care about ordering).
#[derive(Debug, Clone, Copy, Default)]
pub struct NoOpExecutor;

impl NoOpExecutor {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl StepExecutor for NoOpExecutor {
    async fn run(
        &self,
        _ctx: StepContext,
        _parameters: HashMap<String, serde_json::Value>,
        emit: EmitHandle,
    ) -> Result<(), StepError> {
        emit.emit(100, "no-op");
        Ok(())
    }
}

#[cfg(test)]
#[path = "noop_tests.rs"]
mod tests;
