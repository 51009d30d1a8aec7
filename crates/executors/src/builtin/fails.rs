// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Step executor that always fails. Its failure is fatal by default so
//! dependents transition straight to `skipped` instead of retrying forever;
//! set `retryable: true` in parameters to exercise the retry path instead.

use std::collections::HashMap;

use async_trait::async_trait;

use crate::error::StepError;
use crate::executor::{EmitHandle, StepContext, StepExecutor};

#[derive(Debug, Clone, Copy, Default)]
pub struct FailsExecutor;

impl FailsExecutor {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl StepExecutor for FailsExecutor {
    async fn run(
        &self,
        _ctx: StepContext,
        parameters: HashMap<String, serde_json::Value>,
        _emit: EmitHandle,
    ) -> Result<(), StepError> {
        let retryable = parameters
            .get("retryable")
            .and_then(|v| v.as_bool())
            .unwrap_or(false);

        let message = parameters
            .get("message")
            .and_then(|v| v.as_str())
            .unwrap_or("step configured to fail")
            .to_string();

        if retryable {
            Err(StepError::retryable(message))
        } else {
            Err(StepError::fatal(message))
        }
    }
}

#[cfg(test)]
#[path = "fails_tests.rs"]
mod tests;
