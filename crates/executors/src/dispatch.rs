// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Maps step type ids to the executor instance that runs them.
//!
//! Kept separate from `isxops-registry`'s `StepDefinition` (timeout, retry
//! policy, display name) because those are declarative data the HTTP layer
//! serializes back to clients, while an executor is a live trait object the
//! Manager calls into. A type id is only runnable once it has entries in
//! both.

use std::collections::HashMap;
use std::sync::Arc;

use isxops_core::CoreError;

use crate::executor::StepExecutor;

/// Read-only-after-construction map from step type id to its executor.
#[derive(Clone, Default)]
pub struct ExecutorDispatch {
    executors: HashMap<String, Arc<dyn StepExecutor>>,
}

impl ExecutorDispatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(mut self, type_id: impl Into<String>, executor: Arc<dyn StepExecutor>) -> Self {
        self.executors.insert(type_id.into(), executor);
        self
    }

    pub fn get(&self, type_id: &str) -> Result<Arc<dyn StepExecutor>, CoreError> {
        self.executors
            .get(type_id)
            .cloned()
            .ok_or_else(|| CoreError::validation(format!("no executor registered for type '{type_id}'")))
    }

    pub fn contains(&self, type_id: &str) -> bool {
        self.executors.contains_key(type_id)
    }
}

#[cfg(test)]
#[path = "dispatch_tests.rs"]
mod tests;
