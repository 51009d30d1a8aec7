// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! isxops-registry: declarative step-type definitions.
//!
//! Populated once at process start and read-only thereafter — lookups never
//! take a write lock, so the Manager can consult the Registry from any
//! number of concurrent step invocations without contention.

mod definition;

pub use definition::{BackoffPolicy, StepDefinition, StepDefinitionSummary};

use indexmap::IndexMap;
use isxops_core::CoreError;

/// Read-only-after-construction map of step-type id to its definition.
///
/// `IndexMap` preserves registration order so `List()` (and the `/types`
/// endpoint it backs) returns a stable, predictable ordering instead of
/// hash-bucket order.
#[derive(Debug, Clone, Default)]
pub struct Registry {
    definitions: IndexMap<String, StepDefinition>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a step type. Returns `self` for fluent construction at
    /// startup (`Registry::new().register(..).register(..)`).
    pub fn register(mut self, definition: StepDefinition) -> Self {
        self.definitions.insert(definition.type_id.clone(), definition);
        self
    }

    pub fn lookup(&self, type_id: &str) -> Result<&StepDefinition, CoreError> {
        self.definitions
            .get(type_id)
            .ok_or_else(|| CoreError::validation(format!("unknown step type '{type_id}'")))
    }

    pub fn contains(&self, type_id: &str) -> bool {
        self.definitions.contains_key(type_id)
    }

    pub fn list(&self) -> impl Iterator<Item = &StepDefinition> {
        self.definitions.values()
    }

    pub fn len(&self) -> usize {
        self.definitions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.definitions.is_empty()
    }
}

#[cfg(test)]
#[path = "lib_tests.rs"]
mod tests;
