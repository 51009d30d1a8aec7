// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Declarative step-type definitions.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Exponential backoff with a hard cap, used between retry attempts of a
/// single step.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BackoffPolicy {
    pub initial_delay: Duration,
    pub multiplier: f64,
    pub cap: Duration,
    pub max_attempts: u32,
}

impl BackoffPolicy {
    pub const fn new(initial_delay: Duration, multiplier: f64, cap: Duration, max_attempts: u32) -> Self {
        Self {
            initial_delay,
            multiplier,
            cap,
            max_attempts,
        }
    }

    /// Delay before the given attempt number (1-indexed: the delay before
    /// the *second* attempt is `delay_for(1)`).
    pub fn delay_for(&self, attempt: u32) -> Duration {
        if attempt == 0 {
            return Duration::ZERO;
        }
        let factor = self.multiplier.powi(attempt as i32 - 1);
        let millis = (self.initial_delay.as_millis() as f64 * factor).min(self.cap.as_millis() as f64);
        Duration::from_millis(millis.max(0.0) as u64)
    }
}

impl Default for BackoffPolicy {
    fn default() -> Self {
        Self::new(Duration::from_millis(200), 2.0, Duration::from_secs(30), 3)
    }
}

/// A registered step type: what the Manager knows about a kind of step
/// before any request references it.
#[derive(Debug, Clone)]
pub struct StepDefinition {
    pub type_id: String,
    pub name: String,
    pub default_timeout: Duration,
    pub retry_policy: BackoffPolicy,
    /// Whether an operation continues past this step failing (its
    /// dependents are `skipped`, not the whole run failed-fast). Default
    /// false: most steps are load-bearing.
    pub recoverable: bool,
}

impl StepDefinition {
    pub fn new(type_id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            type_id: type_id.into(),
            name: name.into(),
            default_timeout: Duration::from_secs(60),
            retry_policy: BackoffPolicy::default(),
            recoverable: false,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.default_timeout = timeout;
        self
    }

    pub fn with_retry_policy(mut self, policy: BackoffPolicy) -> Self {
        self.retry_policy = policy;
        self
    }

    pub fn recoverable(mut self) -> Self {
        self.recoverable = true;
        self
    }
}

/// Listing entry for `GET /operations/types`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StepDefinitionSummary {
    pub type_id: String,
    pub name: String,
    pub default_timeout_ms: u64,
    pub max_attempts: u32,
    pub recoverable: bool,
}

impl From<&StepDefinition> for StepDefinitionSummary {
    fn from(def: &StepDefinition) -> Self {
        Self {
            type_id: def.type_id.clone(),
            name: def.name.clone(),
            default_timeout_ms: def.default_timeout.as_millis() as u64,
            max_attempts: def.retry_policy.max_attempts,
            recoverable: def.recoverable,
        }
    }
}

#[cfg(test)]
#[path = "definition_tests.rs"]
mod tests;
