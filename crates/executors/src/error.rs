// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Errors a [`crate::StepExecutor`] can return.

use isxops_core::CoreError;
use thiserror::Error;

/// How the Manager should treat a failed attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepErrorKind {
    /// Eligible for another attempt under the step's retry policy.
    Retryable,
    /// Never retried, regardless of the step's retry policy.
    Fatal,
    /// The executor observed cancellation and stopped promptly.
    Cancelled,
    /// The executor's own deadline elapsed.
    Timeout,
}

/// An executor's failure report for one attempt.
///
/// Retries never apply to `Cancelled` or `Timeout` outcomes even if the
/// step's retry policy has attempts remaining.
#[derive(Debug, Clone, Error)]
#[error("{message}")]
pub struct StepError {
    pub kind: StepErrorKind,
    pub message: String,
}

impl StepError {
    pub fn retryable(message: impl Into<String>) -> Self {
        Self {
            kind: StepErrorKind::Retryable,
            message: message.into(),
        }
    }

    pub fn fatal(message: impl Into<String>) -> Self {
        Self {
            kind: StepErrorKind::Fatal,
            message: message.into(),
        }
    }

    pub fn cancelled() -> Self {
        Self {
            kind: StepErrorKind::Cancelled,
            message: "step cancelled".to_string(),
        }
    }

    pub fn timeout() -> Self {
        Self {
            kind: StepErrorKind::Timeout,
            message: "step deadline exceeded".to_string(),
        }
    }

    pub fn is_retryable(&self) -> bool {
        self.kind == StepErrorKind::Retryable
    }
}

impl From<StepError> for CoreError {
    fn from(err: StepError) -> Self {
        match err.kind {
            StepErrorKind::Retryable | StepErrorKind::Fatal => CoreError::step_failed(err.message),
            StepErrorKind::Cancelled => CoreError::cancelled(err.message),
            StepErrorKind::Timeout => CoreError::timeout(err.message),
        }
    }
}

#[cfg(test)]
#[path = "error_tests.rs"]
mod tests;
