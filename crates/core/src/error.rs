// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Error kinds surfaced by the orchestrator core.
//!
//! [`ErrorKind`] is the stable vocabulary every component (Manager, JobQueue,
//! OperationService) uses to classify failures; the HTTP adapter maps each
//! kind to an RFC 7807 problem document and status code.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Stable classification for orchestrator failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ErrorKind {
    ValidationFailed,
    NotFound,
    InvalidState,
    QueueFull,
    Timeout,
    Cancelled,
    StepFailed,
    Internal,
}

impl ErrorKind {
    /// Stable URI suffix identifying this kind in a problem document's `type` field.
    pub fn slug(self) -> &'static str {
        match self {
            ErrorKind::ValidationFailed => "validation-failed",
            ErrorKind::NotFound => "not-found",
            ErrorKind::InvalidState => "invalid-state",
            ErrorKind::QueueFull => "queue-full",
            ErrorKind::Timeout => "timeout",
            ErrorKind::Cancelled => "cancelled",
            ErrorKind::StepFailed => "step-failed",
            ErrorKind::Internal => "internal",
        }
    }

    pub fn title(self) -> &'static str {
        match self {
            ErrorKind::ValidationFailed => "Request envelope invalid",
            ErrorKind::NotFound => "Resource not found",
            ErrorKind::InvalidState => "Operation is not in a valid state for this request",
            ErrorKind::QueueFull => "Job queue at capacity",
            ErrorKind::Timeout => "Deadline exceeded",
            ErrorKind::Cancelled => "Request cancelled",
            ErrorKind::StepFailed => "Step executor failed",
            ErrorKind::Internal => "Internal error",
        }
    }
}

/// An orchestrator-level error, carrying a classification plus a detail
/// message safe to surface to HTTP callers.
#[derive(Debug, Clone, Error, PartialEq, Eq, Serialize, Deserialize)]
#[error("{detail}")]
pub struct CoreError {
    pub kind: ErrorKind,
    pub detail: String,
}

impl CoreError {
    pub fn new(kind: ErrorKind, detail: impl Into<String>) -> Self {
        Self {
            kind,
            detail: detail.into(),
        }
    }

    pub fn validation(detail: impl Into<String>) -> Self {
        Self::new(ErrorKind::ValidationFailed, detail)
    }

    pub fn not_found(detail: impl Into<String>) -> Self {
        Self::new(ErrorKind::NotFound, detail)
    }

    pub fn invalid_state(detail: impl Into<String>) -> Self {
        Self::new(ErrorKind::InvalidState, detail)
    }

    pub fn queue_full(detail: impl Into<String>) -> Self {
        Self::new(ErrorKind::QueueFull, detail)
    }

    pub fn timeout(detail: impl Into<String>) -> Self {
        Self::new(ErrorKind::Timeout, detail)
    }

    pub fn cancelled(detail: impl Into<String>) -> Self {
        Self::new(ErrorKind::Cancelled, detail)
    }

    pub fn step_failed(detail: impl Into<String>) -> Self {
        Self::new(ErrorKind::StepFailed, detail)
    }

    pub fn internal(detail: impl Into<String>) -> Self {
        Self::new(ErrorKind::Internal, detail)
    }
}

#[cfg(test)]
#[path = "error_tests.rs"]
mod tests;
