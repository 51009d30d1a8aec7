// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! isxops-queue: the bounded FIFO and fixed-size worker pool that turns
//! many concurrent `OperationRequest`s into a small number of
//! `isxops-engine::Manager` runs.
//!
//! A `JobQueue` owns every `Job` (via `isxops-storage::JobStore`) and every
//! live `OperationState` for as long as either is needed: jobs for the
//! 202-poll pattern, operation state for `GET /operations/{id}/status`.
//! Workers are plain tokio tasks pulling from a `Mutex`-guarded pending
//! list; `Enqueue` never blocks the caller, and a full queue is rejected
//! rather than awaited.

mod config;
mod queue;

pub use config::QueueConfig;
pub use queue::{JobQueue, JobQueueStats};

#[cfg(test)]
#[path = "queue_tests.rs"]
mod tests;
