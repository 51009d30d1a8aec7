// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Tuning knobs for a `JobQueue` that do not vary per-request.

use std::time::Duration;

use isxops_engine::ManagerConfig;

/// Construction-time configuration for a [`crate::JobQueue`].
#[derive(Debug, Clone)]
pub struct QueueConfig {
    /// Number of worker tasks, fixed for the queue's lifetime.
    pub workers: usize,
    /// Maximum number of jobs awaiting a worker at once.
    pub capacity: usize,
    /// How long a terminal job record is kept around for late pollers.
    pub retention: Duration,
    /// Passed through to each operation's `Manager`.
    pub manager: ManagerConfig,
}

impl Default for QueueConfig {
    fn default() -> Self {
        Self {
            workers: 4,
            capacity: 256,
            retention: Duration::from_secs(600),
            manager: ManagerConfig::default(),
        }
    }
}
