// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Wires the built-in step types into a `Registry` + `ExecutorDispatch` pair.
//!
//! Real data-pipeline step types (scraping, Excel parsing, liquidity
//! analysis, ...) are out of scope here; the built-ins let the orchestrator
//! be exercised end-to-end without them.

use std::sync::Arc;
use std::time::Duration;

use isxops_executors::builtin::{EchoExecutor, FailsExecutor, NoOpExecutor, SlowExecutor};
use isxops_executors::{ExecutorDispatch, StepExecutor};
use isxops_registry::{BackoffPolicy, Registry, StepDefinition};

use crate::config::{default_retries, default_step_timeout, ConfigError};

/// Build the Registry + ExecutorDispatch pair for the `echo`, `noop`,
/// `slow`, and `fails` built-in step types, using `ISXOPS_DEFAULT_*` as the
/// shared default timeout/retry policy.
pub fn builtins() -> Result<(Registry, ExecutorDispatch), ConfigError> {
    let timeout = default_step_timeout()?;
    let retries = default_retries()?;
    let retry_policy = BackoffPolicy::new(Duration::from_millis(200), 2.0, Duration::from_secs(30), retries + 1);

    let registry = Registry::new()
        .register(definition("echo", "Echo", timeout, retry_policy))
        .register(definition("noop", "No-op", timeout, retry_policy))
        .register(definition("slow", "Slow", timeout, retry_policy))
        .register(definition("fails", "Fails", timeout, retry_policy));

    let dispatch = ExecutorDispatch::new()
        .register("echo", Arc::new(EchoExecutor::new()) as Arc<dyn StepExecutor>)
        .register("noop", Arc::new(NoOpExecutor::new()) as Arc<dyn StepExecutor>)
        .register("slow", Arc::new(SlowExecutor::new()) as Arc<dyn StepExecutor>)
        .register("fails", Arc::new(FailsExecutor::new()) as Arc<dyn StepExecutor>);

    Ok((registry, dispatch))
}

fn definition(type_id: &str, name: &str, timeout: Duration, retry_policy: BackoffPolicy) -> StepDefinition {
    StepDefinition::new(type_id, name)
        .with_timeout(timeout)
        .with_retry_policy(retry_policy)
}
