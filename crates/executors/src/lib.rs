// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! isxops-executors: the `StepExecutor` contract and the built-in executors
//! used to exercise the Manager without a real data pipeline behind it.
//!
//! The orchestrator core knows nothing about scraping, Excel parsing, or
//! liquidity analysis; it only knows how to call `StepExecutor::run` for a
//! type id it looked up in the Registry. Real step implementations live
//! outside this workspace and plug in the same way the executors here do.

mod dispatch;
mod error;
mod executor;

pub mod builtin;

pub use dispatch::ExecutorDispatch;
pub use error::{StepError, StepErrorKind};
pub use executor::{EmitHandle, StepContext, StepExecutor};

#[cfg(any(test, feature = "test-support"))]
mod fake;
#[cfg(any(test, feature = "test-support"))]
pub use fake::{FakeExecutor, FakeRun};
