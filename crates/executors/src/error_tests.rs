// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use isxops_core::ErrorKind;

#[test]
fn retryable_is_retryable() {
    assert!(StepError::retryable("flaky").is_retryable());
}

#[test]
fn fatal_is_not_retryable() {
    assert!(!StepError::fatal("bad input").is_retryable());
}

#[test]
fn cancelled_is_not_retryable() {
    assert!(!StepError::cancelled().is_retryable());
}

#[yare::parameterized(
    retryable = { StepError::retryable("x"), ErrorKind::StepFailed },
    fatal = { StepError::fatal("x"), ErrorKind::StepFailed },
    cancelled = { StepError::cancelled(), ErrorKind::Cancelled },
    timeout = { StepError::timeout(), ErrorKind::Timeout },
)]
fn maps_to_expected_core_error_kind(err: StepError, expected: ErrorKind) {
    let core: isxops_core::CoreError = err.into();
    assert_eq!(core.kind, expected);
}
