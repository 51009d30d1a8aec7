// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use isxops_core::test_support::operation_id;
use parking_lot::Mutex;

#[test]
fn context_starts_uncancelled() {
    let ctx = StepContext::new(operation_id("op-1"), "s1", 0, CancellationToken::new());
    assert!(!ctx.is_cancelled());
}

#[test]
fn cancelling_the_token_is_observed_by_the_context() {
    let token = CancellationToken::new();
    let ctx = StepContext::new(operation_id("op-1"), "s1", 0, token.clone());
    token.cancel();
    assert!(ctx.is_cancelled());
}

#[test]
fn emit_handle_clamps_progress_and_forwards_message() {
    let calls = Arc::new(Mutex::new(Vec::new()));
    let recorded = calls.clone();
    let emit = EmitHandle::new(move |progress, message| {
        recorded.lock().push((progress, message));
    });

    emit.emit(255, "overshoot");
    emit.emit(40, "midway");

    let calls = calls.lock();
    assert_eq!(calls[0], (100, "overshoot".to_string()));
    assert_eq!(calls[1], (40, "midway".to_string()));
}

#[tokio::test]
async fn emit_handle_is_cloneable_across_spawned_tasks() {
    let calls = Arc::new(Mutex::new(Vec::new()));
    let recorded = calls.clone();
    let emit = EmitHandle::new(move |progress, message| {
        recorded.lock().push((progress, message));
    });

    let cloned = emit.clone();
    tokio::spawn(async move { cloned.emit(50, "from spawned task") })
        .await
        .unwrap();

    assert_eq!(calls.lock().len(), 1);
}
