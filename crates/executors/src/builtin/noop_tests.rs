// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use isxops_core::test_support::operation_id;
use parking_lot::Mutex;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

#[tokio::test]
async fn completes_at_full_progress() {
    let calls = Arc::new(Mutex::new(Vec::new()));
    let recorded = calls.clone();
    let emit = EmitHandle::new(move |p, m| recorded.lock().push((p, m)));
    let ctx = StepContext::new(operation_id("op-1"), "s1", 0, CancellationToken::new());

    NoOpExecutor::new()
        .run(ctx, HashMap::new(), emit)
        .await
        .unwrap();

    assert_eq!(calls.lock()[0].0, 100);
}
