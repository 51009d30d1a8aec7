//! Scenario 3: two `slow` siblings that share a single completed dependency
//! overlap in time under a fan-out of at least 2.

use serde_json::{json, Value};

use crate::prelude::{wait_for, Daemon, WAIT_MAX_MS};

#[test]
fn slow_siblings_overlap_and_both_complete() {
    let daemon = Daemon::builder().env("ISXOPS_FAN_OUT", "2").start();
    let client = daemon.client();

    let response = client
        .post(daemon.url("/operations/start"))
        .json(&json!({
            "mode": "full",
            "steps": [
                {"id": "root", "type": "noop"},
                {"id": "x", "type": "slow", "dependencies": ["root"], "parameters": {"duration_ms": 150}},
                {"id": "y", "type": "slow", "dependencies": ["root"], "parameters": {"duration_ms": 150}},
            ],
        }))
        .send()
        .unwrap();
    assert_eq!(response.status(), 202);
    let body: Value = response.json().unwrap();
    let operation_id = body["operation_id"].as_str().unwrap().to_string();

    // Poll the operation status while both `x` and `y` should be mid-flight
    // and assert we observe them `running` at the same time at least once.
    let mut saw_overlap = false;
    let completed = wait_for(WAIT_MAX_MS, || {
        let status: Value = client
            .get(daemon.url(&format!("/operations/{operation_id}/status")))
            .send()
            .unwrap()
            .json()
            .unwrap();
        let steps = status["steps"].as_array().unwrap();
        let running = |id: &str| {
            steps.iter().any(|s| s["id"] == id && s["status"] == "running")
        };
        if running("x") && running("y") {
            saw_overlap = true;
        }
        status["status"] == "completed"
    });

    assert!(completed, "operation did not complete in time");
    assert!(saw_overlap, "x and y never overlapped in the running state");
}
