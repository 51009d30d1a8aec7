//! Scenario 6: a failed step cascades a `skipped` status to its dependent
//! and fails the operation, whose error references the failed step.

use serde_json::{json, Value};

use crate::prelude::{wait_for, Daemon, WAIT_MAX_MS};

#[test]
fn failed_step_skips_dependent_and_fails_operation() {
    let daemon = Daemon::start();
    let client = daemon.client();

    let response = client
        .post(daemon.url("/operations/start"))
        .json(&json!({
            "mode": "full",
            "steps": [
                {"id": "a", "type": "fails", "retries": 0},
                {"id": "b", "type": "noop", "dependencies": ["a"]},
            ],
        }))
        .send()
        .unwrap();
    assert_eq!(response.status(), 202);
    let body: Value = response.json().unwrap();
    let operation_id = body["operation_id"].as_str().unwrap().to_string();

    let mut last: Value = Value::Null;
    let completed = wait_for(WAIT_MAX_MS, || {
        last = client
            .get(daemon.url(&format!("/operations/{operation_id}/status")))
            .send()
            .unwrap()
            .json()
            .unwrap();
        last["status"] == "failed"
    });
    assert!(completed, "operation never reached failed: {last}");

    let steps = last["steps"].as_array().unwrap();
    let step = |id: &str| steps.iter().find(|s| s["id"] == id).unwrap();
    assert_eq!(step("a")["status"], "failed");
    assert_eq!(step("b")["status"], "skipped");
    assert!(last["error"].as_str().unwrap().contains('a'));
}
