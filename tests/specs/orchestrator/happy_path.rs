//! Scenario 1: a single `echo` step runs to completion and the poll URL
//! reports it.

use serde_json::{json, Value};

use crate::prelude::{wait_for, Daemon, WAIT_MAX_MS};

#[test]
fn single_echo_step_completes_with_full_progress() {
    let daemon = Daemon::start();
    let client = daemon.client();

    let response = client
        .post(daemon.url("/operations/start"))
        .json(&json!({
            "mode": "full",
            "steps": [{"id": "s1", "type": "echo", "parameters": {"n": 3}}],
        }))
        .send()
        .unwrap();
    assert_eq!(response.status(), 202);

    let body: Value = response.json().unwrap();
    let poll_url = body["poll_url"].as_str().unwrap().to_string();
    assert_eq!(body["status"], "pending");

    let mut last: Value = Value::Null;
    let completed = wait_for(WAIT_MAX_MS, || {
        last = client.get(daemon.url(&poll_url)).send().unwrap().json().unwrap();
        last["status"] == "completed"
    });
    assert!(completed, "job did not complete in time: {last}");

    let status: Value = client
        .get(daemon.url(&format!("/operations/{}/status", body["operation_id"].as_str().unwrap())))
        .send()
        .unwrap()
        .json()
        .unwrap();
    assert_eq!(status["status"], "completed");
    let steps = status["steps"].as_array().unwrap();
    assert_eq!(steps.len(), 1);
    assert_eq!(steps[0]["id"], "s1");
    assert_eq!(steps[0]["status"], "completed");
    assert_eq!(steps[0]["progress"], 100);
}
