//! Scenario 5: with worker count and queue capacity both 1, a second
//! `/operations/start` while the first is still running is rejected with
//! HTTP 503 and the first job is unaffected.

use serde_json::{json, Value};

use crate::prelude::{wait_for, Daemon, WAIT_MAX_MS};

#[test]
fn second_enqueue_rejected_while_queue_is_full() {
    let daemon = Daemon::builder()
        .env("ISXOPS_WORKERS", "1")
        .env("ISXOPS_QUEUE_CAPACITY", "1")
        .start();
    let client = daemon.client();

    let first = client
        .post(daemon.url("/operations/start"))
        .json(&json!({
            "mode": "full",
            "steps": [{"id": "s1", "type": "slow", "parameters": {"duration_ms": 500}}],
        }))
        .send()
        .unwrap();
    assert_eq!(first.status(), 202);
    let first_body: Value = first.json().unwrap();
    let first_poll_url = first_body["poll_url"].as_str().unwrap().to_string();

    let running = wait_for(WAIT_MAX_MS, || {
        let job: Value = client.get(daemon.url(&first_poll_url)).send().unwrap().json().unwrap();
        job["status"] == "running"
    });
    assert!(running, "first job never started running");

    let second = client
        .post(daemon.url("/operations/start"))
        .json(&json!({
            "mode": "full",
            "steps": [{"id": "s1", "type": "noop"}],
        }))
        .send()
        .unwrap();
    assert_eq!(second.status(), 503);
    let problem: Value = second.json().unwrap();
    assert!(problem["type"].as_str().unwrap().ends_with("queue-full"));

    let completed = wait_for(WAIT_MAX_MS, || {
        let job: Value = client.get(daemon.url(&first_poll_url)).send().unwrap().json().unwrap();
        job["status"] == "completed"
    });
    assert!(completed, "first job should complete unaffected by the rejected second enqueue");
}
