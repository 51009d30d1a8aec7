//! Scenario 4: cancelling a long-running step via `POST /operations/{id}/stop`
//! drives the step and the operation to `cancelled` within the configured
//! grace period, emitting `operation-cancelled` exactly once.

use futures::StreamExt;
use serde_json::{json, Value};
use tokio_tungstenite::tungstenite::Message;

use crate::prelude::{wait_for, Daemon, WAIT_MAX_MS};

#[test]
fn stopping_a_slow_step_cancels_the_operation() {
    let daemon = Daemon::builder().env("ISXOPS_CANCEL_GRACE", "2s").start();
    let client = daemon.client();

    let response = client
        .post(daemon.url("/operations/start"))
        .json(&json!({
            "mode": "full",
            "steps": [{"id": "s1", "type": "slow", "parameters": {"duration_ms": 60_000}}],
        }))
        .send()
        .unwrap();
    assert_eq!(response.status(), 202);
    let body: Value = response.json().unwrap();
    let operation_id = body["operation_id"].as_str().unwrap().to_string();

    let rt = tokio::runtime::Runtime::new().unwrap();
    let (cancelled_events, stop_status) = rt.block_on(async {
        let ws_url = daemon.ws_url(&format!("/ws?operation_id={operation_id}"));
        let (mut ws, _) = tokio_tungstenite::connect_async(ws_url).await.unwrap();

        // Wait for step-started before issuing the stop, per the scenario.
        loop {
            let Some(Ok(Message::Text(text))) =
                tokio::time::timeout(std::time::Duration::from_secs(5), ws.next()).await.unwrap()
            else {
                panic!("websocket closed before step-started");
            };
            let event: Value = serde_json::from_str(&text).unwrap();
            if event["type"] == "step-started" {
                break;
            }
        }

        let stop_status = reqwest::Client::new()
            .post(daemon.url(&format!("/operations/{operation_id}/stop")))
            .send()
            .await
            .unwrap()
            .status();

        let mut cancelled_events = 0u32;
        loop {
            let Some(Ok(Message::Text(text))) =
                tokio::time::timeout(std::time::Duration::from_secs(5), ws.next()).await.unwrap()
            else {
                break;
            };
            let event: Value = serde_json::from_str(&text).unwrap();
            if event["type"] == "operation-cancelled" {
                cancelled_events += 1;
                break;
            }
        }
        (cancelled_events, stop_status)
    });

    assert_eq!(stop_status.as_u16(), 200);
    assert_eq!(cancelled_events, 1, "operation-cancelled must fire exactly once");

    let completed = wait_for(WAIT_MAX_MS, || {
        let status: Value = client
            .get(daemon.url(&format!("/operations/{operation_id}/status")))
            .send()
            .unwrap()
            .json()
            .unwrap();
        status["status"] == "cancelled"
    });
    assert!(completed, "operation never settled into cancelled");

    // A second stop on an already-terminal operation is invalid-state.
    let second = client
        .post(daemon.url(&format!("/operations/{operation_id}/stop")))
        .send()
        .unwrap();
    assert_eq!(second.status(), 409);
}
