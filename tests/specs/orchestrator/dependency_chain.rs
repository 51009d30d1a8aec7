//! Scenario 2: a linear `a -> b -> c` chain of `noop` steps fires its
//! started/completed events in dependency order, observed live over `/ws`.

use futures::StreamExt;
use serde_json::{json, Value};
use tokio_tungstenite::tungstenite::Message;

use crate::prelude::Daemon;

#[test]
fn linear_chain_runs_steps_in_dependency_order() {
    let daemon = Daemon::start();
    let client = daemon.client();

    let response = client
        .post(daemon.url("/operations/start"))
        .json(&json!({
            "mode": "full",
            "steps": [
                {"id": "a", "type": "noop"},
                {"id": "b", "type": "noop", "dependencies": ["a"]},
                {"id": "c", "type": "noop", "dependencies": ["b"]},
            ],
        }))
        .send()
        .unwrap();
    assert_eq!(response.status(), 202);
    let body: Value = response.json().unwrap();
    let operation_id = body["operation_id"].as_str().unwrap().to_string();

    let rt = tokio::runtime::Runtime::new().unwrap();
    let trace = rt.block_on(async {
        let ws_url = daemon.ws_url(&format!("/ws?operation_id={operation_id}"));
        let (mut ws, _) = tokio_tungstenite::connect_async(ws_url).await.unwrap();

        let mut trace = Vec::new();
        while trace.last().map(String::as_str) != Some("operation:completed") {
            let Some(Ok(Message::Text(text))) =
                tokio::time::timeout(std::time::Duration::from_secs(5), ws.next()).await.unwrap()
            else {
                panic!("websocket closed before the chain finished");
            };
            let event: Value = serde_json::from_str(&text).unwrap();
            let kind = event["type"].as_str().unwrap();
            match kind {
                "step-started" | "step-completed" => {
                    let step_id = event["step_id"].as_str().unwrap();
                    let verb = if kind == "step-started" { "started" } else { "completed" };
                    trace.push(format!("{step_id}:{verb}"));
                }
                "operation-completed" => trace.push("operation:completed".to_string()),
                _ => {}
            }
        }
        trace
    });

    assert_eq!(trace, vec!["a:started", "a:completed", "b:started", "b:completed", "c:started", "c:completed", "operation:completed"]);
}
