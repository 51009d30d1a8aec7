//! `GET /operations/jobs` filtering (status, operation_id, stage_id, limit)
//! and `GET /operations/types`.

use serde_json::{json, Value};

use crate::prelude::{wait_for, Daemon, WAIT_MAX_MS};

#[test]
fn job_listing_filters_by_status_and_stage_id() {
    let daemon = Daemon::start();
    let client = daemon.client();

    let completed = client
        .post(daemon.url("/operations/start"))
        .json(&json!({"mode": "full", "steps": [{"id": "only", "type": "noop"}]}))
        .send()
        .unwrap()
        .json::<Value>()
        .unwrap();
    let completed_id = completed["operation_id"].as_str().unwrap().to_string();

    let failing = client
        .post(daemon.url("/operations/start"))
        .json(&json!({"mode": "full", "steps": [{"id": "boom", "type": "fails", "retries": 0}]}))
        .send()
        .unwrap()
        .json::<Value>()
        .unwrap();
    let failing_id = failing["operation_id"].as_str().unwrap().to_string();

    let both_done = wait_for(WAIT_MAX_MS, || {
        let a: Value = client
            .get(daemon.url(&format!("/operations/jobs/{completed_id}")))
            .send()
            .unwrap()
            .json()
            .unwrap();
        let b: Value = client
            .get(daemon.url(&format!("/operations/jobs/{failing_id}")))
            .send()
            .unwrap()
            .json()
            .unwrap();
        a["is_complete"] == true && b["is_complete"] == true
    });
    assert!(both_done);

    let listing: Value = client
        .get(daemon.url("/operations/jobs?status=failed"))
        .send()
        .unwrap()
        .json()
        .unwrap();
    let jobs = listing["jobs"].as_array().unwrap();
    assert!(jobs.iter().all(|j| j["status"] == "failed"));
    assert!(jobs.iter().any(|j| j["id"] == failing_id));
    assert!(jobs.iter().all(|j| j["id"] != completed_id));

    let by_stage: Value = client
        .get(daemon.url("/operations/jobs?stage_id=boom"))
        .send()
        .unwrap()
        .json()
        .unwrap();
    let jobs = by_stage["jobs"].as_array().unwrap();
    assert!(jobs.iter().any(|j| j["id"] == failing_id));
    assert!(jobs.iter().all(|j| j["id"] != completed_id));
}

#[test]
fn types_listing_exposes_builtin_executors() {
    let daemon = Daemon::start();
    let client = daemon.client();

    let types: Value = client.get(daemon.url("/operations/types")).send().unwrap().json().unwrap();
    let types = types.as_array().unwrap();
    let ids: Vec<&str> = types.iter().map(|t| t["type_id"].as_str().unwrap()).collect();
    for expected in ["echo", "noop", "slow", "fails"] {
        assert!(ids.contains(&expected), "missing builtin type '{expected}'");
    }
}
