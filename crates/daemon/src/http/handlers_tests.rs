// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use std::sync::Arc;
use std::time::Duration;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use isxops_core::{FakeClock, SequentialIdGen};
use isxops_executors::builtin::{FailsExecutor, NoOpExecutor};
use isxops_executors::{ExecutorDispatch, StepExecutor};
use isxops_queue::{JobQueue, QueueConfig};
use isxops_registry::{Registry, StepDefinition};
use serde_json::{json, Value};
use tower::ServiceExt;

use crate::service::OperationService;

fn app() -> Router {
    let registry = Registry::new()
        .register(StepDefinition::new("noop", "No-op").with_timeout(Duration::from_secs(5)))
        .register(StepDefinition::new("fails", "Fails").with_timeout(Duration::from_secs(5)));
    let dispatch = ExecutorDispatch::new()
        .register("noop", Arc::new(NoOpExecutor::new()) as Arc<dyn StepExecutor>)
        .register("fails", Arc::new(FailsExecutor::new()) as Arc<dyn StepExecutor>);
    let queue = JobQueue::new(
        registry.clone(),
        dispatch,
        isxops_engine::Broadcaster::new(32, 8),
        FakeClock::new(0),
        SequentialIdGen::new("op"),
        QueueConfig::default(),
    );
    let service = Arc::new(OperationService::new(queue, registry));
    super::build_router(service, Duration::from_secs(5))
}

async fn body_json(response: axum::response::Response) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

fn post(path: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(path)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn get(path: &str) -> Request<Body> {
    Request::builder().method("GET").uri(path).body(Body::empty()).unwrap()
}

#[tokio::test]
async fn start_accepts_a_valid_request_with_202_and_poll_url() {
    let response = app()
        .oneshot(post(
            "/operations/start",
            json!({"mode": "full", "steps": [{"id": "s1", "type": "noop"}]}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::ACCEPTED);

    let body = body_json(response).await;
    assert_eq!(body["status"], "pending");
    assert_eq!(body["job_id"], body["operation_id"]);
    assert_eq!(body["poll_url"], format!("/operations/jobs/{}", body["job_id"].as_str().unwrap()));
}

#[tokio::test]
async fn start_rejects_a_request_with_no_steps_as_400() {
    let response = app().oneshot(post("/operations/start", json!({"mode": "full", "steps": []}))).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let body = body_json(response).await;
    assert_eq!(body["type"], "https://isxops.internal/errors/validation-failed");
}

#[tokio::test]
async fn start_rejects_an_unknown_step_type_as_400() {
    let response = app()
        .oneshot(post(
            "/operations/start",
            json!({"mode": "full", "steps": [{"id": "s1", "type": "does-not-exist"}]}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn get_job_on_unknown_id_is_404() {
    let response = app().oneshot(get("/operations/jobs/ghost")).await.unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let body = body_json(response).await;
    assert_eq!(body["operation_id"], "ghost");
}

#[tokio::test]
async fn start_then_get_job_reports_pending_and_a_poll_hint() {
    let app = app();
    let started = app
        .clone()
        .oneshot(post(
            "/operations/start",
            json!({"mode": "full", "steps": [{"id": "s1", "type": "noop"}]}),
        ))
        .await
        .unwrap();
    let started = body_json(started).await;
    let job_id = started["job_id"].as_str().unwrap();

    let response = app.oneshot(get(&format!("/operations/jobs/{job_id}"))).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["id"], job_id);
    assert!(matches!(body["status"].as_str().unwrap(), "pending" | "running" | "completed"));
}

#[tokio::test]
async fn stop_on_unknown_operation_is_404() {
    let response = app().oneshot(post("/operations/ghost/stop", json!({}))).await.unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn list_types_reflects_the_registry() {
    let response = app().oneshot(get("/operations/types")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    let type_ids: Vec<&str> = body.as_array().unwrap().iter().map(|t| t["type_id"].as_str().unwrap()).collect();
    assert!(type_ids.contains(&"noop"));
    assert!(type_ids.contains(&"fails"));
}

#[tokio::test]
async fn healthz_reports_ok() {
    let response = app().oneshot(get("/healthz")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["status"], "ok");
}

#[tokio::test]
async fn list_jobs_includes_stats_and_the_just_submitted_job() {
    let app = app();
    let started = app
        .clone()
        .oneshot(post(
            "/operations/start",
            json!({"mode": "full", "steps": [{"id": "s1", "type": "noop"}]}),
        ))
        .await
        .unwrap();
    let started = body_json(started).await;
    let job_id = started["job_id"].as_str().unwrap().to_string();

    let response = app.oneshot(get("/operations/jobs")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert!(body["count"].as_u64().unwrap() >= 1);
    let ids: Vec<&str> = body["jobs"].as_array().unwrap().iter().map(|j| j["id"].as_str().unwrap()).collect();
    assert!(ids.contains(&job_id.as_str()));
}
