// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Request handlers for the REST surface documented in the external
//! interfaces section of the design: 202-plus-poll job submission, job and
//! operation snapshots, cancellation, and the registry listing.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use isxops_core::{Clock, IdGen, OperationId, OperationRequest, OperationStatus};
use isxops_storage::{Job, JobFilter, JobStatus};
use serde::{Deserialize, Serialize};

use super::error_response::ApiError;
use super::AppState;

#[derive(Debug, Serialize)]
pub struct StartResponse {
    pub job_id: OperationId,
    pub operation_id: OperationId,
    pub status: &'static str,
    pub poll_url: String,
}

pub async fn start<C: Clock, G: IdGen>(
    State(state): State<AppState<C, G>>,
    Json(request): Json<OperationRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let accepted = state
        .service
        .execute(request)
        .await
        .map_err(|e| ApiError::new(e, "/operations/start"))?;

    let body = StartResponse {
        job_id: accepted.job_id.clone(),
        operation_id: accepted.operation_id.clone(),
        status: "pending",
        poll_url: format!("/operations/jobs/{}", accepted.job_id),
    };
    Ok((StatusCode::ACCEPTED, Json(body)))
}

/// Job snapshot augmented with the two fields a 202-poller actually needs:
/// whether to stop polling, and how long to wait before trying again.
#[derive(Debug, Serialize)]
pub struct JobResponse {
    #[serde(flatten)]
    pub job: Job,
    pub is_complete: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub poll_after_ms: Option<u64>,
}

/// Poll interval suggested to clients of a still-running job.
const POLL_AFTER_MS: u64 = 1000;

impl From<Job> for JobResponse {
    fn from(job: Job) -> Self {
        let is_complete = job.is_complete();
        Self {
            poll_after_ms: (!is_complete).then_some(POLL_AFTER_MS),
            is_complete,
            job,
        }
    }
}

pub async fn get_job<C: Clock, G: IdGen>(
    State(state): State<AppState<C, G>>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let id = OperationId::new(id);
    let instance = format!("/operations/jobs/{id}");
    let job = state
        .service
        .get_job(&id)
        .await
        .map_err(|e| ApiError::new(e, instance).with_operation(id))?;
    Ok(Json(JobResponse::from(job)))
}

#[derive(Debug, Deserialize)]
pub struct JobListQuery {
    pub status: Option<JobStatus>,
    pub operation_id: Option<String>,
    pub stage_id: Option<String>,
    pub limit: Option<usize>,
}

#[derive(Debug, Serialize)]
pub struct JobListResponse {
    pub jobs: Vec<Job>,
    pub count: usize,
    pub stats: isxops_queue::JobQueueStats,
}

pub async fn list_jobs<C: Clock, G: IdGen>(
    State(state): State<AppState<C, G>>,
    Query(query): Query<JobListQuery>,
) -> impl IntoResponse {
    let filter = JobFilter {
        status: query.status,
        operation_id: query.operation_id.map(OperationId::new),
        stage_id: query.stage_id,
        limit: query.limit,
    };
    let (jobs, stats) = state.service.list_jobs(filter).await;
    Json(JobListResponse { count: jobs.len(), jobs, stats })
}

#[derive(Debug, Serialize)]
pub struct StopResponse {
    pub operation_id: OperationId,
    pub status: &'static str,
}

pub async fn stop<C: Clock, G: IdGen>(
    State(state): State<AppState<C, G>>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let id = OperationId::new(id);
    let instance = format!("/operations/{id}/stop");
    state
        .service
        .cancel(&id)
        .await
        .map_err(|e| ApiError::new(e, instance).with_operation(id.clone()))?;
    Ok(Json(StopResponse { operation_id: id, status: "cancelling" }))
}

pub async fn get_status<C: Clock, G: IdGen>(
    State(state): State<AppState<C, G>>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let id = OperationId::new(id);
    let instance = format!("/operations/{id}/status");
    let snapshot = state
        .service
        .get_status(&id)
        .await
        .map_err(|e| ApiError::new(e, instance).with_operation(id))?;
    Ok(Json(snapshot))
}

#[derive(Debug, Deserialize)]
pub struct OperationListQuery {
    pub status: Option<OperationStatus>,
}

pub async fn list_operations<C: Clock, G: IdGen>(
    State(state): State<AppState<C, G>>,
    Query(query): Query<OperationListQuery>,
) -> impl IntoResponse {
    Json(state.service.list(query.status).await)
}

pub async fn list_types<C: Clock, G: IdGen>(State(state): State<AppState<C, G>>) -> impl IntoResponse {
    Json(state.service.list_types())
}

pub async fn healthz() -> impl IntoResponse {
    Json(serde_json::json!({ "status": "ok" }))
}

#[cfg(test)]
#[path = "handlers_tests.rs"]
mod tests;
