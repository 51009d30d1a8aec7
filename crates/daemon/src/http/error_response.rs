// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Maps `CoreError` to an RFC 7807 problem document. This is the only place
//! in the workspace that knows about HTTP status codes — `isxops-core`
//! itself stays transport-agnostic.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use isxops_core::{CoreError, ErrorKind, OperationId};
use serde::Serialize;

#[derive(Debug, Serialize)]
pub struct ProblemDetails {
    #[serde(rename = "type")]
    pub type_uri: String,
    pub title: &'static str,
    pub status: u16,
    pub detail: String,
    pub instance: String,
    pub trace_id: String,
    pub request_id: String,
    pub timestamp: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub operation_id: Option<String>,
}

fn status_for(kind: ErrorKind) -> StatusCode {
    match kind {
        ErrorKind::ValidationFailed => StatusCode::BAD_REQUEST,
        ErrorKind::NotFound => StatusCode::NOT_FOUND,
        ErrorKind::InvalidState => StatusCode::CONFLICT,
        ErrorKind::QueueFull => StatusCode::SERVICE_UNAVAILABLE,
        ErrorKind::Timeout => StatusCode::GATEWAY_TIMEOUT,
        ErrorKind::Cancelled => StatusCode::REQUEST_TIMEOUT,
        ErrorKind::StepFailed => StatusCode::INTERNAL_SERVER_ERROR,
        ErrorKind::Internal => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

/// Wraps a `CoreError` with the request context needed to build its problem
/// document: the request path and, when known, the operation id.
pub struct ApiError {
    pub error: CoreError,
    pub instance: String,
    pub operation_id: Option<OperationId>,
}

impl ApiError {
    pub fn new(error: CoreError, instance: impl Into<String>) -> Self {
        Self {
            error,
            instance: instance.into(),
            operation_id: None,
        }
    }

    pub fn with_operation(mut self, id: OperationId) -> Self {
        self.operation_id = Some(id);
        self
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = status_for(self.error.kind);
        if status.is_server_error() {
            tracing::error!(kind = ?self.error.kind, detail = %self.error.detail, "internal error");
        } else {
            tracing::warn!(kind = ?self.error.kind, detail = %self.error.detail, "request rejected");
        }

        let request_id = uuid::Uuid::new_v4().to_string();
        let body = ProblemDetails {
            type_uri: format!("https://isxops.internal/errors/{}", self.error.kind.slug()),
            title: self.error.kind.title(),
            status: status.as_u16(),
            detail: self.error.detail,
            instance: self.instance,
            trace_id: request_id.clone(),
            request_id,
            timestamp: chrono::Utc::now().timestamp_millis().max(0) as u64,
            operation_id: self.operation_id.map(|id| id.as_str().to_string()),
        };

        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
#[path = "error_response_tests.rs"]
mod tests;
