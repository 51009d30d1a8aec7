// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Axum HTTP/WebSocket adapter: binds `OperationService` to the wire
//! contract the rest of the workspace is built to satisfy — the
//! 202-plus-poll REST surface, RFC 7807 error documents, and a `/ws`
//! broadcast subscription. This is the only place in the workspace that
//! knows about sockets.

pub mod error_response;
mod handlers;
mod ws;

use std::sync::Arc;
use std::time::Duration;

use axum::routing::{get, post};
use axum::Router;
use isxops_core::{Clock, IdGen, UuidIdGen};
use tower_http::trace::TraceLayer;

use crate::service::OperationService;

/// Shared state every handler closes over. Cheap to clone: it is just an
/// `Arc` around the facade the `JobQueue`/`Manager`/`Broadcaster` sit
/// behind.
pub struct AppState<C: Clock, G: IdGen = UuidIdGen> {
    pub service: Arc<OperationService<C, G>>,
}

impl<C: Clock, G: IdGen> Clone for AppState<C, G> {
    fn clone(&self) -> Self {
        Self { service: Arc::clone(&self.service) }
    }
}

/// Assemble the full router: every endpoint in the external-interfaces
/// table plus a per-request timeout independent of any operation's own
/// deadline.
pub fn build_router<C: Clock, G: IdGen>(service: Arc<OperationService<C, G>>, request_timeout: Duration) -> Router {
    let state = AppState { service };

    Router::new()
        .route("/operations/start", post(handlers::start::<C, G>))
        .route("/operations/jobs/:id", get(handlers::get_job::<C, G>))
        .route("/operations/jobs", get(handlers::list_jobs::<C, G>))
        .route("/operations/:id/stop", post(handlers::stop::<C, G>))
        .route("/operations/:id/status", get(handlers::get_status::<C, G>))
        .route("/operations", get(handlers::list_operations::<C, G>))
        .route("/operations/types", get(handlers::list_types::<C, G>))
        .route("/healthz", get(handlers::healthz))
        .route("/ws", get(ws::handle_ws::<C, G>))
        .layer(tower_http::timeout::TimeoutLayer::new(request_timeout))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
