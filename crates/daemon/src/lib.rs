// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Wires the orchestrator crates into a runnable HTTP service: `bootstrap`
//! registers the built-in step types, `service` fronts the `JobQueue` with
//! the facade the HTTP layer talks to, and `http` serves it over axum.

pub mod bootstrap;
pub mod config;
pub mod http;
pub mod logging;
pub mod service;

use std::sync::Arc;
use std::time::Duration;

use isxops_core::{SystemClock, UuidIdGen};
use isxops_engine::Broadcaster;
use isxops_queue::JobQueue;
use tokio::net::TcpListener;
use tokio::signal;
use tracing::info;

use crate::config::{subscriber_buffer, subscriber_drop_threshold, Config};
use crate::service::OperationService;

/// Build the full dependency graph from `config` and serve until a shutdown
/// signal arrives, draining in-flight work with `ISXOPS_CANCEL_GRACE` before
/// returning.
pub async fn run(config: Config) -> Result<(), Box<dyn std::error::Error>> {
    let (registry, dispatch) = bootstrap::builtins()?;
    let broadcaster = Broadcaster::new(subscriber_buffer()?, subscriber_drop_threshold()?);
    let grace = config.queue.manager.cancel_grace;
    let queue = JobQueue::new(registry.clone(), dispatch, broadcaster, SystemClock, UuidIdGen, config.queue.clone());
    let service = Arc::new(OperationService::new(queue, registry));

    let router = http::build_router(Arc::clone(&service), config.request_timeout);
    let listener = TcpListener::bind(config.bind_addr).await?;
    info!(addr = %config.bind_addr, "isxopsd listening");

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!(?grace, "draining in-flight operations");
    service.shutdown(grace).await;
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c().await.ok();
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(_) => std::future::pending::<()>().await,
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {}
        _ = terminate => {}
    }

    info!("shutdown signal received");
}
