// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `GET /ws`: upgrades a connection to a [`Broadcaster`] subscriber and
//! pushes one JSON event envelope per message. Client-to-server messages are
//! ignored except for ping, which is answered with pong so idle connections
//! are not reaped by intermediate proxies.

use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::{Query, State};
use axum::response::IntoResponse;
use isxops_core::{Clock, IdGen, OperationId, SubscriberId, UuidIdGen};
use serde::Deserialize;

use super::AppState;

#[derive(Debug, Deserialize)]
pub struct WsQuery {
    /// Restrict the stream to one operation's events; unset subscribes to
    /// everything.
    pub operation_id: Option<String>,
}

pub async fn handle_ws<C: Clock, G: IdGen>(
    ws: WebSocketUpgrade,
    State(state): State<AppState<C, G>>,
    Query(query): Query<WsQuery>,
) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_socket(socket, state, query.operation_id.map(OperationId::new)))
}

async fn handle_socket<C: Clock, G: IdGen>(mut socket: WebSocket, state: AppState<C, G>, filter: Option<OperationId>) {
    let id = SubscriberId::new(UuidIdGen.next());
    let mut events = state.service.broadcaster().subscribe(id.clone(), filter);

    loop {
        tokio::select! {
            event = events.recv() => {
                let Some(event) = event else { break };
                let Ok(text) = serde_json::to_string(&event) else { continue };
                if socket.send(Message::Text(text)).await.is_err() {
                    break;
                }
            }
            msg = socket.recv() => {
                match msg {
                    Some(Ok(Message::Ping(payload))) => {
                        if socket.send(Message::Pong(payload)).await.is_err() {
                            break;
                        }
                    }
                    Some(Ok(Message::Close(_))) | None => break,
                    Some(Ok(_)) => {}
                    Some(Err(_)) => break,
                }
            }
        }
    }

    state.service.broadcaster().unsubscribe(&id);
}

#[cfg(test)]
#[path = "ws_tests.rs"]
mod tests;
