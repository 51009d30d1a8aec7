// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Fan-out of [`Event`]s to every registered subscriber.
//!
//! A subscriber's outbound channel is bounded; a full channel means the
//! subscriber is falling behind, so `publish` drops the event for that
//! subscriber alone (via `try_send`) rather than blocking the producer or
//! buffering without limit. Enough consecutive drops close the subscriber.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;

use isxops_core::{Event, OperationId, SubscriberId};
use parking_lot::RwLock;
use tokio::sync::mpsc;

/// A connected observer's outbound half, plus an optional filter.
struct Subscription {
    sender: mpsc::Sender<Event>,
    operation_filter: Option<OperationId>,
    drops: AtomicU32,
}

/// Fan-out hub. Cheap to clone; all subscriber state lives behind the
/// shared inner lock.
#[derive(Clone)]
pub struct Broadcaster {
    inner: Arc<RwLock<HashMap<SubscriberId, Subscription>>>,
    buffer_size: usize,
    drop_threshold: u32,
}

impl Broadcaster {
    pub fn new(buffer_size: usize, drop_threshold: u32) -> Self {
        Self {
            inner: Arc::new(RwLock::new(HashMap::new())),
            buffer_size,
            drop_threshold,
        }
    }

    /// Register a new subscriber, optionally filtered to one operation.
    /// Returns the id to unsubscribe with and the receiving half of its
    /// outbound channel.
    pub fn subscribe(&self, id: SubscriberId, operation_filter: Option<OperationId>) -> mpsc::Receiver<Event> {
        let (sender, receiver) = mpsc::channel(self.buffer_size);
        self.inner.write().insert(
            id,
            Subscription {
                sender,
                operation_filter,
                drops: AtomicU32::new(0),
            },
        );
        receiver
    }

    pub fn unsubscribe(&self, id: &SubscriberId) {
        self.inner.write().remove(id);
    }

    pub fn subscriber_count(&self) -> usize {
        self.inner.read().len()
    }

    /// Deliver `event` to every matching subscriber. Never blocks: a full
    /// channel is a drop, not a wait. Closes and removes any subscriber
    /// whose consecutive drop count exceeds the configured threshold.
    pub fn publish(&self, event: Event) {
        let mut to_remove = Vec::new();

        {
            let subscribers = self.inner.read();
            for (id, sub) in subscribers.iter() {
                if let Some(filter) = &sub.operation_filter {
                    if filter != &event.operation_id {
                        continue;
                    }
                }

                match sub.sender.try_send(event.clone()) {
                    Ok(()) => {
                        sub.drops.store(0, Ordering::Relaxed);
                    }
                    Err(mpsc::error::TrySendError::Full(_)) => {
                        let drops = sub.drops.fetch_add(1, Ordering::Relaxed) + 1;
                        tracing::debug!(subscriber = %id, drops, "dropped event for slow subscriber");
                        if drops >= self.drop_threshold {
                            to_remove.push(id.clone());
                        }
                    }
                    Err(mpsc::error::TrySendError::Closed(_)) => {
                        to_remove.push(id.clone());
                    }
                }
            }
        }

        if !to_remove.is_empty() {
            let mut subscribers = self.inner.write();
            for id in to_remove {
                tracing::info!(subscriber = %id, "closing slow or disconnected subscriber");
                subscribers.remove(&id);
            }
        }
    }

    /// Drop every subscriber, closing their channels.
    pub fn shutdown(&self) {
        self.inner.write().clear();
    }
}

#[cfg(test)]
#[path = "broadcaster_tests.rs"]
mod tests;
