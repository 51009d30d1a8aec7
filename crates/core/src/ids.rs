// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Identifiers shared across the orchestrator.

crate::define_id! {
    /// Unique identifier for one operation run. The JobQueue's Job record
    /// shares this identifier with the Manager's OperationState — a job is
    /// the queue-visible twin of an operation, never a separate ID space.
    #[derive(Default)]
    pub struct OperationId;
}

crate::define_id! {
    /// Unique identifier for a registered WebSocket subscriber.
    #[derive(Default)]
    pub struct SubscriberId;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn operation_id_displays_as_inner_string() {
        let id = OperationId::new("op-1");
        assert_eq!(id.to_string(), "op-1");
        assert_eq!(id, "op-1");
    }
}
