// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Shared test helpers for use across crates.
//!
//! Gated behind `#[cfg(any(test, feature = "test-support"))]`.

use std::collections::HashMap;

use crate::ids::OperationId;
use crate::request::{Mode, OperationRequest, StepConfig};

/// Build a minimal single-step request of the given step type.
pub fn single_step_request(step_type: &str) -> OperationRequest {
    OperationRequest {
        id: None,
        mode: Mode::Full,
        steps: vec![StepConfig {
            id: "s1".to_string(),
            step_type: step_type.to_string(),
            dependencies: Vec::new(),
            timeout: None,
            retries: None,
            parameters: HashMap::new(),
        }],
        parameters: HashMap::new(),
        deadline: None,
    }
}

/// Build a linear three-step chain `a -> b -> c`, all of the given type.
pub fn linear_chain_request(step_type: &str) -> OperationRequest {
    let dep = |deps: &[&str]| deps.iter().map(|s| s.to_string()).collect();
    OperationRequest {
        id: None,
        mode: Mode::Full,
        steps: vec![
            StepConfig {
                id: "a".to_string(),
                step_type: step_type.to_string(),
                dependencies: dep(&[]),
                timeout: None,
                retries: None,
                parameters: HashMap::new(),
            },
            StepConfig {
                id: "b".to_string(),
                step_type: step_type.to_string(),
                dependencies: dep(&["a"]),
                timeout: None,
                retries: None,
                parameters: HashMap::new(),
            },
            StepConfig {
                id: "c".to_string(),
                step_type: step_type.to_string(),
                dependencies: dep(&["b"]),
                timeout: None,
                retries: None,
                parameters: HashMap::new(),
            },
        ],
        parameters: HashMap::new(),
        deadline: None,
    }
}

pub fn operation_id(s: &str) -> OperationId {
    OperationId::new(s)
}
