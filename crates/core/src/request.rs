// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Operation request envelope: what a client submits to run a pipeline.

use std::collections::{HashMap, HashSet};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::ids::OperationId;

/// Execution mode requested by the client.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Mode {
    /// Run every step in the request from scratch.
    Full,
    /// Run only the steps listed, skipping the rest of a known pipeline shape.
    Partial,
    /// Resume a previously-submitted operation, reusing whatever step state
    /// survives the implementation-defined reset policy (see
    /// [`crate::state::OperationState::reset_for_resume`]).
    Resume,
}

/// One node in the request's step DAG.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StepConfig {
    /// Unique within the request.
    pub id: String,
    /// Must name a type registered in the Registry.
    #[serde(rename = "type")]
    pub step_type: String,
    /// Step ids this step depends on; all must resolve within the same request.
    #[serde(default)]
    pub dependencies: Vec<String>,
    /// Per-step deadline, overriding the step type's default timeout.
    #[serde(default, with = "humantime_duration_opt")]
    pub timeout: Option<Duration>,
    /// Overrides the step type's default retry count.
    #[serde(default)]
    pub retries: Option<u32>,
    #[serde(default)]
    pub parameters: HashMap<String, serde_json::Value>,
}

/// A client-submitted request to run a multi-step operation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OperationRequest {
    /// Server-assigned if absent.
    #[serde(default)]
    pub id: Option<OperationId>,
    pub mode: Mode,
    pub steps: Vec<StepConfig>,
    #[serde(default)]
    pub parameters: HashMap<String, serde_json::Value>,
    #[serde(default, with = "humantime_duration_opt")]
    pub deadline: Option<Duration>,
}

impl OperationRequest {
    /// Structural validation that does not require the Registry: unique step
    /// ids, resolvable dependencies, and an acyclic graph. Type existence is
    /// checked separately once a Registry is available.
    pub fn validate_structure(&self) -> Result<(), CoreError> {
        if self.steps.is_empty() {
            return Err(CoreError::validation("request must declare at least one step"));
        }

        let mut seen = HashSet::with_capacity(self.steps.len());
        for step in &self.steps {
            if !seen.insert(step.id.as_str()) {
                return Err(CoreError::validation(format!(
                    "duplicate step id '{}'",
                    step.id
                )));
            }
        }

        for step in &self.steps {
            for dep in &step.dependencies {
                if !seen.contains(dep.as_str()) {
                    return Err(CoreError::validation(format!(
                        "step '{}' declares unknown dependency '{}'",
                        step.id, dep
                    )));
                }
                if dep == &step.id {
                    return Err(CoreError::validation(format!(
                        "step '{}' cannot depend on itself",
                        step.id
                    )));
                }
            }
        }

        self.topological_order().map(|_| ())
    }

    /// Kahn's algorithm: returns step ids in a valid execution order, or a
    /// validation error naming the cycle if the graph is not a DAG.
    pub fn topological_order(&self) -> Result<Vec<String>, CoreError> {
        let mut indegree: HashMap<&str, usize> = HashMap::new();
        let mut dependents: HashMap<&str, Vec<&str>> = HashMap::new();

        for step in &self.steps {
            indegree.entry(step.id.as_str()).or_insert(0);
            for dep in &step.dependencies {
                *indegree.entry(step.id.as_str()).or_insert(0) += 1;
                dependents.entry(dep.as_str()).or_default().push(step.id.as_str());
            }
        }

        let mut ready: Vec<&str> = indegree
            .iter()
            .filter(|(_, &deg)| deg == 0)
            .map(|(&id, _)| id)
            .collect();
        ready.sort_unstable();

        let mut order = Vec::with_capacity(self.steps.len());
        while let Some(id) = ready.pop() {
            order.push(id.to_string());
            if let Some(children) = dependents.get(id) {
                let mut newly_ready = Vec::new();
                for &child in children {
                    // Every id in `dependents` was first inserted into `indegree` above.
                    #[allow(clippy::expect_used)]
                    let deg = indegree.get_mut(child).expect("child tracked in indegree");
                    *deg -= 1;
                    if *deg == 0 {
                        newly_ready.push(child);
                    }
                }
                newly_ready.sort_unstable();
                ready.extend(newly_ready);
            }
            ready.sort_unstable();
        }

        if order.len() != self.steps.len() {
            return Err(CoreError::validation(
                "step dependency graph contains a cycle",
            ));
        }

        Ok(order)
    }

    /// Build the adjacency needed by the Manager to compute ready sets:
    /// step id -> direct dependencies.
    pub fn dependency_map(&self) -> HashMap<String, Vec<String>> {
        self.steps
            .iter()
            .map(|s| (s.id.clone(), s.dependencies.clone()))
            .collect()
    }
}

/// Accepts any `humantime` duration string ("30s", "5m", "1h30m") and
/// serializes back out the same way.
mod humantime_duration_opt {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(v: &Option<Duration>, s: S) -> Result<S::Ok, S::Error> {
        v.map(|d| humantime::format_duration(d).to_string())
            .serialize(s)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Option<Duration>, D::Error> {
        let raw: Option<String> = Option::deserialize(d)?;
        match raw {
            None => Ok(None),
            Some(s) => humantime::parse_duration(s.trim())
                .map(Some)
                .map_err(|e| serde::de::Error::custom(format!("invalid duration '{s}': {e}"))),
        }
    }
}

#[cfg(test)]
#[path = "request_tests.rs"]
mod tests;
