// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Runs one operation's step DAG to completion.
//!
//! The Manager is the only writer of a running operation's
//! [`OperationState`]: callers only ever see the snapshot behind the
//! `Arc<RwLock<OperationState>>` a `JobQueue` worker hands it. Every
//! mutation is paired with exactly one event published to the
//! [`crate::Broadcaster`].

use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::Duration;

use isxops_core::{Clock, CoreError, Event, EventKind, OperationId, OperationRequest, OperationState, StepStatus};
use isxops_executors::{EmitHandle, ExecutorDispatch, StepContext, StepError, StepErrorKind};
use isxops_registry::Registry;
use parking_lot::RwLock;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;

use crate::broadcaster::Broadcaster;

/// Tuning knobs that do not vary per-request.
#[derive(Debug, Clone, Copy)]
pub struct ManagerConfig {
    /// Upper bound on steps run concurrently within one operation.
    pub fan_out: usize,
    /// How long a cancelled operation waits for in-flight steps to return
    /// before forcing every non-terminal step to `cancelled`.
    pub cancel_grace: Duration,
}

impl Default for ManagerConfig {
    fn default() -> Self {
        Self {
            fan_out: 4,
            cancel_grace: Duration::from_secs(5),
        }
    }
}

/// Orchestrates one operation's DAG against the registered step types.
pub struct Manager<C: Clock> {
    registry: Registry,
    dispatch: ExecutorDispatch,
    broadcaster: Broadcaster,
    clock: C,
    config: ManagerConfig,
}

struct StepOutcome {
    step_id: String,
    result: Result<(), StepError>,
}

impl<C: Clock> Manager<C> {
    pub fn new(registry: Registry, dispatch: ExecutorDispatch, broadcaster: Broadcaster, clock: C, config: ManagerConfig) -> Self {
        Self {
            registry,
            dispatch,
            broadcaster,
            clock,
            config,
        }
    }

    /// Validate that every step type in the request is registered. Bind-time
    /// validation (the HTTP adapter) already does this before enqueue; this
    /// is a defensive check for callers that invoke the Manager directly.
    pub fn validate_types(&self, request: &OperationRequest) -> Result<(), CoreError> {
        for step in &request.steps {
            self.registry.lookup(&step.step_type)?;
            if !self.dispatch.contains(&step.step_type) {
                return Err(CoreError::validation(format!(
                    "no executor registered for type '{}'",
                    step.step_type
                )));
            }
        }
        Ok(())
    }

    /// Run `request` to a terminal state, mutating `state` in place and
    /// publishing one event per mutation. Returns once every step is
    /// terminal or the operation itself reaches `cancelled`.
    pub async fn execute(
        &self,
        request: &OperationRequest,
        state: Arc<RwLock<OperationState>>,
        cancellation: CancellationToken,
    ) {
        let operation_id = state.read().id.clone();

        if let Err(err) = self.validate_types(request) {
            self.fail_operation(&state, &err.detail);
            return;
        }

        {
            let mut s = state.write();
            s.status = isxops_core::OperationStatus::Running;
            s.started_at_ms = Some(self.clock.epoch_ms());
        }
        self.publish(Event::operation(
            EventKind::OperationStarted,
            operation_id.clone(),
            "running",
            self.clock.epoch_ms(),
        ));

        let dependents = reverse_dependency_map(request);
        let dependencies = request.dependency_map();
        // Resume mode (crates/core/src/state.rs::reset_for_resume) leaves
        // already-terminal steps untouched; only steps still pending in the
        // live state are eligible to (re-)run.
        let mut pending: HashSet<String> = request
            .steps
            .iter()
            .map(|s| s.id.clone())
            .filter(|id| !state.read().step(id).is_some_and(|s| s.status.is_terminal()))
            .collect();
        let mut in_flight: HashSet<String> = HashSet::new();
        let semaphore = Arc::new(Semaphore::new(self.config.fan_out.max(1)));
        let mut joins: JoinSet<StepOutcome> = JoinSet::new();
        // A resume that starts with a step already terminally `failed` never
        // gets a chance to re-run it (`reset_for_resume` only resets
        // `running`/`cancelled` steps) — carry that failure into this run's
        // outcome so the operation doesn't report `completed` just because
        // nothing was left to schedule.
        let mut operation_failed: Option<String> = state.read().steps.iter().find_map(|step| {
            if step.status != StepStatus::Failed {
                return None;
            }
            let recoverable = request
                .steps
                .iter()
                .find(|s| s.id == step.id)
                .and_then(|s| self.registry.lookup(&s.step_type).ok())
                .map(|d| d.recoverable)
                .unwrap_or(false);
            if recoverable {
                None
            } else {
                Some(format!("step '{}' failed: {}", step.id, step.error.clone().unwrap_or_default()))
            }
        });
        // Set the moment cancellation is first observed; bounds how long we
        // wait on non-cooperative step tasks before forcing them terminal.
        let mut cancel_deadline: Option<tokio::time::Instant> = None;

        loop {
            if operation_failed.is_none() && !cancellation.is_cancelled() {
                let ready: Vec<String> = pending
                    .iter()
                    .filter(|id| {
                        dependencies
                            .get(id.as_str())
                            .map(|deps| deps.iter().all(|d| state.read().step(d).is_some_and(|s| s.status.satisfies_dependency())))
                            .unwrap_or(true)
                    })
                    .cloned()
                    .collect();

                for step_id in ready {
                    pending.remove(&step_id);
                    in_flight.insert(step_id.clone());
                    self.spawn_step(
                        request,
                        &step_id,
                        operation_id.clone(),
                        Arc::clone(&state),
                        cancellation.child_token(),
                        Arc::clone(&semaphore),
                        &mut joins,
                    );
                }
            }

            if in_flight.is_empty() {
                break;
            }

            if cancellation.is_cancelled() && cancel_deadline.is_none() {
                cancel_deadline = Some(tokio::time::Instant::now() + self.config.cancel_grace);
            }

            let joined = if let Some(deadline) = cancel_deadline {
                tokio::select! {
                    result = joins.join_next() => result,
                    _ = tokio::time::sleep_until(deadline) => {
                        tracing::warn!(
                            operation_id = %operation_id,
                            in_flight = in_flight.len(),
                            "cancel grace elapsed with steps still in flight; forcing cancellation"
                        );
                        break;
                    }
                }
            } else {
                joins.join_next().await
            };

            let Some(result) = joined else {
                break;
            };
            let outcome = match result {
                Ok(outcome) => outcome,
                Err(join_err) => StepOutcome {
                    step_id: join_err.to_string(),
                    result: Err(StepError::fatal(format!("step task panicked: {join_err}"))),
                },
            };

            in_flight.remove(&outcome.step_id);
            self.finish_step(
                request,
                &outcome.step_id,
                outcome.result,
                &state,
                &dependents,
                &mut pending,
                &mut operation_failed,
            );
        }

        self.finalize(&state, &cancellation, operation_failed).await;
    }

    #[allow(clippy::too_many_arguments)]
    fn spawn_step(
        &self,
        request: &OperationRequest,
        step_id: &str,
        operation_id: OperationId,
        state: Arc<RwLock<OperationState>>,
        cancellation: CancellationToken,
        semaphore: Arc<Semaphore>,
        joins: &mut JoinSet<StepOutcome>,
    ) {
        // `step_id` came from the ready set, which is built from `request.steps` itself.
        #[allow(clippy::expect_used)]
        let config = request
            .steps
            .iter()
            .find(|s| s.id == step_id)
            .expect("ready step exists in request")
            .clone();
        // `validate_types` rejected the request up front if any step type were unregistered.
        #[allow(clippy::expect_used)]
        let definition = self
            .registry
            .lookup(&config.step_type)
            .expect("type validated before execution")
            .clone();
        #[allow(clippy::expect_used)]
        let executor = self
            .dispatch
            .get(&config.step_type)
            .expect("type validated before execution");
        let broadcaster = self.broadcaster.clone();
        let clock = self.clock.clone();
        let step_id = step_id.to_string();

        joins.spawn(async move {
            let step_id_for_panic = step_id.clone();
            let body = std::panic::AssertUnwindSafe(run_step_attempts(
                config,
                definition,
                executor,
                operation_id,
                step_id.clone(),
                state,
                cancellation,
                semaphore,
                broadcaster,
                clock,
            ));
            match futures::FutureExt::catch_unwind(body).await {
                Ok(outcome) => outcome,
                Err(_) => StepOutcome {
                    step_id: step_id_for_panic,
                    result: Err(StepError::fatal("step executor panicked")),
                },
            }
        });
    }
}

#[allow(clippy::too_many_arguments)]
async fn run_step_attempts(
    config: isxops_core::StepConfig,
    definition: isxops_registry::StepDefinition,
    executor: Arc<dyn isxops_executors::StepExecutor>,
    operation_id: OperationId,
    step_id: String,
    state: Arc<RwLock<OperationState>>,
    cancellation: CancellationToken,
    semaphore: Arc<Semaphore>,
    broadcaster: Broadcaster,
    clock: impl Clock,
) -> StepOutcome {
    let max_attempts = config
        .retries
        .map(|r| r + 1)
        .unwrap_or(definition.retry_policy.max_attempts)
        .max(1);
    let timeout = config.timeout.unwrap_or(definition.default_timeout);

    {
        let mut s = state.write();
        if let Some(step) = s.step_mut(&step_id) {
            step.start(0, clock.epoch_ms());
        }
    }
    broadcaster.publish(Event::step(
        EventKind::StepStarted,
        operation_id.clone(),
        step_id.clone(),
        "running",
        clock.epoch_ms(),
    ));

    let mut last_err = StepError::fatal("step never ran");
    for attempt in 0..max_attempts {
        if attempt > 0 {
            let delay = definition.retry_policy.delay_for(attempt);
            if !delay.is_zero() {
                tokio::select! {
                    _ = tokio::time::sleep(delay) => {}
                    _ = cancellation.cancelled() => {
                        return StepOutcome { step_id, result: Err(StepError::cancelled()) };
                    }
                }
            }
            let mut s = state.write();
            if let Some(step) = s.step_mut(&step_id) {
                step.start(attempt, clock.epoch_ms());
            }
        }

        let _permit = semaphore.acquire().await.ok();
        let ctx = StepContext::new(operation_id.clone(), step_id.clone(), attempt, cancellation.child_token());
        let broadcaster_for_emit = broadcaster.clone();
        let state_for_emit = Arc::clone(&state);
        let operation_id_for_emit = operation_id.clone();
        let step_id_for_emit = step_id.clone();
        let clock_for_emit = clock.clone();
        let emit = EmitHandle::new(move |progress, message| {
            let mut s = state_for_emit.write();
            if let Some(step) = s.step_mut(&step_id_for_emit) {
                step.set_progress(progress, Some(message.clone()));
            }
            drop(s);
            broadcaster_for_emit.publish(
                Event::step(
                    EventKind::StepProgress,
                    operation_id_for_emit.clone(),
                    step_id_for_emit.clone(),
                    "running",
                    clock_for_emit.epoch_ms(),
                )
                .with_progress(progress)
                .with_message(message),
            );
        });

        let attempt_result = tokio::select! {
            result = executor.run(ctx, config.parameters.clone(), emit) => result,
            _ = tokio::time::sleep(timeout) => Err(StepError::timeout()),
            _ = cancellation.cancelled() => Err(StepError::cancelled()),
        };

        match attempt_result {
            Ok(()) => {
                return StepOutcome { step_id, result: Ok(()) };
            }
            Err(err) if err.kind == StepErrorKind::Retryable && attempt + 1 < max_attempts => {
                last_err = err;
                continue;
            }
            Err(err) => {
                return StepOutcome { step_id, result: Err(err) };
            }
        }
    }

    StepOutcome { step_id, result: Err(last_err) }
}

impl<C: Clock> Manager<C> {
    fn finish_step(
        &self,
        request: &OperationRequest,
        step_id: &str,
        result: Result<(), StepError>,
        state: &Arc<RwLock<OperationState>>,
        dependents: &HashMap<String, Vec<String>>,
        pending: &mut HashSet<String>,
        operation_failed: &mut Option<String>,
    ) {
        let now = self.clock.epoch_ms();
        match result {
            Ok(()) => {
                let mut s = state.write();
                if let Some(step) = s.step_mut(step_id) {
                    step.finish(StepStatus::Completed, None, now);
                }
                drop(s);
                self.publish(Event::step(
                    EventKind::StepCompleted,
                    request_operation_id(state),
                    step_id,
                    "completed",
                    now,
                ).with_progress(100));
            }
            Err(err) => {
                let terminal_status = if err.kind == StepErrorKind::Cancelled {
                    StepStatus::Cancelled
                } else {
                    StepStatus::Failed
                };
                let message = err.message.clone();
                {
                    let mut s = state.write();
                    if let Some(step) = s.step_mut(step_id) {
                        step.finish(terminal_status, Some(message.clone()), now);
                    }
                }
                self.publish(Event::step(
                    EventKind::StepFailed,
                    request_operation_id(state),
                    step_id,
                    "failed",
                    now,
                ).with_message(message.clone()));

                let recoverable = request
                    .steps
                    .iter()
                    .find(|s| s.id == step_id)
                    .and_then(|s| self.registry.lookup(&s.step_type).ok())
                    .map(|d| d.recoverable)
                    .unwrap_or(false);

                cascade_skip(step_id, dependents, state, pending, now, &self.broadcaster);

                if !recoverable && err.kind != StepErrorKind::Cancelled && operation_failed.is_none() {
                    *operation_failed = Some(format!("step '{step_id}' failed: {message}"));
                }
            }
        }
    }

    async fn finalize(&self, state: &Arc<RwLock<OperationState>>, cancellation: &CancellationToken, operation_failed: Option<String>) {
        let now = self.clock.epoch_ms();
        let operation_id = state.read().id.clone();

        if cancellation.is_cancelled() {
            let mut s = state.write();
            for step in &mut s.steps {
                if !step.status.is_terminal() {
                    step.finish(StepStatus::Cancelled, Some("operation cancelled".to_string()), now);
                }
            }
            s.status = isxops_core::OperationStatus::Cancelled;
            s.error = Some("operation cancelled".to_string());
            s.ended_at_ms = Some(now);
            drop(s);
            self.publish(Event::operation(EventKind::OperationCancelled, operation_id, "cancelled", now));
            return;
        }

        let mut s = state.write();
        s.ended_at_ms = Some(now);
        match operation_failed {
            Some(error) => {
                s.status = isxops_core::OperationStatus::Failed;
                s.error = Some(error);
                drop(s);
                self.publish(Event::operation(EventKind::StepFailed, operation_id, "failed", now));
            }
            None => {
                s.status = isxops_core::OperationStatus::Completed;
                drop(s);
                self.publish(Event::operation(EventKind::OperationCompleted, operation_id, "completed", now));
            }
        }
    }

    fn fail_operation(&self, state: &Arc<RwLock<OperationState>>, detail: &str) {
        let now = self.clock.epoch_ms();
        let mut s = state.write();
        s.status = isxops_core::OperationStatus::Failed;
        s.error = Some(detail.to_string());
        s.started_at_ms = Some(now);
        s.ended_at_ms = Some(now);
        let operation_id = s.id.clone();
        drop(s);
        self.publish(Event::operation(EventKind::StepFailed, operation_id, "failed", now));
    }

    fn publish(&self, event: Event) {
        self.broadcaster.publish(event);
    }
}

fn request_operation_id(state: &Arc<RwLock<OperationState>>) -> OperationId {
    state.read().id.clone()
}

fn reverse_dependency_map(request: &OperationRequest) -> HashMap<String, Vec<String>> {
    let mut dependents: HashMap<String, Vec<String>> = HashMap::new();
    for step in &request.steps {
        for dep in &step.dependencies {
            dependents.entry(dep.clone()).or_default().push(step.id.clone());
        }
    }
    dependents
}

/// Recursively marks every transitive dependent of a failed/cancelled step
/// as `skipped`, since it can never satisfy its dependency now.
fn cascade_skip(
    step_id: &str,
    dependents: &HashMap<String, Vec<String>>,
    state: &Arc<RwLock<OperationState>>,
    pending: &mut HashSet<String>,
    now: u64,
    broadcaster: &Broadcaster,
) {
    let Some(children) = dependents.get(step_id) else {
        return;
    };
    for child in children {
        if !pending.remove(child) {
            continue;
        }
        let operation_id = {
            let mut s = state.write();
            let Some(step) = s.step_mut(child) else {
                continue;
            };
            if step.status.is_terminal() {
                continue;
            }
            step.finish(StepStatus::Skipped, Some(format!("dependency '{step_id}' did not complete")), now);
            s.id.clone()
        };
        broadcaster.publish(Event::step(
            EventKind::StepCompleted,
            operation_id,
            child.clone(),
            "skipped",
            now,
        ));
        cascade_skip(child, dependents, state, pending, now, broadcaster);
    }
}

#[cfg(test)]
#[path = "manager_tests.rs"]
mod tests;
