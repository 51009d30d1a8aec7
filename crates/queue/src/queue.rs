// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The bounded FIFO plus fixed-size worker pool.
//!
//! `JobQueue` is the only component that ever calls into `isxops-engine`'s
//! `Manager`; everything upstream (the HTTP adapter, `OperationService`)
//! only ever sees `Job` records and `OperationState` snapshots. Pending
//! jobs live in a `Mutex`-guarded deque rather than a channel so a specific
//! job can be pulled back out again by `cancel` before a worker claims it.

use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use isxops_core::{
    Clock, CoreError, Event, EventKind, IdGen, Mode, OperationId, OperationRequest, OperationState,
    OperationStatus, StepStatus, UuidIdGen,
};
use isxops_engine::{Broadcaster, Manager};
use isxops_executors::ExecutorDispatch;
use isxops_registry::Registry;
use isxops_storage::{Job, JobFilter, JobStatus, JobStats, JobStore};
use parking_lot::{Mutex, RwLock};
use tokio::sync::Notify;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::config::QueueConfig;

/// Queue depth plus the per-status job counts `Stats()` returns.
#[derive(Debug, Clone, Copy, Default, serde::Serialize)]
pub struct JobQueueStats {
    pub queue_depth: usize,
    #[serde(flatten)]
    pub jobs: JobStats,
}

type StateHandle = Arc<RwLock<OperationState>>;

/// Fixed-capacity FIFO of pending jobs plus a fixed-size worker pool.
pub struct JobQueue<C: Clock, G: IdGen = UuidIdGen> {
    store: Arc<JobStore<C>>,
    broadcaster: Broadcaster,
    manager: Arc<Manager<C>>,
    clock: C,
    id_gen: G,
    capacity: usize,
    /// Count of jobs admitted but not yet terminal (pending + running +
    /// cancelling). Bounds admission independently of the literal pending
    /// deque length, so a job that is already running still counts against
    /// capacity — matching `Stats()`'s notion of how "full" the queue is.
    admitted: AtomicUsize,
    states: RwLock<HashMap<OperationId, StateHandle>>,
    tokens: RwLock<HashMap<OperationId, CancellationToken>>,
    user_cancelled: RwLock<HashSet<OperationId>>,
    pending: Mutex<VecDeque<OperationId>>,
    notify: Notify,
    shutdown: CancellationToken,
    accepting: AtomicBool,
    worker_handles: Mutex<Vec<JoinHandle<()>>>,
}

impl<C: Clock, G: IdGen> JobQueue<C, G> {
    pub fn new(
        registry: Registry,
        dispatch: ExecutorDispatch,
        broadcaster: Broadcaster,
        clock: C,
        id_gen: G,
        config: QueueConfig,
    ) -> Arc<Self> {
        let manager = Arc::new(Manager::new(
            registry,
            dispatch,
            broadcaster.clone(),
            clock.clone(),
            config.manager,
        ));
        let store = Arc::new(JobStore::new(config.retention, clock.clone()));

        let this = Arc::new(Self {
            store,
            broadcaster,
            manager,
            clock,
            id_gen,
            capacity: config.capacity.max(1),
            admitted: AtomicUsize::new(0),
            states: RwLock::new(HashMap::new()),
            tokens: RwLock::new(HashMap::new()),
            user_cancelled: RwLock::new(HashSet::new()),
            pending: Mutex::new(VecDeque::new()),
            notify: Notify::new(),
            shutdown: CancellationToken::new(),
            accepting: AtomicBool::new(true),
            worker_handles: Mutex::new(Vec::new()),
        });

        let handles = (0..config.workers)
            .map(|_| {
                let worker = Arc::clone(&this);
                tokio::spawn(async move { worker.run_worker().await })
            })
            .collect();
        *this.worker_handles.lock() = handles;

        this
    }

    /// Validate, assign an id if absent, and admit a request to the pending
    /// queue. Never blocks: a full queue is rejected outright.
    pub fn enqueue(&self, mut request: OperationRequest) -> Result<OperationId, CoreError> {
        if !self.accepting.load(Ordering::SeqCst) {
            return Err(CoreError::queue_full("queue is shutting down"));
        }

        request.validate_structure()?;
        self.manager.validate_types(&request)?;

        let id = request
            .id
            .clone()
            .unwrap_or_else(|| OperationId::new(self.id_gen.next()));
        request.id = Some(id.clone());

        let previous = self.admitted.fetch_add(1, Ordering::SeqCst);
        if previous >= self.capacity {
            self.admitted.fetch_sub(1, Ordering::SeqCst);
            return Err(CoreError::queue_full(format!(
                "queue at capacity ({})",
                self.capacity
            )));
        }
        self.pending.lock().push_back(id.clone());

        let step_ids: Vec<(String, String)> = request
            .steps
            .iter()
            .map(|s| (s.id.clone(), s.id.clone()))
            .collect();

        {
            let mut states = self.states.write();
            let existing = states.get(&id).cloned();
            match (request.mode, existing) {
                (Mode::Resume, Some(state)) => {
                    state.write().reset_for_resume();
                }
                _ => {
                    states.insert(id.clone(), Arc::new(RwLock::new(OperationState::new(id.clone(), &step_ids))));
                }
            }
        }

        let now = self.clock.epoch_ms();
        self.store.insert(Job::new(id.clone(), request, now));
        self.broadcaster
            .publish(Event::operation(EventKind::JobQueued, id.clone(), "pending", now));
        self.notify.notify_one();

        Ok(id)
    }

    pub fn get_job(&self, id: &OperationId) -> Result<Job, CoreError> {
        self.store.get(id)
    }

    /// The shared fan-out hub, for callers (e.g. the HTTP adapter's
    /// WebSocket handler) that need to subscribe directly.
    pub fn broadcaster(&self) -> &Broadcaster {
        &self.broadcaster
    }

    pub fn list_jobs(&self, filter: &JobFilter) -> Vec<Job> {
        self.store.list(filter)
    }

    pub fn stats(&self) -> JobQueueStats {
        JobQueueStats {
            queue_depth: self.pending.lock().len(),
            jobs: self.store.stats(),
        }
    }

    /// Deep-copied snapshot of the operation's live state, for `GetStatus`.
    pub fn operation_state(&self, id: &OperationId) -> Result<OperationState, CoreError> {
        self.states
            .read()
            .get(id)
            .map(|s| s.read().clone())
            .ok_or_else(|| CoreError::not_found(format!("operation '{id}' not found")))
    }

    /// All known operation snapshots, optionally filtered by status,
    /// newest-started first.
    pub fn list_operation_states(&self, status: Option<OperationStatus>) -> Vec<OperationState> {
        let mut list: Vec<OperationState> = self
            .states
            .read()
            .values()
            .map(|s| s.read().clone())
            .filter(|s| status.map_or(true, |f| s.status == f))
            .collect();
        list.sort_unstable_by(|a, b| b.started_at_ms.unwrap_or(0).cmp(&a.started_at_ms.unwrap_or(0)));
        list
    }

    /// Cancel a pending-or-running job. `not-found` on an unknown id,
    /// `invalid-state` if it is already terminal or already cancelling.
    pub fn cancel(&self, id: &OperationId) -> Result<(), CoreError> {
        {
            let mut pending = self.pending.lock();
            if let Some(pos) = pending.iter().position(|pid| pid == id) {
                pending.remove(pos);
                drop(pending);
                return self.cancel_pending_job(id);
            }
        }

        let job = self.store.get(id)?;
        if job.status.is_terminal() || job.status == JobStatus::Cancelling {
            return Err(CoreError::invalid_state(format!(
                "job '{id}' is not in a cancellable state"
            )));
        }

        let Some(token) = self.tokens.read().get(id).cloned() else {
            return Err(CoreError::invalid_state(format!("job '{id}' is not running")));
        };
        self.user_cancelled.write().insert(id.clone());
        self.store.update(id, |job| job.mark_cancelling());
        token.cancel();
        Ok(())
    }

    fn cancel_pending_job(&self, id: &OperationId) -> Result<(), CoreError> {
        let now = self.clock.epoch_ms();
        let found = self
            .store
            .update(id, |job| job.finish(JobStatus::Cancelled, Some("cancelled before running".to_string()), now));
        if !found {
            return Err(CoreError::not_found(format!("job '{id}' not found")));
        }
        self.admitted.fetch_sub(1, Ordering::SeqCst);

        if let Some(state) = self.states.read().get(id).cloned() {
            let mut s = state.write();
            for step in &mut s.steps {
                if !step.status.is_terminal() {
                    step.finish(StepStatus::Cancelled, Some("operation cancelled".to_string()), now);
                }
            }
            s.status = OperationStatus::Cancelled;
            s.error = Some("operation cancelled before it started running".to_string());
            s.ended_at_ms = Some(now);
        }

        self.broadcaster
            .publish(Event::operation(EventKind::OperationCancelled, id.clone(), "cancelled", now));
        Ok(())
    }

    /// Stop accepting new jobs, cancel everything in flight, and wait up to
    /// `grace` for workers to exit before aborting them.
    pub async fn shutdown(&self, grace: Duration) {
        self.accepting.store(false, Ordering::SeqCst);

        let now = self.clock.epoch_ms();
        let drained: Vec<OperationId> = self.pending.lock().drain(..).collect();
        for id in drained {
            self.store
                .update(&id, |job| job.finish(JobStatus::Cancelled, Some("queue shutting down".to_string()), now));
            self.admitted.fetch_sub(1, Ordering::SeqCst);
        }

        for token in self.tokens.read().values() {
            token.cancel();
        }
        self.shutdown.cancel();
        self.notify.notify_waiters();

        let handles: Vec<JoinHandle<()>> = self.worker_handles.lock().drain(..).collect();
        let abort_handles: Vec<_> = handles.iter().map(|h| h.abort_handle()).collect();
        if tokio::time::timeout(grace, futures::future::join_all(handles)).await.is_err() {
            tracing::warn!("job queue workers did not exit within grace period; aborting");
            for handle in abort_handles {
                handle.abort();
            }
        }
    }

    async fn run_worker(self: Arc<Self>) {
        loop {
            let Some(id) = self.dequeue().await else {
                return;
            };
            self.run_job(&id).await;
        }
    }

    async fn dequeue(&self) -> Option<OperationId> {
        loop {
            if let Some(id) = self.pending.lock().pop_front() {
                return Some(id);
            }
            if self.shutdown.is_cancelled() {
                return None;
            }
            tokio::select! {
                _ = self.notify.notified() => {}
                _ = self.shutdown.cancelled() => return None,
            }
        }
    }

    async fn run_job(&self, id: &OperationId) {
        let now = self.clock.epoch_ms();
        if !self.store.update(id, |job| job.mark_running(now)) {
            return;
        }
        let Ok(job) = self.store.get(id) else { return };
        let Some(state) = self.states.read().get(id).cloned() else {
            return;
        };

        let token = CancellationToken::new();
        self.tokens.write().insert(id.clone(), token.clone());

        let timed_out = Arc::new(AtomicBool::new(false));
        let deadline_task = job.request.deadline.map(|deadline| {
            let token = token.clone();
            let timed_out = Arc::clone(&timed_out);
            tokio::spawn(async move {
                tokio::select! {
                    _ = tokio::time::sleep(deadline) => {
                        timed_out.store(true, Ordering::SeqCst);
                        token.cancel();
                    }
                    _ = token.cancelled() => {}
                }
            })
        });

        self.manager.execute(&job.request, Arc::clone(&state), token).await;

        if let Some(task) = deadline_task {
            task.abort();
        }
        self.tokens.write().remove(id);
        self.user_cancelled.write().remove(id);

        let snapshot = state.read().clone();
        let now = self.clock.epoch_ms();
        let (status, error) = match snapshot.status {
            OperationStatus::Completed => (JobStatus::Completed, None),
            OperationStatus::Failed => (JobStatus::Failed, snapshot.error.clone()),
            OperationStatus::Cancelled if timed_out.load(Ordering::SeqCst) => {
                (JobStatus::Failed, Some("operation deadline exceeded".to_string()))
            }
            OperationStatus::Cancelled => (JobStatus::Cancelled, snapshot.error.clone()),
            OperationStatus::Pending | OperationStatus::Running => (
                JobStatus::Failed,
                Some("operation ended in a non-terminal state".to_string()),
            ),
        };

        let progress = coarse_progress(&snapshot);
        self.store.update(id, |job| {
            job.set_progress(progress);
            job.finish(status, error, now);
        });
        self.admitted.fetch_sub(1, Ordering::SeqCst);
    }
}

/// Coarse job-level progress derived as the unweighted mean of step
/// progress. A real deployment could weight steps differently; the core
/// orchestrator treats every step as equally significant.
fn coarse_progress(state: &OperationState) -> u8 {
    if state.steps.is_empty() {
        return 100;
    }
    let total: u32 = state.steps.iter().map(|s| s.progress as u32).sum();
    (total / state.steps.len() as u32) as u8
}
