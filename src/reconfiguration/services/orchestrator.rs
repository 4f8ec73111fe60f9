//! Two-phase reconfiguration orchestrator.

use crate::access::ports::RoleAssignmentStore;
use crate::reconfiguration::domain::{
    BatchCounts, BatchOutcome, BatchStatus, ReconfigurationBatch, ReconfigurationFailure,
    ReconfigurationOperation, ReconfigurationRequestError, ReconfigurationSettings,
};
use crate::task::{
    domain::{TaskId, TaskState},
    ports::{
        LockOutcome, RuleEvaluator, TaskLock, TaskQuery, TaskRepository, TaskRepositoryError,
        WorkingCalendar,
    },
    services::{ConfigurationMode, TaskConfigurator},
};
use chrono::{DateTime, Duration, Utc};
use mockable::Clock;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, error, info, instrument, warn};

/// Errors that abort a whole batch.
///
/// Anything that goes wrong with a single task is handled locally and
/// surfaces only in the batch counts and the logs.
#[derive(Debug, Error)]
pub enum ReconfigurationError {
    /// The trigger request is invalid.
    #[error(transparent)]
    Request(#[from] ReconfigurationRequestError),
    /// Candidate tasks could not be resolved.
    #[error(transparent)]
    Repository(#[from] TaskRepositoryError),
}

/// What happened to one task.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TaskResult {
    Succeeded,
    Unchanged,
    Skipped,
    Failed,
    Deferred,
}

/// Drives mark, execute and failure-listing batches.
pub struct ReconfigurationOrchestrator<R, E, S, W, C>
where
    R: TaskRepository,
    E: RuleEvaluator,
    S: RoleAssignmentStore,
    W: WorkingCalendar,
    C: Clock + Send + Sync,
{
    repository: Arc<R>,
    configurator: TaskConfigurator<E, S, W>,
    clock: Arc<C>,
    settings: ReconfigurationSettings,
}

impl<R, E, S, W, C> ReconfigurationOrchestrator<R, E, S, W, C>
where
    R: TaskRepository,
    E: RuleEvaluator,
    S: RoleAssignmentStore,
    W: WorkingCalendar,
    C: Clock + Send + Sync,
{
    /// Creates an orchestrator.
    #[must_use]
    pub const fn new(
        repository: Arc<R>,
        configurator: TaskConfigurator<E, S, W>,
        clock: Arc<C>,
        settings: ReconfigurationSettings,
    ) -> Self {
        Self {
            repository,
            configurator,
            clock,
            settings,
        }
    }

    /// Returns the settings in use.
    #[must_use]
    pub const fn settings(&self) -> &ReconfigurationSettings {
        &self.settings
    }

    /// Runs a batch to completion or until its time budget is spent.
    ///
    /// # Errors
    ///
    /// Returns [`ReconfigurationError::Repository`] when the candidate tasks
    /// cannot be resolved. Per-task failures never abort the batch.
    #[instrument(
        name = "reconfiguration_batch",
        skip(self, batch),
        fields(run_id = %batch.run_id(), operation = %batch.operation())
    )]
    pub async fn run(
        &self,
        batch: &ReconfigurationBatch,
    ) -> Result<BatchOutcome, ReconfigurationError> {
        let started = self.clock.utc();
        let deadline = started + batch.controls().max_time_limit();
        let outcome = match batch.operation() {
            ReconfigurationOperation::MarkToReconfigure => self.mark(batch, deadline).await?,
            ReconfigurationOperation::ExecuteReconfigure => self.execute(batch, deadline).await?,
            ReconfigurationOperation::ExecuteReconfigureFailures => {
                self.list_failures(batch).await?
            }
        };
        let counts = outcome.counts;
        info!(
            status = %outcome.status,
            selected = counts.selected,
            succeeded = counts.succeeded,
            unchanged = counts.unchanged,
            skipped = counts.skipped,
            failed = counts.failed,
            deferred = counts.deferred,
            unscheduled = counts.unscheduled,
            reported = outcome.failures.len(),
            "reconfiguration batch finished"
        );
        Ok(outcome)
    }

    async fn mark(
        &self,
        batch: &ReconfigurationBatch,
        deadline: DateTime<Utc>,
    ) -> Result<BatchOutcome, ReconfigurationError> {
        let Some(case_ids) = batch.case_ids().filter(|case_ids| !case_ids.is_empty()) else {
            let missing = ReconfigurationRequestError::MissingCaseFilter(batch.operation());
            return Err(missing.into());
        };
        let query = TaskQuery::new().with_case_ids(case_ids.to_vec());
        let task_ids = self.repository.find_ids(&query).await?;
        let mut counts = BatchCounts {
            selected: task_ids.len(),
            ..BatchCounts::default()
        };
        for (index, task_id) in task_ids.iter().enumerate() {
            if self.budget_spent(deadline) {
                counts.unscheduled = task_ids.len() - index;
                warn!(remaining = counts.unscheduled, "time budget spent; remaining tasks not marked");
                break;
            }
            tally(&mut counts, self.mark_one(*task_id, deadline).await);
        }
        let status = if counts.deferred > 0 {
            BatchStatus::Conflict
        } else {
            BatchStatus::Completed
        };
        Ok(outcome(batch, status, counts, Vec::new()))
    }

    async fn mark_one(&self, task_id: TaskId, deadline: DateTime<Utc>) -> TaskResult {
        let policy = &self.settings.lock_retry;
        let mut attempt: u32 = 0;
        loop {
            attempt += 1;
            match self.repository.lock(task_id, &TaskState::RECONFIGURABLE).await {
                Ok(LockOutcome::Acquired(lock)) => return self.mark_locked(lock).await,
                Ok(LockOutcome::Ineligible(state)) => {
                    info!(task_id = %task_id, state = %state, "task not eligible for reconfiguration; skipped");
                    return TaskResult::Skipped;
                }
                Ok(LockOutcome::NotFound) => {
                    info!(task_id = %task_id, "task no longer exists; skipped");
                    return TaskResult::Skipped;
                }
                Err(err) if err.is_lock_conflict() => {
                    if attempt >= policy.max_attempts {
                        warn!(task_id = %task_id, attempts = attempt, "task lock still held after every retry");
                        return TaskResult::Deferred;
                    }
                    let delay = policy.delay(attempt - 1, &mut rand::thread_rng());
                    let fits_budget = Duration::from_std(delay)
                        .is_ok_and(|wait| self.clock.utc() + wait < deadline);
                    if !fits_budget {
                        warn!(task_id = %task_id, attempts = attempt, "time budget spent waiting for task lock");
                        return TaskResult::Deferred;
                    }
                    debug!(task_id = %task_id, attempt, delay_ms = delay.as_millis(), "task locked by another writer; retrying");
                    tokio::time::sleep(delay).await;
                }
                Err(err) => {
                    error!(task_id = %task_id, error = %err, "failed to lock task for marking");
                    return TaskResult::Failed;
                }
            }
        }
    }

    async fn mark_locked(&self, lock: R::Lock) -> TaskResult {
        let mut task = lock.task().clone();
        let task_id = task.id();
        match task.mark_for_reconfiguration(&self.settings.system_actor, &*self.clock) {
            Ok(true) => match lock.commit(&task).await {
                Ok(()) => {
                    debug!(task_id = %task_id, "task marked for reconfiguration");
                    TaskResult::Succeeded
                }
                Err(err) => {
                    error!(task_id = %task_id, error = %err, "failed to persist reconfiguration mark");
                    TaskResult::Failed
                }
            },
            Ok(false) => {
                release(lock, task_id).await;
                debug!(task_id = %task_id, "task already marked for reconfiguration");
                TaskResult::Unchanged
            }
            Err(err) => {
                release(lock, task_id).await;
                error!(task_id = %task_id, error = %err, "failed to mark task for reconfiguration");
                TaskResult::Failed
            }
        }
    }

    async fn execute(
        &self,
        batch: &ReconfigurationBatch,
        deadline: DateTime<Utc>,
    ) -> Result<BatchOutcome, ReconfigurationError> {
        let query = self.pending_query(batch, None);
        let task_ids = self.repository.find_ids(&query).await?;
        let mut counts = BatchCounts {
            selected: task_ids.len(),
            ..BatchCounts::default()
        };
        for (index, task_id) in task_ids.iter().enumerate() {
            if self.budget_spent(deadline) {
                counts.unscheduled = task_ids.len() - index;
                warn!(remaining = counts.unscheduled, "time budget spent; remaining tasks left for the next run");
                break;
            }
            tally(&mut counts, self.execute_one(*task_id, &query).await);
        }
        Ok(outcome(batch, BatchStatus::Completed, counts, Vec::new()))
    }

    async fn execute_one(&self, task_id: TaskId, query: &TaskQuery) -> TaskResult {
        let lock = match self.repository.lock(task_id, &TaskState::RECONFIGURABLE).await {
            Ok(LockOutcome::Acquired(lock)) => lock,
            Ok(LockOutcome::Ineligible(state)) => {
                info!(task_id = %task_id, state = %state, "task not eligible for reconfiguration; skipped");
                return TaskResult::Skipped;
            }
            Ok(LockOutcome::NotFound) => {
                info!(task_id = %task_id, "task no longer exists; skipped");
                return TaskResult::Skipped;
            }
            Err(err) if err.is_lock_conflict() => {
                info!(task_id = %task_id, "task locked by another writer; deferred to the next run");
                return TaskResult::Deferred;
            }
            Err(err) => {
                error!(task_id = %task_id, error = %err, "failed to lock task for reconfiguration");
                return TaskResult::Failed;
            }
        };
        if !lock.task().is_dirty() {
            release(lock, task_id).await;
            debug!(task_id = %task_id, "task already reconfigured by another run");
            return TaskResult::Unchanged;
        }
        if !query.matches(lock.task()) {
            release(lock, task_id).await;
            debug!(task_id = %task_id, "task no longer matches the batch selection");
            return TaskResult::Unchanged;
        }

        let mut task = lock.task().clone();
        let configured = self
            .configurator
            .configure(
                &mut task,
                ConfigurationMode::Reconfiguration,
                &self.settings.system_actor,
                &*self.clock,
            )
            .await;
        match configured {
            Ok(action) => match lock.commit(&task).await {
                Ok(()) => {
                    info!(task_id = %task_id, action = %action, state = %task.state(), "task reconfigured");
                    TaskResult::Succeeded
                }
                Err(err) => {
                    error!(task_id = %task_id, error = %err, "failed to persist reconfigured task");
                    TaskResult::Failed
                }
            },
            Err(err) => {
                release(lock, task_id).await;
                error!(task_id = %task_id, error = %err, "task reconfiguration failed; left for retry");
                TaskResult::Failed
            }
        }
    }

    async fn list_failures(
        &self,
        batch: &ReconfigurationBatch,
    ) -> Result<BatchOutcome, ReconfigurationError> {
        let reported_before = self.clock.utc() - batch.controls().failure_report_delay();
        let query = self.pending_query(batch, Some(reported_before));
        let tasks = self.repository.find(&query).await?;
        let failures: Vec<ReconfigurationFailure> =
            tasks.iter().filter_map(ReconfigurationFailure::from_task).collect();
        for failure in &failures {
            error!(
                task_id = %failure.task_id,
                case_id = %failure.case_id,
                task_type = %failure.task_type,
                reconfigure_request_time = %failure.reconfigure_request_time,
                "task reconfiguration still pending"
            );
        }
        let counts = BatchCounts {
            selected: tasks.len(),
            ..BatchCounts::default()
        };
        Ok(outcome(batch, BatchStatus::Completed, counts, failures))
    }

    /// Selects eligible dirty tasks inside the retry window.
    fn pending_query(
        &self,
        batch: &ReconfigurationBatch,
        requested_before: Option<DateTime<Utc>>,
    ) -> TaskQuery {
        let window_start = self.clock.utc() - batch.controls().retry_window();
        let after = batch
            .requested_after()
            .map_or(window_start, |explicit| explicit.max(window_start));
        let mut query = TaskQuery::new()
            .with_states(TaskState::RECONFIGURABLE)
            .reconfigure_requested_after(after);
        if let Some(case_ids) = batch.case_ids() {
            query = query.with_case_ids(case_ids.to_vec());
        }
        if let Some(before) = requested_before {
            query = query.reconfigure_requested_before(before);
        }
        query
    }

    fn budget_spent(&self, deadline: DateTime<Utc>) -> bool {
        self.clock.utc() >= deadline
    }
}

async fn release<L: TaskLock>(lock: L, task_id: TaskId) {
    if let Err(err) = lock.rollback().await {
        warn!(task_id = %task_id, error = %err, "failed to release task lock");
    }
}

fn tally(counts: &mut BatchCounts, result: TaskResult) {
    let slot = match result {
        TaskResult::Succeeded => &mut counts.succeeded,
        TaskResult::Unchanged => &mut counts.unchanged,
        TaskResult::Skipped => &mut counts.skipped,
        TaskResult::Failed => &mut counts.failed,
        TaskResult::Deferred => &mut counts.deferred,
    };
    *slot += 1;
}

fn outcome(
    batch: &ReconfigurationBatch,
    status: BatchStatus,
    counts: BatchCounts,
    failures: Vec<ReconfigurationFailure>,
) -> BatchOutcome {
    BatchOutcome {
        run_id: batch.run_id().clone(),
        operation: batch.operation(),
        status,
        counts,
        failures,
    }
}
