//! Repository port for task persistence, lookup and row locking.

use crate::task::domain::{CaseId, Task, TaskId, TaskState};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use thiserror::Error;

/// Result type for task repository operations.
pub type TaskRepositoryResult<T> = Result<T, TaskRepositoryError>;

/// Predicate used to select tasks.
///
/// Empty collections and `None` fields do not restrict the selection.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaskQuery {
    /// Restrict to tasks of these cases.
    pub case_ids: Vec<CaseId>,
    /// Restrict to these task identifiers.
    pub task_ids: Vec<TaskId>,
    /// Restrict to tasks in these states.
    pub states: Vec<TaskState>,
    /// Restrict to dirty tasks marked strictly after this instant.
    pub reconfigure_requested_after: Option<DateTime<Utc>>,
    /// Restrict to dirty tasks marked at or before this instant.
    pub reconfigure_requested_before: Option<DateTime<Utc>>,
}

impl TaskQuery {
    /// Returns a query matching every task.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Restricts the query to the given cases.
    #[must_use]
    pub fn with_case_ids(mut self, case_ids: impl IntoIterator<Item = CaseId>) -> Self {
        self.case_ids = case_ids.into_iter().collect();
        self
    }

    /// Restricts the query to the given task identifiers.
    #[must_use]
    pub fn with_task_ids(mut self, task_ids: impl IntoIterator<Item = TaskId>) -> Self {
        self.task_ids = task_ids.into_iter().collect();
        self
    }

    /// Restricts the query to the given states.
    #[must_use]
    pub fn with_states(mut self, states: impl IntoIterator<Item = TaskState>) -> Self {
        self.states = states.into_iter().collect();
        self
    }

    /// Restricts the query to tasks marked for reconfiguration after `after`.
    #[must_use]
    pub const fn reconfigure_requested_after(mut self, after: DateTime<Utc>) -> Self {
        self.reconfigure_requested_after = Some(after);
        self
    }

    /// Restricts the query to tasks marked for reconfiguration at or before
    /// `before`.
    #[must_use]
    pub const fn reconfigure_requested_before(mut self, before: DateTime<Utc>) -> Self {
        self.reconfigure_requested_before = Some(before);
        self
    }

    /// Evaluates the predicate against a task.
    #[must_use]
    pub fn matches(&self, task: &Task) -> bool {
        let case_matches =
            self.case_ids.is_empty() || self.case_ids.contains(task.case().case_id());
        let id_matches = self.task_ids.is_empty() || self.task_ids.contains(&task.id());
        let state_matches = self.states.is_empty() || self.states.contains(&task.state());
        let requested = task.reconfigure_request_time();
        let after_matches = self
            .reconfigure_requested_after
            .is_none_or(|after| requested.is_some_and(|time| time > after));
        let before_matches = self
            .reconfigure_requested_before
            .is_none_or(|before| requested.is_some_and(|time| time <= before));
        case_matches && id_matches && state_matches && after_matches && before_matches
    }
}

/// Outcome of a lock attempt that did not conflict with another writer.
#[derive(Debug)]
pub enum LockOutcome<L> {
    /// The row is locked and its current snapshot is available.
    Acquired(L),
    /// The task exists but its state is outside the lock predicate.
    Ineligible(TaskState),
    /// No task has the requested identifier.
    NotFound,
}

/// Exclusive hold on one task row.
///
/// The guard carries the task snapshot read under the lock. Callers mutate a
/// copy and hand it to [`TaskLock::commit`]; anything else (an explicit
/// [`TaskLock::rollback`] or dropping the guard) discards the changes and
/// releases the lock.
#[async_trait]
pub trait TaskLock: Send {
    /// Returns the task as read under the lock.
    fn task(&self) -> &Task;

    /// Persists `task` (attributes, state, audit fields and the full role
    /// grant set) and releases the lock.
    ///
    /// # Errors
    ///
    /// Returns [`TaskRepositoryError`] when the write fails; nothing is
    /// persisted in that case.
    async fn commit(self, task: &Task) -> TaskRepositoryResult<()>;

    /// Releases the lock without persisting anything.
    ///
    /// # Errors
    ///
    /// Returns [`TaskRepositoryError::Persistence`] when the underlying
    /// transaction cannot be rolled back cleanly.
    async fn rollback(self) -> TaskRepositoryResult<()>;
}

/// Task persistence contract.
#[async_trait]
pub trait TaskRepository: Send + Sync {
    /// Lock guard handed out by [`TaskRepository::lock`].
    type Lock: TaskLock;

    /// Stores a new task.
    ///
    /// # Errors
    ///
    /// Returns [`TaskRepositoryError::DuplicateTask`] when the task ID already
    /// exists.
    async fn store(&self, task: &Task) -> TaskRepositoryResult<()>;

    /// Finds a task by internal task identifier.
    ///
    /// Returns `None` when the task does not exist.
    async fn find_by_id(&self, id: TaskId) -> TaskRepositoryResult<Option<Task>>;

    /// Returns every task of the given case.
    async fn find_by_case_id(&self, case_id: &CaseId) -> TaskRepositoryResult<Vec<Task>>;

    /// Returns the tasks matching `query`, ordered by creation time.
    async fn find(&self, query: &TaskQuery) -> TaskRepositoryResult<Vec<Task>>;

    /// Returns the identifiers of tasks matching `query`, ordered by
    /// creation time.
    async fn find_ids(&self, query: &TaskQuery) -> TaskRepositoryResult<Vec<TaskId>>;

    /// Takes an exclusive lock on the task row, scoped to `eligible` states.
    ///
    /// # Errors
    ///
    /// Returns [`TaskRepositoryError::LockConflict`] when another writer
    /// holds the row, or [`TaskRepositoryError::Persistence`] on storage
    /// failure.
    async fn lock(
        &self,
        id: TaskId,
        eligible: &[TaskState],
    ) -> TaskRepositoryResult<LockOutcome<Self::Lock>>;
}

/// Errors returned by task repository implementations.
#[derive(Debug, Clone, Error)]
pub enum TaskRepositoryError {
    /// A task with the same identifier already exists.
    #[error("duplicate task identifier: {0}")]
    DuplicateTask(TaskId),

    /// The task was not found.
    #[error("task not found: {0}")]
    NotFound(TaskId),

    /// Another writer holds the task row.
    #[error("task {0} is locked by another writer")]
    LockConflict(TaskId),

    /// Persistence-layer failure.
    #[error("persistence error: {0}")]
    Persistence(Arc<dyn std::error::Error + Send + Sync>),
}

impl TaskRepositoryError {
    /// Wraps a persistence error.
    pub fn persistence(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::Persistence(Arc::new(err))
    }

    /// Returns whether the error is a transient lock conflict.
    #[must_use]
    pub const fn is_lock_conflict(&self) -> bool {
        matches!(self, Self::LockConflict(_))
    }
}
