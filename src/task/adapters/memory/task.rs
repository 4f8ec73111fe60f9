//! In-memory repository for task lifecycle tests.

use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, RwLock};

use crate::task::{
    domain::{CaseId, Task, TaskId, TaskState},
    ports::{
        LockOutcome, TaskLock, TaskQuery, TaskRepository, TaskRepositoryError,
        TaskRepositoryResult,
    },
};

/// Thread-safe in-memory task repository with per-task exclusive locks.
#[derive(Debug, Clone, Default)]
pub struct InMemoryTaskRepository {
    state: Arc<RwLock<InMemoryTaskState>>,
}

#[derive(Debug, Default)]
struct InMemoryTaskState {
    tasks: HashMap<TaskId, Task>,
    insertion_order: Vec<TaskId>,
    locked: HashSet<TaskId>,
}

impl InMemoryTaskRepository {
    /// Creates an empty in-memory repository.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns whether a lock is currently held on the task.
    #[must_use]
    pub fn is_locked(&self, id: TaskId) -> bool {
        self.state
            .read()
            .is_ok_and(|state| state.locked.contains(&id))
    }
}

fn poisoned(err: impl ToString) -> TaskRepositoryError {
    TaskRepositoryError::persistence(std::io::Error::other(err.to_string()))
}

/// Collects matching tasks in insertion order.
fn select(state: &InMemoryTaskState, query: &TaskQuery) -> Vec<Task> {
    state
        .insertion_order
        .iter()
        .filter_map(|id| state.tasks.get(id))
        .filter(|task| query.matches(task))
        .cloned()
        .collect()
}

#[async_trait]
impl TaskRepository for InMemoryTaskRepository {
    type Lock = InMemoryTaskLock;

    async fn store(&self, task: &Task) -> TaskRepositoryResult<()> {
        let mut state = self.state.write().map_err(poisoned)?;
        if state.tasks.contains_key(&task.id()) {
            return Err(TaskRepositoryError::DuplicateTask(task.id()));
        }
        state.insertion_order.push(task.id());
        state.tasks.insert(task.id(), task.clone());
        Ok(())
    }

    async fn find_by_id(&self, id: TaskId) -> TaskRepositoryResult<Option<Task>> {
        let state = self.state.read().map_err(poisoned)?;
        Ok(state.tasks.get(&id).cloned())
    }

    async fn find_by_case_id(&self, case_id: &CaseId) -> TaskRepositoryResult<Vec<Task>> {
        let state = self.state.read().map_err(poisoned)?;
        let query = TaskQuery::new().with_case_ids([case_id.clone()]);
        Ok(select(&state, &query))
    }

    async fn find(&self, query: &TaskQuery) -> TaskRepositoryResult<Vec<Task>> {
        let state = self.state.read().map_err(poisoned)?;
        Ok(select(&state, query))
    }

    async fn find_ids(&self, query: &TaskQuery) -> TaskRepositoryResult<Vec<TaskId>> {
        let state = self.state.read().map_err(poisoned)?;
        Ok(select(&state, query).iter().map(Task::id).collect())
    }

    async fn lock(
        &self,
        id: TaskId,
        eligible: &[TaskState],
    ) -> TaskRepositoryResult<LockOutcome<Self::Lock>> {
        let mut state = self.state.write().map_err(poisoned)?;
        let Some(task) = state.tasks.get(&id).cloned() else {
            return Ok(LockOutcome::NotFound);
        };
        if state.locked.contains(&id) {
            return Err(TaskRepositoryError::LockConflict(id));
        }
        if !eligible.contains(&task.state()) {
            return Ok(LockOutcome::Ineligible(task.state()));
        }
        state.locked.insert(id);
        Ok(LockOutcome::Acquired(InMemoryTaskLock {
            state: Arc::clone(&self.state),
            task,
            released: false,
        }))
    }
}

/// Lock guard for [`InMemoryTaskRepository`].
///
/// Dropping the guard without committing releases the lock and discards
/// every change.
#[derive(Debug)]
pub struct InMemoryTaskLock {
    state: Arc<RwLock<InMemoryTaskState>>,
    task: Task,
    released: bool,
}

impl InMemoryTaskLock {
    fn release(&mut self, write: Option<&Task>) -> TaskRepositoryResult<()> {
        let mut state = self.state.write().map_err(poisoned)?;
        let id = self.task.id();
        if let Some(task) = write {
            if task.id() != id {
                return Err(TaskRepositoryError::NotFound(task.id()));
            }
            state.tasks.insert(id, task.clone());
        }
        state.locked.remove(&id);
        self.released = true;
        Ok(())
    }
}

#[async_trait]
impl TaskLock for InMemoryTaskLock {
    fn task(&self) -> &Task {
        &self.task
    }

    async fn commit(mut self, task: &Task) -> TaskRepositoryResult<()> {
        self.release(Some(task))
    }

    async fn rollback(mut self) -> TaskRepositoryResult<()> {
        self.release(None)
    }
}

impl Drop for InMemoryTaskLock {
    fn drop(&mut self) {
        if self.released {
            return;
        }
        if let Ok(mut state) = self.state.write() {
            state.locked.remove(&self.task.id());
        }
    }
}
