//! Service layer for task initiation and user-driven lifecycle operations.

use super::configuration::{ConfigurationMode, TaskConfigurationError, TaskConfigurator};
use crate::access::{
    ports::{RoleAssignmentStore, RoleAssignmentStoreError},
    services::{AccessDecision, PermissionEvaluator},
};
use crate::task::{
    domain::{
        ActorId, CaseId, CaseScope, NewTask, Permission, SecurityClassification, Task,
        TaskDomainError, TaskId, TaskState,
    },
    ports::{LockOutcome, RuleEvaluator, TaskLock, TaskRepository, TaskRepositoryError, WorkingCalendar},
};
use mockable::Clock;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info};

const CANCELLABLE: [TaskState; 3] = [
    TaskState::Unconfigured,
    TaskState::Unassigned,
    TaskState::Assigned,
];

const TERMINABLE: [TaskState; 5] = [
    TaskState::Unconfigured,
    TaskState::Unassigned,
    TaskState::Assigned,
    TaskState::Completed,
    TaskState::Cancelled,
];

/// Request payload for initiating a task from a workflow event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InitiateTaskRequest {
    jurisdiction: String,
    case_type: String,
    case_id: String,
    task_type: String,
    title: String,
    security_classification: SecurityClassification,
}

impl InitiateTaskRequest {
    /// Creates a public-classification request.
    #[must_use]
    pub fn new(
        jurisdiction: impl Into<String>,
        case_type: impl Into<String>,
        case_id: impl Into<String>,
        task_type: impl Into<String>,
        title: impl Into<String>,
    ) -> Self {
        Self {
            jurisdiction: jurisdiction.into(),
            case_type: case_type.into(),
            case_id: case_id.into(),
            task_type: task_type.into(),
            title: title.into(),
            security_classification: SecurityClassification::Public,
        }
    }

    /// Sets the case security classification.
    #[must_use]
    pub const fn with_security_classification(
        mut self,
        classification: SecurityClassification,
    ) -> Self {
        self.security_classification = classification;
        self
    }
}

/// Service-level errors for task lifecycle operations.
#[derive(Debug, Error)]
pub enum TaskLifecycleError {
    /// Domain validation failed.
    #[error(transparent)]
    Domain(#[from] TaskDomainError),
    /// Repository operation failed.
    #[error(transparent)]
    Repository(#[from] TaskRepositoryError),
    /// Configuration from rules failed.
    #[error(transparent)]
    Configuration(#[from] TaskConfigurationError),
    /// Role assignments for the actor could not be loaded.
    #[error(transparent)]
    RoleAssignments(#[from] RoleAssignmentStoreError),
    /// The task does not exist.
    #[error("task not found: {0}")]
    NotFound(TaskId),
    /// The actor lacks the permissions for the operation.
    #[error("actor {actor} may not perform this operation on task {task_id}")]
    Forbidden {
        /// Task the operation targeted.
        task_id: TaskId,
        /// Actor that was refused.
        actor: ActorId,
    },
    /// The task's state does not allow the operation.
    #[error("task {task_id} is {state}")]
    Ineligible {
        /// Task the operation targeted.
        task_id: TaskId,
        /// State found under the lock.
        state: TaskState,
    },
}

/// Result type for task lifecycle service operations.
pub type TaskLifecycleResult<T> = Result<T, TaskLifecycleError>;

/// Task lifecycle orchestration service.
pub struct TaskLifecycleService<R, E, S, W, C>
where
    R: TaskRepository,
    E: RuleEvaluator,
    S: RoleAssignmentStore,
    W: WorkingCalendar,
    C: Clock + Send + Sync,
{
    repository: Arc<R>,
    configurator: TaskConfigurator<E, S, W>,
    evaluator: PermissionEvaluator,
    clock: Arc<C>,
    system_actor: ActorId,
}

impl<R, E, S, W, C> TaskLifecycleService<R, E, S, W, C>
where
    R: TaskRepository,
    E: RuleEvaluator,
    S: RoleAssignmentStore,
    W: WorkingCalendar,
    C: Clock + Send + Sync,
{
    /// Creates a new task lifecycle service.
    ///
    /// `system_actor` is recorded on mutations the platform performs itself,
    /// such as initiation and termination.
    #[must_use]
    pub const fn new(
        repository: Arc<R>,
        configurator: TaskConfigurator<E, S, W>,
        clock: Arc<C>,
        system_actor: ActorId,
    ) -> Self {
        Self {
            repository,
            configurator,
            evaluator: PermissionEvaluator::new(),
            clock,
            system_actor,
        }
    }

    /// Creates, configures, auto-assigns and stores a task.
    ///
    /// Every configuration value applies, regardless of its reconfiguration
    /// flag.
    ///
    /// # Errors
    ///
    /// Returns [`TaskLifecycleError`] when the request is invalid,
    /// configuration fails or the repository rejects the task.
    pub async fn initiate(&self, request: InitiateTaskRequest) -> TaskLifecycleResult<Task> {
        let case = CaseScope::from_parts(&request.jurisdiction, &request.case_type, &request.case_id)?;
        let mut task = Task::new(
            NewTask {
                case,
                task_type: request.task_type,
                title: request.title,
                security_classification: request.security_classification,
            },
            &*self.clock,
        )?;
        let action = self
            .configurator
            .configure(
                &mut task,
                ConfigurationMode::Initiation,
                &self.system_actor,
                &*self.clock,
            )
            .await?;
        self.repository.store(&task).await?;
        info!(task_id = %task.id(), case = %task.case(), action = %action, state = %task.state(), "task initiated");
        Ok(task)
    }

    /// Returns the task when the actor may read it.
    ///
    /// # Errors
    ///
    /// Returns [`TaskLifecycleError::NotFound`] or
    /// [`TaskLifecycleError::Forbidden`].
    pub async fn get_task(&self, task_id: TaskId, actor: &ActorId) -> TaskLifecycleResult<Task> {
        let task = self
            .repository
            .find_by_id(task_id)
            .await?
            .ok_or(TaskLifecycleError::NotFound(task_id))?;
        let decision = self.decision_for(&task, actor).await?;
        require(&task, actor, decision.permits_any(&[Permission::Read]))?;
        Ok(task)
    }

    /// Returns every task of a case.
    ///
    /// # Errors
    ///
    /// Returns [`TaskLifecycleError::Repository`] when the lookup fails.
    pub async fn tasks_for_case(&self, case_id: &CaseId) -> TaskLifecycleResult<Vec<Task>> {
        Ok(self.repository.find_by_case_id(case_id).await?)
    }

    /// Claims an unassigned task for the calling actor.
    ///
    /// # Errors
    ///
    /// Returns [`TaskLifecycleError::Forbidden`] unless the actor holds Own,
    /// Execute or Claim, and other [`TaskLifecycleError`] variants on
    /// state or persistence failures.
    pub async fn claim(&self, task_id: TaskId, actor: &ActorId) -> TaskLifecycleResult<Task> {
        let lock = self.acquire(task_id, &TaskState::OPEN).await?;
        let mut task = lock.task().clone();
        let outcome = async {
            let decision = self.decision_for(&task, actor).await?;
            require(
                &task,
                actor,
                decision.permits_any(&[Permission::Own, Permission::Execute, Permission::Claim]),
            )?;
            task.claim(actor, &*self.clock)?;
            Ok::<(), TaskLifecycleError>(())
        }
        .await;
        settle(lock, task, outcome).await
    }

    /// Releases a task held by the calling actor.
    ///
    /// # Errors
    ///
    /// Returns [`TaskLifecycleError::Forbidden`] when the actor is neither
    /// the assignee nor holds Unclaim.
    pub async fn unclaim(&self, task_id: TaskId, actor: &ActorId) -> TaskLifecycleResult<Task> {
        let lock = self.acquire(task_id, &[TaskState::Assigned]).await?;
        let mut task = lock.task().clone();
        let outcome = async {
            let decision = self.decision_for(&task, actor).await?;
            let holds = task.assignee() == Some(actor);
            require(
                &task,
                actor,
                holds || decision.permits_any(&[Permission::Unclaim]),
            )?;
            task.unclaim(actor, &*self.clock)?;
            Ok::<(), TaskLifecycleError>(())
        }
        .await;
        settle(lock, task, outcome).await
    }

    /// Assigns a task to `assignee` on behalf of `assigner`.
    ///
    /// # Errors
    ///
    /// Returns [`TaskLifecycleError::Forbidden`] when the assigner lacks
    /// Manage or Assign, or the assignee lacks Own or Execute.
    pub async fn assign(
        &self,
        task_id: TaskId,
        assigner: &ActorId,
        assignee: &ActorId,
    ) -> TaskLifecycleResult<Task> {
        let lock = self.acquire(task_id, &TaskState::OPEN).await?;
        let mut task = lock.task().clone();
        let outcome = async {
            let assigner_decision = self.decision_for(&task, assigner).await?;
            require(
                &task,
                assigner,
                assigner_decision.permits_any(&[Permission::Manage, Permission::Assign]),
            )?;
            let assignee_decision = self.decision_for(&task, assignee).await?;
            require(
                &task,
                assignee,
                assignee_decision.permits_any(&[Permission::Own, Permission::Execute]),
            )?;
            task.assign(assigner, assignee.clone(), &*self.clock)?;
            Ok::<(), TaskLifecycleError>(())
        }
        .await;
        settle(lock, task, outcome).await
    }

    /// Removes the assignee of a task.
    ///
    /// # Errors
    ///
    /// Returns [`TaskLifecycleError::Forbidden`] when the actor is not the
    /// assignee and holds neither Manage nor Unassign.
    pub async fn unassign(&self, task_id: TaskId, actor: &ActorId) -> TaskLifecycleResult<Task> {
        let lock = self.acquire(task_id, &[TaskState::Assigned]).await?;
        let mut task = lock.task().clone();
        let outcome = async {
            let decision = self.decision_for(&task, actor).await?;
            let holds = task.assignee() == Some(actor);
            require(
                &task,
                actor,
                holds || decision.permits_any(&[Permission::Manage, Permission::Unassign]),
            )?;
            task.unassign(actor, &*self.clock)?;
            Ok::<(), TaskLifecycleError>(())
        }
        .await;
        settle(lock, task, outcome).await
    }

    /// Completes a task.
    ///
    /// # Errors
    ///
    /// Returns [`TaskLifecycleError::Forbidden`] unless the actor holds
    /// Complete, or is the assignee holding CompleteOwn, Own or Execute.
    pub async fn complete(&self, task_id: TaskId, actor: &ActorId) -> TaskLifecycleResult<Task> {
        let lock = self.acquire(task_id, &TaskState::OPEN).await?;
        let mut task = lock.task().clone();
        let outcome = async {
            let decision = self.decision_for(&task, actor).await?;
            let holds = task.assignee() == Some(actor);
            let own_work = holds
                && decision.permits_any(&[
                    Permission::CompleteOwn,
                    Permission::Own,
                    Permission::Execute,
                ]);
            require(
                &task,
                actor,
                own_work || decision.permits_any(&[Permission::Complete]),
            )?;
            task.complete(actor, &*self.clock)?;
            Ok::<(), TaskLifecycleError>(())
        }
        .await;
        settle(lock, task, outcome).await
    }

    /// Cancels a task.
    ///
    /// # Errors
    ///
    /// Returns [`TaskLifecycleError::Forbidden`] unless the actor holds
    /// Cancel, or is the assignee holding CancelOwn.
    pub async fn cancel(&self, task_id: TaskId, actor: &ActorId) -> TaskLifecycleResult<Task> {
        let lock = self.acquire(task_id, &CANCELLABLE).await?;
        let mut task = lock.task().clone();
        let outcome = async {
            let decision = self.decision_for(&task, actor).await?;
            let holds = task.assignee() == Some(actor);
            let own_work = holds && decision.permits_any(&[Permission::CancelOwn]);
            require(
                &task,
                actor,
                own_work || decision.permits_any(&[Permission::Cancel]),
            )?;
            task.cancel(actor, &*self.clock)?;
            Ok::<(), TaskLifecycleError>(())
        }
        .await;
        settle(lock, task, outcome).await
    }

    /// Terminates a task on behalf of the workflow engine.
    ///
    /// # Errors
    ///
    /// Returns [`TaskLifecycleError::Ineligible`] when the task is already
    /// terminated.
    pub async fn terminate(
        &self,
        task_id: TaskId,
        reason: impl Into<String> + Send,
    ) -> TaskLifecycleResult<Task> {
        let lock = self.acquire(task_id, &TERMINABLE).await?;
        let mut task = lock.task().clone();
        let outcome = task
            .terminate(&self.system_actor, reason, &*self.clock)
            .map_err(TaskLifecycleError::from);
        let terminated = settle(lock, task, outcome).await?;
        info!(task_id = %task_id, reason = terminated.termination_reason().unwrap_or_default(), "task terminated");
        Ok(terminated)
    }

    async fn acquire(&self, task_id: TaskId, eligible: &[TaskState]) -> TaskLifecycleResult<R::Lock> {
        match self.repository.lock(task_id, eligible).await? {
            LockOutcome::Acquired(lock) => Ok(lock),
            LockOutcome::Ineligible(state) => Err(TaskLifecycleError::Ineligible { task_id, state }),
            LockOutcome::NotFound => Err(TaskLifecycleError::NotFound(task_id)),
        }
    }

    async fn decision_for(&self, task: &Task, actor: &ActorId) -> TaskLifecycleResult<AccessDecision> {
        let assignments = self
            .configurator
            .role_assignments()
            .find_by_actor(actor)
            .await?;
        Ok(self
            .evaluator
            .evaluate(task, &assignments, actor, self.clock.utc()))
    }
}

async fn settle<L: TaskLock>(
    lock: L,
    task: Task,
    outcome: TaskLifecycleResult<()>,
) -> TaskLifecycleResult<Task> {
    match outcome {
        Ok(()) => {
            lock.commit(&task).await?;
            debug!(task_id = %task.id(), action = ?task.last_updated_action(), state = %task.state(), "task updated");
            Ok(task)
        }
        Err(err) => {
            lock.rollback().await?;
            Err(err)
        }
    }
}

fn require(task: &Task, actor: &ActorId, allowed: bool) -> TaskLifecycleResult<()> {
    if allowed {
        Ok(())
    } else {
        Err(TaskLifecycleError::Forbidden {
            task_id: task.id(),
            actor: actor.clone(),
        })
    }
}
