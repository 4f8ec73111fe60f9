//! Task aggregate root and related task lifecycle types.

use super::{
    ActorId, CaseScope, ParseTaskStateError, ParseTaskValueError, SecurityClassification,
    TaskAttributes, TaskDomainError, TaskId, TaskRoleGrant,
};
use chrono::{DateTime, Utc};
use mockable::Clock;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Task lifecycle state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TaskState {
    /// Task has been created but attributes and roles are not derived yet.
    Unconfigured,
    /// Task is configured and waiting for an assignee.
    Unassigned,
    /// Task is assigned to an actor.
    Assigned,
    /// Task work has been completed.
    Completed,
    /// Task has been cancelled.
    Cancelled,
    /// Task has been removed from the workflow.
    Terminated,
}

impl TaskState {
    /// States in which a task may be marked for and undergo reconfiguration.
    pub const RECONFIGURABLE: [Self; 2] = [Self::Assigned, Self::Unassigned];

    /// States in which user work on the task is still possible.
    pub const OPEN: [Self; 2] = Self::RECONFIGURABLE;

    /// Returns the canonical storage representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Unconfigured => "UNCONFIGURED",
            Self::Unassigned => "UNASSIGNED",
            Self::Assigned => "ASSIGNED",
            Self::Completed => "COMPLETED",
            Self::Cancelled => "CANCELLED",
            Self::Terminated => "TERMINATED",
        }
    }

    /// Returns whether the state is final for user work.
    #[must_use]
    pub const fn is_closed(self) -> bool {
        matches!(self, Self::Completed | Self::Cancelled | Self::Terminated)
    }

    /// Returns whether the task may be marked for or undergo reconfiguration.
    #[must_use]
    pub const fn is_reconfigurable(self) -> bool {
        matches!(self, Self::Assigned | Self::Unassigned)
    }

    /// Returns whether the state machine permits moving to `target`.
    #[must_use]
    pub const fn can_transition_to(self, target: Self) -> bool {
        match self {
            Self::Unconfigured => matches!(
                target,
                Self::Unassigned | Self::Assigned | Self::Cancelled | Self::Terminated
            ),
            Self::Unassigned => matches!(
                target,
                Self::Assigned | Self::Completed | Self::Cancelled | Self::Terminated
            ),
            Self::Assigned => matches!(
                target,
                Self::Unassigned | Self::Completed | Self::Cancelled | Self::Terminated
            ),
            Self::Completed | Self::Cancelled => matches!(target, Self::Terminated),
            Self::Terminated => false,
        }
    }
}

impl TryFrom<&str> for TaskState {
    type Error = ParseTaskStateError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        let normalized = value.trim().to_ascii_uppercase();
        match normalized.as_str() {
            "UNCONFIGURED" => Ok(Self::Unconfigured),
            "UNASSIGNED" => Ok(Self::Unassigned),
            "ASSIGNED" => Ok(Self::Assigned),
            "COMPLETED" => Ok(Self::Completed),
            "CANCELLED" => Ok(Self::Cancelled),
            "TERMINATED" => Ok(Self::Terminated),
            _ => Err(ParseTaskStateError(value.to_owned())),
        }
    }
}

impl fmt::Display for TaskState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Audit tag describing the last mutation applied to a task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TaskAction {
    /// Attributes derived without an assignment change.
    Configure,
    /// Unassigned task automatically assigned.
    AutoAssign,
    /// Assigned task automatically unassigned.
    AutoUnassign,
    /// Assigned task automatically moved to a different actor.
    AutoUnassignAssign,
    /// Task flagged for reconfiguration.
    MarkForReconfigure,
    /// Task claimed by an actor.
    Claim,
    /// Task released by its assignee.
    Unclaim,
    /// Task assigned by a manager.
    Assign,
    /// Task unassigned by a manager.
    Unassign,
    /// Task completed.
    Complete,
    /// Task cancelled.
    Cancel,
    /// Task terminated by the workflow engine.
    Terminate,
}

impl TaskAction {
    const ALL: [Self; 12] = [
        Self::Configure,
        Self::AutoAssign,
        Self::AutoUnassign,
        Self::AutoUnassignAssign,
        Self::MarkForReconfigure,
        Self::Claim,
        Self::Unclaim,
        Self::Assign,
        Self::Unassign,
        Self::Complete,
        Self::Cancel,
        Self::Terminate,
    ];

    /// Returns the canonical storage representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Configure => "CONFIGURE",
            Self::AutoAssign => "AUTO_ASSIGN",
            Self::AutoUnassign => "AUTO_UNASSIGN",
            Self::AutoUnassignAssign => "AUTO_UNASSIGN_ASSIGN",
            Self::MarkForReconfigure => "MARK_FOR_RECONFIGURE",
            Self::Claim => "CLAIM",
            Self::Unclaim => "UNCLAIM",
            Self::Assign => "ASSIGN",
            Self::Unassign => "UNASSIGN",
            Self::Complete => "COMPLETE",
            Self::Cancel => "CANCEL",
            Self::Terminate => "TERMINATE",
        }
    }
}

impl TryFrom<&str> for TaskAction {
    type Error = ParseTaskValueError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        let normalized = value.trim().to_ascii_uppercase();
        Self::ALL
            .into_iter()
            .find(|action| action.as_str() == normalized)
            .ok_or_else(|| ParseTaskValueError::new("task action", value))
    }
}

impl fmt::Display for TaskAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Parameter object for creating an unconfigured task.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewTask {
    /// Case the task belongs to.
    pub case: CaseScope,
    /// Task type identifier from the workflow definition.
    pub task_type: String,
    /// Initial title, usually the task type's display name.
    pub title: String,
    /// Security classification of the case.
    pub security_classification: SecurityClassification,
}

/// Task aggregate root.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    id: TaskId,
    case: CaseScope,
    task_type: String,
    state: TaskState,
    assignee: Option<ActorId>,
    security_classification: SecurityClassification,
    attributes: TaskAttributes,
    roles: Vec<TaskRoleGrant>,
    reconfigure_request_time: Option<DateTime<Utc>>,
    last_reconfiguration_time: Option<DateTime<Utc>>,
    last_updated_user: Option<ActorId>,
    last_updated_action: Option<TaskAction>,
    termination_reason: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

/// Parameter object for reconstructing a persisted task aggregate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PersistedTaskData {
    /// Persisted task identifier.
    pub id: TaskId,
    /// Persisted case classification.
    pub case: CaseScope,
    /// Persisted task type.
    pub task_type: String,
    /// Persisted lifecycle state.
    pub state: TaskState,
    /// Persisted assignee, if any.
    pub assignee: Option<ActorId>,
    /// Persisted security classification.
    pub security_classification: SecurityClassification,
    /// Persisted business attributes.
    pub attributes: TaskAttributes,
    /// Persisted role grants in stored order.
    pub roles: Vec<TaskRoleGrant>,
    /// Persisted reconfiguration request timestamp.
    pub reconfigure_request_time: Option<DateTime<Utc>>,
    /// Persisted last successful reconfiguration timestamp.
    pub last_reconfiguration_time: Option<DateTime<Utc>>,
    /// Persisted audit user.
    pub last_updated_user: Option<ActorId>,
    /// Persisted audit action.
    pub last_updated_action: Option<TaskAction>,
    /// Persisted termination reason.
    pub termination_reason: Option<String>,
    /// Persisted creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Persisted latest mutation timestamp.
    pub updated_at: DateTime<Utc>,
}

impl Task {
    /// Creates a new unconfigured task.
    ///
    /// # Errors
    ///
    /// Returns [`TaskDomainError::EmptyTaskType`] when the task type is blank.
    pub fn new(data: NewTask, clock: &impl Clock) -> Result<Self, TaskDomainError> {
        let task_type = data.task_type.trim();
        if task_type.is_empty() {
            return Err(TaskDomainError::EmptyTaskType);
        }
        let timestamp = clock.utc();
        Ok(Self {
            id: TaskId::new(),
            case: data.case,
            task_type: task_type.to_owned(),
            state: TaskState::Unconfigured,
            assignee: None,
            security_classification: data.security_classification,
            attributes: TaskAttributes::titled(data.title),
            roles: Vec::new(),
            reconfigure_request_time: None,
            last_reconfiguration_time: None,
            last_updated_user: None,
            last_updated_action: None,
            termination_reason: None,
            created_at: timestamp,
            updated_at: timestamp,
        })
    }

    /// Reconstructs a task from persisted storage.
    #[must_use]
    pub fn from_persisted(data: PersistedTaskData) -> Self {
        Self {
            id: data.id,
            case: data.case,
            task_type: data.task_type,
            state: data.state,
            assignee: data.assignee,
            security_classification: data.security_classification,
            attributes: data.attributes,
            roles: data.roles,
            reconfigure_request_time: data.reconfigure_request_time,
            last_reconfiguration_time: data.last_reconfiguration_time,
            last_updated_user: data.last_updated_user,
            last_updated_action: data.last_updated_action,
            termination_reason: data.termination_reason,
            created_at: data.created_at,
            updated_at: data.updated_at,
        }
    }

    /// Returns the task identifier.
    #[must_use]
    pub const fn id(&self) -> TaskId {
        self.id
    }

    /// Returns the case the task belongs to.
    #[must_use]
    pub const fn case(&self) -> &CaseScope {
        &self.case
    }

    /// Returns the task type identifier.
    #[must_use]
    pub fn task_type(&self) -> &str {
        &self.task_type
    }

    /// Returns the task lifecycle state.
    #[must_use]
    pub const fn state(&self) -> TaskState {
        self.state
    }

    /// Returns the current assignee, if any.
    #[must_use]
    pub const fn assignee(&self) -> Option<&ActorId> {
        self.assignee.as_ref()
    }

    /// Returns the case security classification.
    #[must_use]
    pub const fn security_classification(&self) -> SecurityClassification {
        self.security_classification
    }

    /// Returns the business attributes.
    #[must_use]
    pub const fn attributes(&self) -> &TaskAttributes {
        &self.attributes
    }

    /// Returns mutable business attributes for (re)configuration.
    pub const fn attributes_mut(&mut self) -> &mut TaskAttributes {
        &mut self.attributes
    }

    /// Returns the role grants in configured order.
    #[must_use]
    pub fn roles(&self) -> &[TaskRoleGrant] {
        &self.roles
    }

    /// Returns when the task was marked for reconfiguration, if dirty.
    #[must_use]
    pub const fn reconfigure_request_time(&self) -> Option<DateTime<Utc>> {
        self.reconfigure_request_time
    }

    /// Returns when the task was last reconfigured successfully.
    #[must_use]
    pub const fn last_reconfiguration_time(&self) -> Option<DateTime<Utc>> {
        self.last_reconfiguration_time
    }

    /// Returns the actor recorded by the last mutation.
    #[must_use]
    pub const fn last_updated_user(&self) -> Option<&ActorId> {
        self.last_updated_user.as_ref()
    }

    /// Returns the audit tag recorded by the last mutation.
    #[must_use]
    pub const fn last_updated_action(&self) -> Option<TaskAction> {
        self.last_updated_action
    }

    /// Returns the termination reason, if terminated.
    #[must_use]
    pub fn termination_reason(&self) -> Option<&str> {
        self.termination_reason.as_deref()
    }

    /// Returns the creation timestamp.
    #[must_use]
    pub const fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Returns the latest mutation timestamp.
    #[must_use]
    pub const fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    /// Returns whether the task is waiting for reconfiguration.
    #[must_use]
    pub const fn is_dirty(&self) -> bool {
        self.reconfigure_request_time.is_some()
    }

    /// Replaces the role grants wholesale.
    pub fn replace_roles(&mut self, roles: Vec<TaskRoleGrant>) {
        self.roles = roles;
    }

    /// Moves the task to `target`, enforcing the state machine.
    ///
    /// # Errors
    ///
    /// Returns [`TaskDomainError::InvalidStateTransition`] when the
    /// transition is not permitted. The task is left untouched on error.
    pub fn transition_to(
        &mut self,
        target: TaskState,
        clock: &impl Clock,
    ) -> Result<(), TaskDomainError> {
        self.ensure_transition(target)?;
        self.state = target;
        self.touch(clock);
        Ok(())
    }

    /// Flags the task for reconfiguration and clears the previous
    /// reconfiguration time.
    ///
    /// Returns `false` without touching the task when it is already marked,
    /// so the original request time survives repeated marks.
    ///
    /// # Errors
    ///
    /// Returns [`TaskDomainError::InvalidStateTransition`] when the task is
    /// not in a reconfigurable state.
    pub fn mark_for_reconfiguration(
        &mut self,
        system_actor: &ActorId,
        clock: &impl Clock,
    ) -> Result<bool, TaskDomainError> {
        if !self.state.is_reconfigurable() {
            return Err(TaskDomainError::InvalidStateTransition {
                task_id: self.id,
                from: self.state,
                to: self.state,
            });
        }
        if self.reconfigure_request_time.is_some() {
            return Ok(false);
        }
        self.reconfigure_request_time = Some(clock.utc());
        self.last_reconfiguration_time = None;
        self.stamp(system_actor, TaskAction::MarkForReconfigure, clock);
        Ok(true)
    }

    /// Applies an assignment outcome computed by auto-assignment.
    ///
    /// `Some(actor)` leaves the task assigned to that actor, `None` leaves it
    /// unassigned.
    ///
    /// # Errors
    ///
    /// Returns [`TaskDomainError::InvalidStateTransition`] when the task is
    /// closed.
    pub fn settle_assignment(
        &mut self,
        assignee: Option<ActorId>,
        clock: &impl Clock,
    ) -> Result<(), TaskDomainError> {
        let target = if assignee.is_some() {
            TaskState::Assigned
        } else {
            TaskState::Unassigned
        };
        if target != self.state {
            self.ensure_transition(target)?;
        } else if self.state.is_closed() {
            return Err(TaskDomainError::InvalidStateTransition {
                task_id: self.id,
                from: self.state,
                to: target,
            });
        }
        self.state = target;
        self.assignee = assignee;
        self.touch(clock);
        Ok(())
    }

    /// Records a completed (re)configuration.
    ///
    /// Clears the reconfiguration request, sets the last reconfiguration time
    /// when the task was dirty and stamps the audit fields.
    pub fn finish_configuration(&mut self, actor: &ActorId, action: TaskAction, clock: &impl Clock) {
        if self.reconfigure_request_time.take().is_some() {
            self.last_reconfiguration_time = Some(clock.utc());
        }
        self.stamp(actor, action, clock);
    }

    /// Validates the attributes every configured task must carry.
    ///
    /// # Errors
    ///
    /// Returns [`TaskDomainError::MissingTitle`] or
    /// [`TaskDomainError::MissingDueDate`].
    pub fn validate_configured(&self) -> Result<(), TaskDomainError> {
        if self.attributes.title.trim().is_empty() {
            return Err(TaskDomainError::MissingTitle(self.id));
        }
        if self.attributes.due_date.is_none() {
            return Err(TaskDomainError::MissingDueDate(self.id));
        }
        Ok(())
    }

    /// Claims an unassigned task for `actor`.
    ///
    /// # Errors
    ///
    /// Returns [`TaskDomainError::AlreadyAssigned`] when someone else holds
    /// the task, or [`TaskDomainError::InvalidStateTransition`] when closed.
    pub fn claim(&mut self, actor: &ActorId, clock: &impl Clock) -> Result<(), TaskDomainError> {
        if self.state == TaskState::Assigned {
            if self.assignee.as_ref() == Some(actor) {
                return Ok(());
            }
            return Err(TaskDomainError::AlreadyAssigned(self.id));
        }
        self.ensure_transition(TaskState::Assigned)?;
        self.state = TaskState::Assigned;
        self.assignee = Some(actor.clone());
        self.stamp(actor, TaskAction::Claim, clock);
        Ok(())
    }

    /// Releases the task held by `actor`.
    ///
    /// # Errors
    ///
    /// Returns [`TaskDomainError::InvalidStateTransition`] when the task is
    /// not assigned.
    pub fn unclaim(&mut self, actor: &ActorId, clock: &impl Clock) -> Result<(), TaskDomainError> {
        self.ensure_transition(TaskState::Unassigned)?;
        self.state = TaskState::Unassigned;
        self.assignee = None;
        self.stamp(actor, TaskAction::Unclaim, clock);
        Ok(())
    }

    /// Assigns the task to `assignee` on behalf of `assigner`.
    ///
    /// # Errors
    ///
    /// Returns [`TaskDomainError::InvalidStateTransition`] when the task is
    /// not open.
    pub fn assign(
        &mut self,
        assigner: &ActorId,
        assignee: ActorId,
        clock: &impl Clock,
    ) -> Result<(), TaskDomainError> {
        if self.state != TaskState::Assigned {
            self.ensure_transition(TaskState::Assigned)?;
        }
        self.state = TaskState::Assigned;
        self.assignee = Some(assignee);
        self.stamp(assigner, TaskAction::Assign, clock);
        Ok(())
    }

    /// Removes the current assignee on behalf of `actor`.
    ///
    /// # Errors
    ///
    /// Returns [`TaskDomainError::InvalidStateTransition`] when the task is
    /// not assigned.
    pub fn unassign(&mut self, actor: &ActorId, clock: &impl Clock) -> Result<(), TaskDomainError> {
        self.ensure_transition(TaskState::Unassigned)?;
        self.state = TaskState::Unassigned;
        self.assignee = None;
        self.stamp(actor, TaskAction::Unassign, clock);
        Ok(())
    }

    /// Completes the task.
    ///
    /// # Errors
    ///
    /// Returns [`TaskDomainError::InvalidStateTransition`] when the task is
    /// not open.
    pub fn complete(&mut self, actor: &ActorId, clock: &impl Clock) -> Result<(), TaskDomainError> {
        self.close(actor, TaskState::Completed, TaskAction::Complete, clock)
    }

    /// Cancels the task.
    ///
    /// # Errors
    ///
    /// Returns [`TaskDomainError::InvalidStateTransition`] when the task is
    /// not open or unconfigured.
    pub fn cancel(&mut self, actor: &ActorId, clock: &impl Clock) -> Result<(), TaskDomainError> {
        self.close(actor, TaskState::Cancelled, TaskAction::Cancel, clock)
    }

    /// Terminates the task with the reason reported by the workflow engine.
    ///
    /// # Errors
    ///
    /// Returns [`TaskDomainError::InvalidStateTransition`] when the task is
    /// already terminated.
    pub fn terminate(
        &mut self,
        actor: &ActorId,
        reason: impl Into<String>,
        clock: &impl Clock,
    ) -> Result<(), TaskDomainError> {
        self.close(actor, TaskState::Terminated, TaskAction::Terminate, clock)?;
        self.termination_reason = Some(reason.into());
        Ok(())
    }

    fn close(
        &mut self,
        actor: &ActorId,
        target: TaskState,
        action: TaskAction,
        clock: &impl Clock,
    ) -> Result<(), TaskDomainError> {
        self.ensure_transition(target)?;
        self.state = target;
        self.reconfigure_request_time = None;
        self.stamp(actor, action, clock);
        Ok(())
    }

    const fn ensure_transition(&self, target: TaskState) -> Result<(), TaskDomainError> {
        if self.state.can_transition_to(target) {
            Ok(())
        } else {
            Err(TaskDomainError::InvalidStateTransition {
                task_id: self.id,
                from: self.state,
                to: target,
            })
        }
    }

    fn stamp(&mut self, actor: &ActorId, action: TaskAction, clock: &impl Clock) {
        self.last_updated_user = Some(actor.clone());
        self.last_updated_action = Some(action);
        self.touch(clock);
    }

    /// Updates the `updated_at` timestamp to the current clock time.
    fn touch(&mut self, clock: &impl Clock) {
        self.updated_at = clock.utc();
    }
}
