//! Diesel row models for task persistence and their domain conversions.

use super::schema::{task_roles, tasks};
use crate::task::domain::{
    ActorId, CaseId, CaseScope, ParseTaskStateError, ParseTaskValueError, Permission,
    PermissionSet, PersistedTaskData, RoleCategory, SecurityClassification, Task, TaskAction,
    TaskAttributes, TaskDomainError, TaskId, TaskRoleGrant, TaskState,
};
use chrono::{DateTime, Utc};
use diesel::prelude::*;
use thiserror::Error;

/// Failure to rebuild a domain value from stored columns.
#[derive(Debug, Error)]
pub enum RowDecodeError {
    /// An identifier or case component failed validation.
    #[error(transparent)]
    Domain(#[from] TaskDomainError),
    /// The stored state is not a known lifecycle state.
    #[error(transparent)]
    State(#[from] ParseTaskStateError),
    /// An enumerated column holds an unknown value.
    #[error(transparent)]
    Value(#[from] ParseTaskValueError),
    /// An integer column does not fit the domain type.
    #[error("column {column} holds out-of-range value {value}")]
    OutOfRange {
        /// Offending column.
        column: &'static str,
        /// Stored value.
        value: i64,
    },
}

/// Query result row for task records.
#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = tasks)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct TaskRow {
    pub id: uuid::Uuid,
    pub jurisdiction: String,
    pub case_type: String,
    pub case_id: String,
    pub task_type: String,
    pub state: String,
    pub assignee: Option<String>,
    pub security_classification: String,
    pub title: String,
    pub description: Option<String>,
    pub case_name: Option<String>,
    pub case_category: Option<String>,
    pub work_type: Option<String>,
    pub role_category: Option<String>,
    pub region: Option<String>,
    pub location: Option<String>,
    pub location_name: Option<String>,
    pub major_priority: i32,
    pub minor_priority: i32,
    pub priority_date: Option<DateTime<Utc>>,
    pub next_hearing_id: Option<String>,
    pub next_hearing_date: Option<DateTime<Utc>>,
    pub due_date: Option<DateTime<Utc>>,
    pub reconfigure_request_time: Option<DateTime<Utc>>,
    pub last_reconfiguration_time: Option<DateTime<Utc>>,
    pub last_updated_user: Option<String>,
    pub last_updated_action: Option<String>,
    pub termination_reason: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Insert and update model for task records.
///
/// `None` fields are written as `NULL` so that cleared attributes and audit
/// columns persist on update.
#[derive(Debug, Clone, PartialEq, Eq, Insertable, AsChangeset)]
#[diesel(table_name = tasks)]
#[diesel(treat_none_as_null = true)]
pub struct TaskRecord {
    pub id: uuid::Uuid,
    pub jurisdiction: String,
    pub case_type: String,
    pub case_id: String,
    pub task_type: String,
    pub state: String,
    pub assignee: Option<String>,
    pub security_classification: String,
    pub title: String,
    pub description: Option<String>,
    pub case_name: Option<String>,
    pub case_category: Option<String>,
    pub work_type: Option<String>,
    pub role_category: Option<String>,
    pub region: Option<String>,
    pub location: Option<String>,
    pub location_name: Option<String>,
    pub major_priority: i32,
    pub minor_priority: i32,
    pub priority_date: Option<DateTime<Utc>>,
    pub next_hearing_id: Option<String>,
    pub next_hearing_date: Option<DateTime<Utc>>,
    pub due_date: Option<DateTime<Utc>>,
    pub reconfigure_request_time: Option<DateTime<Utc>>,
    pub last_reconfiguration_time: Option<DateTime<Utc>>,
    pub last_updated_user: Option<String>,
    pub last_updated_action: Option<String>,
    pub termination_reason: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Row model for a task's role grant, used for reads and inserts.
#[derive(Debug, Clone, PartialEq, Eq, Queryable, Selectable, Insertable)]
#[diesel(table_name = task_roles)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct TaskRoleRow {
    pub task_id: uuid::Uuid,
    pub position: i32,
    pub role_name: String,
    pub role_category: Option<String>,
    pub permissions: Vec<String>,
    pub authorisations: Vec<String>,
    pub auto_assignable: bool,
    pub assignment_priority: Option<i32>,
    pub case_access_category: Option<String>,
}

impl TaskRecord {
    /// Flattens a task into its table columns.
    #[must_use]
    pub fn from_task(task: &Task) -> Self {
        let attributes = task.attributes();
        Self {
            id: task.id().into_inner(),
            jurisdiction: task.case().jurisdiction().to_owned(),
            case_type: task.case().case_type().to_owned(),
            case_id: task.case().case_id().as_str().to_owned(),
            task_type: task.task_type().to_owned(),
            state: task.state().as_str().to_owned(),
            assignee: task.assignee().map(|actor| actor.as_str().to_owned()),
            security_classification: task.security_classification().as_str().to_owned(),
            title: attributes.title.clone(),
            description: attributes.description.clone(),
            case_name: attributes.case_name.clone(),
            case_category: attributes.case_category.clone(),
            work_type: attributes.work_type.clone(),
            role_category: attributes.role_category.map(|category| category.as_str().to_owned()),
            region: attributes.region.clone(),
            location: attributes.location.clone(),
            location_name: attributes.location_name.clone(),
            major_priority: attributes.major_priority,
            minor_priority: attributes.minor_priority,
            priority_date: attributes.priority_date,
            next_hearing_id: attributes.next_hearing_id.clone(),
            next_hearing_date: attributes.next_hearing_date,
            due_date: attributes.due_date,
            reconfigure_request_time: task.reconfigure_request_time(),
            last_reconfiguration_time: task.last_reconfiguration_time(),
            last_updated_user: task.last_updated_user().map(|actor| actor.as_str().to_owned()),
            last_updated_action: task.last_updated_action().map(|action| action.as_str().to_owned()),
            termination_reason: task.termination_reason().map(str::to_owned),
            created_at: task.created_at(),
            updated_at: task.updated_at(),
        }
    }
}

impl TaskRoleRow {
    /// Builds the rows for every grant of `task`, preserving order.
    ///
    /// # Errors
    ///
    /// Returns [`RowDecodeError::OutOfRange`] when a position or priority
    /// does not fit a 32-bit column.
    pub fn for_task(task: &Task) -> Result<Vec<Self>, RowDecodeError> {
        let task_id = task.id().into_inner();
        task.roles()
            .iter()
            .enumerate()
            .map(|(index, grant)| {
                let position = i32::try_from(index).map_err(|_| RowDecodeError::OutOfRange {
                    column: "position",
                    value: i64::try_from(index).unwrap_or(i64::MAX),
                })?;
                let assignment_priority = grant
                    .assignment_priority()
                    .map(|priority| {
                        i32::try_from(priority).map_err(|_| RowDecodeError::OutOfRange {
                            column: "assignment_priority",
                            value: i64::from(priority),
                        })
                    })
                    .transpose()?;
                Ok(Self {
                    task_id,
                    position,
                    role_name: grant.role_name().to_owned(),
                    role_category: grant.role_category().map(|category| category.as_str().to_owned()),
                    permissions: grant
                        .permissions()
                        .iter()
                        .map(|permission| permission.as_str().to_owned())
                        .collect(),
                    authorisations: grant.authorisations().iter().cloned().collect(),
                    auto_assignable: grant.is_auto_assignable(),
                    assignment_priority,
                    case_access_category: grant.case_access_category().map(str::to_owned),
                })
            })
            .collect()
    }

    fn into_grant(self) -> Result<TaskRoleGrant, RowDecodeError> {
        let permissions = self
            .permissions
            .iter()
            .map(|name| Permission::try_from(name.as_str()))
            .collect::<Result<PermissionSet, _>>()?;
        let mut grant = TaskRoleGrant::new(self.role_name, permissions)
            .with_authorisations(self.authorisations)
            .auto_assignable(self.auto_assignable);
        if let Some(category) = self.role_category {
            grant = grant.with_role_category(RoleCategory::try_from(category.as_str())?);
        }
        if let Some(stored) = self.assignment_priority {
            let priority = u32::try_from(stored).map_err(|_| RowDecodeError::OutOfRange {
                column: "assignment_priority",
                value: i64::from(stored),
            })?;
            grant = grant.with_assignment_priority(priority);
        }
        if let Some(category) = self.case_access_category {
            grant = grant.with_case_access_category(category);
        }
        Ok(grant)
    }
}

impl TaskRow {
    /// Rebuilds the task aggregate from its row and ordered role rows.
    ///
    /// # Errors
    ///
    /// Returns [`RowDecodeError`] when any stored value fails domain
    /// validation.
    pub fn into_task(self, roles: Vec<TaskRoleRow>) -> Result<Task, RowDecodeError> {
        let case = CaseScope::new(self.jurisdiction, self.case_type, CaseId::new(self.case_id)?)?;
        let role_category = self
            .role_category
            .as_deref()
            .map(RoleCategory::try_from)
            .transpose()?;
        let attributes = TaskAttributes {
            title: self.title,
            description: self.description,
            case_name: self.case_name,
            case_category: self.case_category,
            work_type: self.work_type,
            role_category,
            region: self.region,
            location: self.location,
            location_name: self.location_name,
            major_priority: self.major_priority,
            minor_priority: self.minor_priority,
            priority_date: self.priority_date,
            next_hearing_id: self.next_hearing_id,
            next_hearing_date: self.next_hearing_date,
            due_date: self.due_date,
        };
        let roles = roles
            .into_iter()
            .map(TaskRoleRow::into_grant)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Task::from_persisted(PersistedTaskData {
            id: TaskId::from_uuid(self.id),
            case,
            task_type: self.task_type,
            state: TaskState::try_from(self.state.as_str())?,
            assignee: self.assignee.map(ActorId::new).transpose()?,
            security_classification: SecurityClassification::try_from(
                self.security_classification.as_str(),
            )?,
            attributes,
            roles,
            reconfigure_request_time: self.reconfigure_request_time,
            last_reconfiguration_time: self.last_reconfiguration_time,
            last_updated_user: self.last_updated_user.map(ActorId::new).transpose()?,
            last_updated_action: self
                .last_updated_action
                .as_deref()
                .map(TaskAction::try_from)
                .transpose()?,
            termination_reason: self.termination_reason,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }))
    }
}

impl From<TaskRecord> for TaskRow {
    fn from(record: TaskRecord) -> Self {
        Self {
            id: record.id,
            jurisdiction: record.jurisdiction,
            case_type: record.case_type,
            case_id: record.case_id,
            task_type: record.task_type,
            state: record.state,
            assignee: record.assignee,
            security_classification: record.security_classification,
            title: record.title,
            description: record.description,
            case_name: record.case_name,
            case_category: record.case_category,
            work_type: record.work_type,
            role_category: record.role_category,
            region: record.region,
            location: record.location,
            location_name: record.location_name,
            major_priority: record.major_priority,
            minor_priority: record.minor_priority,
            priority_date: record.priority_date,
            next_hearing_id: record.next_hearing_id,
            next_hearing_date: record.next_hearing_date,
            due_date: record.due_date,
            reconfigure_request_time: record.reconfigure_request_time,
            last_reconfiguration_time: record.last_reconfiguration_time,
            last_updated_user: record.last_updated_user,
            last_updated_action: record.last_updated_action,
            termination_reason: record.termination_reason,
            created_at: record.created_at,
            updated_at: record.updated_at,
        }
    }
}
