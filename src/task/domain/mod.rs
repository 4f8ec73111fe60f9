//! Domain model for case task management.
//!
//! The task domain models the task aggregate, its workflow state machine,
//! the per-role permission grants it owns and the attribute catalogue used
//! when decision tables (re)configure it. Infrastructure concerns stay
//! outside of this boundary.

mod attributes;
mod classification;
mod configuration;
mod error;
mod ids;
mod permission;
mod role_grant;
mod task;

pub use attributes::{
    AttributeName, DEFAULT_MAJOR_PRIORITY, DEFAULT_MINOR_PRIORITY, DateField, DateInput,
    PlainAttribute, TaskAttributes,
};
pub use classification::{RoleCategory, SecurityClassification};
pub use configuration::{ConfigurationValue, PermissionRule, RuleContext};
pub use error::{ParseTaskStateError, ParseTaskValueError, TaskDomainError};
pub use ids::{ActorId, CaseId, CaseScope, TaskId};
pub use permission::{Permission, PermissionSet};
pub use role_grant::TaskRoleGrant;
pub use task::{NewTask, PersistedTaskData, Task, TaskAction, TaskState};
