//! Decision-table outputs consumed when configuring a task.

use super::{CaseScope, PermissionSet, RoleCategory, Task, TaskRoleGrant};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Context sent to the rule evaluator for one task.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RuleContext {
    /// Case the task belongs to.
    pub case: CaseScope,
    /// Task type identifier.
    pub task_type: String,
    /// Whether the evaluation is part of a reconfiguration run.
    pub is_reconfigure_request: bool,
}

impl RuleContext {
    /// Builds the context for initial configuration of `task`.
    #[must_use]
    pub fn for_initiation(task: &Task) -> Self {
        Self {
            case: task.case().clone(),
            task_type: task.task_type().to_owned(),
            is_reconfigure_request: false,
        }
    }

    /// Builds the context for reconfiguring `task`.
    #[must_use]
    pub fn for_reconfiguration(task: &Task) -> Self {
        Self {
            is_reconfigure_request: true,
            ..Self::for_initiation(task)
        }
    }
}

/// One attribute value produced by the configuration decision table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfigurationValue {
    /// Attribute name, such as `title` or `dueDateIntervalDays`.
    pub name: String,
    /// Raw attribute value.
    pub value: String,
    /// Whether the value may overwrite an existing task during
    /// reconfiguration.
    pub can_reconfigure: bool,
}

impl ConfigurationValue {
    /// Creates a configuration value.
    #[must_use]
    pub fn new(name: impl Into<String>, value: impl Into<String>, can_reconfigure: bool) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
            can_reconfigure,
        }
    }
}

/// One row produced by the permissions decision table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PermissionRule {
    /// Role the row grants permissions to.
    pub role_name: String,
    /// Granted flags.
    pub permissions: PermissionSet,
    /// Authorisation tags required for challenged access.
    #[serde(default)]
    pub authorisations: BTreeSet<String>,
    /// Assignment priority, lower numbers win.
    #[serde(default)]
    pub assignment_priority: Option<u32>,
    /// Whether the role is eligible for automatic assignment.
    #[serde(default)]
    pub auto_assignable: bool,
    /// Optional role category restriction.
    #[serde(default)]
    pub role_category: Option<RoleCategory>,
    /// Optional case access category.
    #[serde(default)]
    pub case_access_category: Option<String>,
}

impl PermissionRule {
    /// Creates a rule with no optional fields set.
    #[must_use]
    pub fn new(role_name: impl Into<String>, permissions: PermissionSet) -> Self {
        Self {
            role_name: role_name.into(),
            permissions,
            authorisations: BTreeSet::new(),
            assignment_priority: None,
            auto_assignable: false,
            role_category: None,
            case_access_category: None,
        }
    }

    /// Converts the rule into a task-owned grant.
    #[must_use]
    pub fn to_grant(&self) -> TaskRoleGrant {
        let mut grant = TaskRoleGrant::new(self.role_name.clone(), self.permissions)
            .with_authorisations(self.authorisations.iter().cloned())
            .auto_assignable(self.auto_assignable);
        if let Some(category) = self.role_category {
            grant = grant.with_role_category(category);
        }
        if let Some(priority) = self.assignment_priority {
            grant = grant.with_assignment_priority(priority);
        }
        if let Some(category) = &self.case_access_category {
            grant = grant.with_case_access_category(category.clone());
        }
        grant
    }
}
