//! Per-role permission grants owned by a task.

use super::{PermissionSet, RoleCategory};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Record of what a named role may do to a task.
///
/// Grants are owned by exactly one task and are replaced as a whole every
/// time the task is configured or reconfigured.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskRoleGrant {
    role_name: String,
    role_category: Option<RoleCategory>,
    permissions: PermissionSet,
    authorisations: BTreeSet<String>,
    auto_assignable: bool,
    assignment_priority: Option<u32>,
    case_access_category: Option<String>,
}

impl TaskRoleGrant {
    /// Creates a grant for `role_name` with the given permission flags.
    #[must_use]
    pub fn new(role_name: impl Into<String>, permissions: PermissionSet) -> Self {
        Self {
            role_name: role_name.into(),
            role_category: None,
            permissions,
            authorisations: BTreeSet::new(),
            auto_assignable: false,
            assignment_priority: None,
            case_access_category: None,
        }
    }

    /// Restricts the grant to assignments of the given role category.
    #[must_use]
    pub const fn with_role_category(mut self, role_category: RoleCategory) -> Self {
        self.role_category = Some(role_category);
        self
    }

    /// Sets the authorisation tags required by challenged access.
    #[must_use]
    pub fn with_authorisations(mut self, authorisations: impl IntoIterator<Item = String>) -> Self {
        self.authorisations = authorisations.into_iter().collect();
        self
    }

    /// Marks the grant as eligible for automatic assignment.
    #[must_use]
    pub const fn auto_assignable(mut self, auto_assignable: bool) -> Self {
        self.auto_assignable = auto_assignable;
        self
    }

    /// Sets the assignment priority, lower numbers win.
    #[must_use]
    pub const fn with_assignment_priority(mut self, priority: u32) -> Self {
        self.assignment_priority = Some(priority);
        self
    }

    /// Sets the case access category.
    #[must_use]
    pub fn with_case_access_category(mut self, category: impl Into<String>) -> Self {
        self.case_access_category = Some(category.into());
        self
    }

    /// Returns the role name.
    #[must_use]
    pub fn role_name(&self) -> &str {
        &self.role_name
    }

    /// Returns the role category restriction, if any.
    #[must_use]
    pub const fn role_category(&self) -> Option<RoleCategory> {
        self.role_category
    }

    /// Returns the permission flags.
    #[must_use]
    pub const fn permissions(&self) -> PermissionSet {
        self.permissions
    }

    /// Returns the authorisation tags.
    #[must_use]
    pub const fn authorisations(&self) -> &BTreeSet<String> {
        &self.authorisations
    }

    /// Returns whether the grant allows automatic assignment.
    #[must_use]
    pub const fn is_auto_assignable(&self) -> bool {
        self.auto_assignable
    }

    /// Returns the assignment priority, if any.
    #[must_use]
    pub const fn assignment_priority(&self) -> Option<u32> {
        self.assignment_priority
    }

    /// Returns the case access category, if any.
    #[must_use]
    pub fn case_access_category(&self) -> Option<&str> {
        self.case_access_category.as_deref()
    }
}
