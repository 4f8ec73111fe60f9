//! Permission flags granted to roles on a task.

use super::ParseTaskValueError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// A single action a role may be permitted to perform on a task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Permission {
    /// View the task.
    Read,
    /// Own the task (claim and work on it).
    Own,
    /// Execute the task.
    Execute,
    /// Manage the task on behalf of others.
    Manage,
    /// Cancel the task.
    Cancel,
    /// Refer the task.
    Refer,
    /// Complete the task regardless of assignment.
    Complete,
    /// Complete the task when assigned to the actor.
    CompleteOwn,
    /// Cancel the task when assigned to the actor.
    CancelOwn,
    /// Claim an unassigned task.
    Claim,
    /// Release a claimed task.
    Unclaim,
    /// Assign the task to another actor.
    Assign,
    /// Remove the current assignee.
    Unassign,
    /// Release the task and assign it to someone else.
    UnclaimAssign,
    /// Remove the current assignee and claim the task.
    UnassignClaim,
    /// Remove the current assignee and assign someone else.
    UnassignAssign,
}

impl Permission {
    /// Every permission in declaration order.
    pub const ALL: [Self; 16] = [
        Self::Read,
        Self::Own,
        Self::Execute,
        Self::Manage,
        Self::Cancel,
        Self::Refer,
        Self::Complete,
        Self::CompleteOwn,
        Self::CancelOwn,
        Self::Claim,
        Self::Unclaim,
        Self::Assign,
        Self::Unassign,
        Self::UnclaimAssign,
        Self::UnassignClaim,
        Self::UnassignAssign,
    ];

    /// Returns the canonical storage representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Read => "READ",
            Self::Own => "OWN",
            Self::Execute => "EXECUTE",
            Self::Manage => "MANAGE",
            Self::Cancel => "CANCEL",
            Self::Refer => "REFER",
            Self::Complete => "COMPLETE",
            Self::CompleteOwn => "COMPLETE_OWN",
            Self::CancelOwn => "CANCEL_OWN",
            Self::Claim => "CLAIM",
            Self::Unclaim => "UNCLAIM",
            Self::Assign => "ASSIGN",
            Self::Unassign => "UNASSIGN",
            Self::UnclaimAssign => "UNCLAIM_ASSIGN",
            Self::UnassignClaim => "UNASSIGN_CLAIM",
            Self::UnassignAssign => "UNASSIGN_ASSIGN",
        }
    }

    const fn bit(self) -> u32 {
        1 << (self as u32)
    }
}

impl TryFrom<&str> for Permission {
    type Error = ParseTaskValueError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        let normalized = value.trim().to_ascii_uppercase().replace(' ', "_");
        Self::ALL
            .into_iter()
            .find(|permission| permission.as_str() == normalized)
            .ok_or_else(|| ParseTaskValueError::new("permission", value))
    }
}

impl fmt::Display for Permission {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Set of permission flags.
///
/// Sets combine with [`PermissionSet::union`], the flag-wise OR used when an
/// actor matches several role grants on the same task.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "Vec<Permission>", from = "Vec<Permission>")]
pub struct PermissionSet(u32);

impl PermissionSet {
    /// Returns a set with no flags.
    #[must_use]
    pub const fn empty() -> Self {
        Self(0)
    }

    /// Returns a copy of this set with `permission` added.
    #[must_use]
    pub const fn with(self, permission: Permission) -> Self {
        Self(self.0 | permission.bit())
    }

    /// Returns whether `permission` is present.
    #[must_use]
    pub const fn contains(self, permission: Permission) -> bool {
        self.0 & permission.bit() != 0
    }

    /// Returns whether at least one of `permissions` is present.
    #[must_use]
    pub fn contains_any(self, permissions: &[Permission]) -> bool {
        permissions.iter().any(|permission| self.contains(*permission))
    }

    /// Returns the flag-wise OR of both sets.
    #[must_use]
    pub const fn union(self, other: Self) -> Self {
        Self(self.0 | other.0)
    }

    /// Returns whether no flag is set.
    #[must_use]
    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }

    /// Iterates the set flags in declaration order.
    pub fn iter(self) -> impl Iterator<Item = Permission> {
        Permission::ALL
            .into_iter()
            .filter(move |permission| self.contains(*permission))
    }

    /// Parses a comma separated list such as `"Read,Own,Execute"`.
    ///
    /// # Errors
    ///
    /// Returns [`ParseTaskValueError`] when any entry is not a known
    /// permission.
    pub fn parse_list(value: &str) -> Result<Self, ParseTaskValueError> {
        value
            .split(',')
            .map(str::trim)
            .filter(|entry| !entry.is_empty())
            .map(Permission::try_from)
            .collect()
    }
}

impl FromIterator<Permission> for PermissionSet {
    fn from_iter<I: IntoIterator<Item = Permission>>(iter: I) -> Self {
        iter.into_iter().fold(Self::empty(), Self::with)
    }
}

impl From<Vec<Permission>> for PermissionSet {
    fn from(value: Vec<Permission>) -> Self {
        value.into_iter().collect()
    }
}

impl From<PermissionSet> for Vec<Permission> {
    fn from(value: PermissionSet) -> Self {
        value.iter().collect()
    }
}

impl fmt::Display for PermissionSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names: Vec<&str> = self.iter().map(Permission::as_str).collect();
        write!(f, "[{}]", names.join(","))
    }
}
