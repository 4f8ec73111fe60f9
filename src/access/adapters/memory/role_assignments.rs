//! In-memory role assignment store for tests and local runs.

use async_trait::async_trait;
use std::sync::{Arc, RwLock};

use crate::access::{
    domain::RoleAssignment,
    ports::{RoleAssignmentStore, RoleAssignmentStoreError, RoleAssignmentStoreResult},
};
use crate::task::domain::{ActorId, CaseScope};

/// Thread-safe role assignment store keeping assignments in insertion order.
#[derive(Debug, Clone, Default)]
pub struct InMemoryRoleAssignmentStore {
    assignments: Arc<RwLock<Vec<RoleAssignment>>>,
}

impl InMemoryRoleAssignmentStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds an assignment.
    ///
    /// # Errors
    ///
    /// Returns [`RoleAssignmentStoreError::Unavailable`] when the store lock
    /// is poisoned.
    pub fn grant(&self, assignment: RoleAssignment) -> RoleAssignmentStoreResult<()> {
        let mut assignments = self.assignments.write().map_err(poisoned)?;
        assignments.push(assignment);
        Ok(())
    }

    /// Removes every assignment held by `actor`.
    ///
    /// # Errors
    ///
    /// Returns [`RoleAssignmentStoreError::Unavailable`] when the store lock
    /// is poisoned.
    pub fn revoke_all(&self, actor: &ActorId) -> RoleAssignmentStoreResult<()> {
        let mut assignments = self.assignments.write().map_err(poisoned)?;
        assignments.retain(|assignment| assignment.actor_id() != actor);
        Ok(())
    }
}

fn poisoned(err: impl ToString) -> RoleAssignmentStoreError {
    RoleAssignmentStoreError::unavailable(std::io::Error::other(err.to_string()))
}

fn reaches(assignment: &RoleAssignment, case: &CaseScope) -> bool {
    let scope = assignment.scope();
    if let Some(case_id) = &scope.case_id {
        return case_id == case.case_id();
    }
    scope
        .jurisdiction
        .as_deref()
        .is_none_or(|jurisdiction| jurisdiction == case.jurisdiction())
        && scope
            .case_type
            .as_deref()
            .is_none_or(|case_type| case_type == case.case_type())
}

#[async_trait]
impl RoleAssignmentStore for InMemoryRoleAssignmentStore {
    async fn find_by_actor(&self, actor: &ActorId) -> RoleAssignmentStoreResult<Vec<RoleAssignment>> {
        let assignments = self.assignments.read().map_err(poisoned)?;
        Ok(assignments
            .iter()
            .filter(|assignment| assignment.actor_id() == actor)
            .cloned()
            .collect())
    }

    async fn find_by_case(
        &self,
        case: &CaseScope,
    ) -> RoleAssignmentStoreResult<Vec<RoleAssignment>> {
        let assignments = self.assignments.read().map_err(poisoned)?;
        Ok(assignments
            .iter()
            .filter(|assignment| reaches(assignment, case))
            .cloned()
            .collect())
    }
}
