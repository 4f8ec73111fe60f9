//! Role assignment store port.

use crate::access::domain::RoleAssignment;
use crate::task::domain::{ActorId, CaseScope};
use async_trait::async_trait;
use std::sync::Arc;
use thiserror::Error;

/// Result type for role assignment store operations.
pub type RoleAssignmentStoreResult<T> = Result<T, RoleAssignmentStoreError>;

/// Read-only source of actors' role assignments.
#[async_trait]
pub trait RoleAssignmentStore: Send + Sync {
    /// Returns every assignment held by `actor`.
    async fn find_by_actor(&self, actor: &ActorId) -> RoleAssignmentStoreResult<Vec<RoleAssignment>>;

    /// Returns the assignments whose scope can reach the given case, in a
    /// stable order.
    async fn find_by_case(&self, case: &CaseScope)
    -> RoleAssignmentStoreResult<Vec<RoleAssignment>>;
}

/// Errors returned by role assignment store implementations.
#[derive(Debug, Clone, Error)]
pub enum RoleAssignmentStoreError {
    /// The store could not be reached or returned a malformed answer.
    #[error("role assignment store unavailable: {0}")]
    Unavailable(Arc<dyn std::error::Error + Send + Sync>),
}

impl RoleAssignmentStoreError {
    /// Wraps a transport or decoding error.
    pub fn unavailable(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::Unavailable(Arc::new(err))
    }
}
