//! Port contracts for access control.

pub mod role_assignments;

pub use role_assignments::{RoleAssignmentStore, RoleAssignmentStoreError, RoleAssignmentStoreResult};
