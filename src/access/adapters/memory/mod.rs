//! In-memory access adapters.

mod role_assignments;

pub use role_assignments::InMemoryRoleAssignmentStore;
