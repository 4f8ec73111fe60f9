//! Domain model for role assignments.

mod error;
mod role_assignment;

pub use error::AccessDomainError;
pub use role_assignment::{GrantType, RoleAssignment, RoleScope, RoleType};
