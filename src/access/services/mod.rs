//! Access evaluation services.

mod auto_assignment;
mod evaluator;

pub use auto_assignment::{AssignmentDecision, AutoAssignmentResolver};
pub use evaluator::{AccessDecision, PermissionEvaluator};
