//! Access control for case tasks.
//!
//! Reconciles an actor's role assignments against the role grants a task
//! owns. The [`services::PermissionEvaluator`] decides what an actor may do to
//! a task, and the [`services::AutoAssignmentResolver`] uses it to pick an
//! assignee when a task is (re)configured. The module follows hexagonal
//! architecture:
//!
//! - Domain types in [`domain`]
//! - Port contracts in [`ports`]
//! - Adapter implementations in [`adapters`]
//! - Evaluation services in [`services`]

pub mod adapters;
pub mod domain;
pub mod ports;
pub mod services;

#[cfg(test)]
mod tests;
