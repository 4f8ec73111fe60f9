//! Port contracts for task management.
//!
//! Ports define infrastructure-agnostic interfaces used by task services.

pub mod calendar;
pub mod repository;
pub mod rules;

pub use calendar::WorkingCalendar;
pub use repository::{
    LockOutcome, TaskLock, TaskQuery, TaskRepository, TaskRepositoryError, TaskRepositoryResult,
};
pub use rules::{RuleEvaluationError, RuleEvaluationResult, RuleEvaluator};
#[cfg(test)]
pub use rules::MockRuleEvaluator;
