//! Error types for task domain validation and parsing.

use super::{TaskId, TaskState};
use thiserror::Error;

/// Errors returned while constructing or mutating domain task values.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum TaskDomainError {
    /// The case identifier is empty or contains whitespace.
    #[error("invalid case id '{0}'")]
    InvalidCaseId(String),

    /// The actor identifier is empty after trimming.
    #[error("actor id must not be empty")]
    EmptyActorId,

    /// The jurisdiction is empty after trimming.
    #[error("jurisdiction must not be empty")]
    EmptyJurisdiction,

    /// The case type is empty after trimming.
    #[error("case type must not be empty")]
    EmptyCaseType,

    /// The task type is empty after trimming.
    #[error("task type must not be empty")]
    EmptyTaskType,

    /// A configured task has no title.
    #[error("task {0} has no title")]
    MissingTitle(TaskId),

    /// A configured task has no due date.
    #[error("task {0} has no due date")]
    MissingDueDate(TaskId),

    /// The requested state transition is not permitted.
    #[error("task {task_id} cannot transition from {from} to {to}")]
    InvalidStateTransition {
        /// Task being transitioned.
        task_id: TaskId,
        /// Current state.
        from: TaskState,
        /// Requested state.
        to: TaskState,
    },

    /// The task is already assigned to another actor.
    #[error("task {0} is already assigned")]
    AlreadyAssigned(TaskId),

    /// A configuration value could not be interpreted.
    #[error("invalid value '{value}' for attribute {attribute}")]
    InvalidAttributeValue {
        /// Attribute name as supplied by the rule evaluator.
        attribute: String,
        /// Raw rejected value.
        value: String,
    },

    /// A calculated date could not be derived from its inputs.
    #[error("cannot calculate {field}: {reason}")]
    DateCalculation {
        /// Date field being derived.
        field: String,
        /// Why derivation failed.
        reason: String,
    },
}

/// Error returned while parsing task states from persistence.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("unknown task state: {0}")]
pub struct ParseTaskStateError(pub String);

/// Error returned while parsing an enumerated task value from persistence.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("unknown {kind}: {value}")]
pub struct ParseTaskValueError {
    /// Kind of value being parsed.
    pub kind: &'static str,
    /// Rejected raw value.
    pub value: String,
}

impl ParseTaskValueError {
    pub(crate) fn new(kind: &'static str, value: &str) -> Self {
        Self {
            kind,
            value: value.to_owned(),
        }
    }
}
