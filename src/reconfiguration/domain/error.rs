//! Error types for reconfiguration requests and settings.

use super::ReconfigurationOperation;
use thiserror::Error;

/// Errors raised while turning a trigger request into a batch.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ReconfigurationRequestError {
    /// The operation name is not recognised.
    #[error("unknown reconfiguration operation: {0}")]
    UnknownOperation(String),

    /// The filter key and operator combination is not supported.
    #[error("unsupported task filter: {key} {operator}")]
    UnsupportedFilter {
        /// Filter attribute.
        key: String,
        /// Filter operator.
        operator: String,
    },

    /// The filter carries no values.
    #[error("task filter {0} needs at least one value")]
    EmptyFilter(String),

    /// The same filter appears more than once.
    #[error("task filter {0} given more than once")]
    DuplicateFilter(String),

    /// A filter value cannot be parsed.
    #[error("task filter {key} has invalid value {value:?}")]
    InvalidFilterValue {
        /// Filter attribute.
        key: String,
        /// Rejected value.
        value: String,
    },

    /// The operation needs a case filter to bound its selection.
    #[error("{0} requires a case_id filter")]
    MissingCaseFilter(ReconfigurationOperation),

    /// A batch control is out of range.
    #[error("invalid batch control {name}: {value}")]
    InvalidControl {
        /// Control name.
        name: &'static str,
        /// Rejected value.
        value: String,
    },
}

/// Errors raised while loading reconfiguration settings.
#[derive(Debug, Error)]
pub enum SettingsError {
    /// The settings document is not valid JSON for the settings shape.
    #[error(transparent)]
    Format(#[from] serde_json::Error),

    /// A setting is outside its accepted range.
    #[error("invalid reconfiguration settings: {0}")]
    Invalid(&'static str),
}
