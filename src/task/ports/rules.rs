//! Port for the external business-rule (decision table) evaluator.

use crate::task::domain::{ConfigurationValue, PermissionRule, RuleContext};
use async_trait::async_trait;
use std::sync::Arc;
use thiserror::Error;

/// Result type for rule evaluation.
pub type RuleEvaluationResult<T> = Result<T, RuleEvaluationError>;

/// Decision-table evaluator supplying task configuration and permissions.
///
/// Both outputs are treated as opaque data by the core; the ordering of
/// configuration values is significant because later values overwrite
/// earlier ones for the same attribute.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait RuleEvaluator: Send + Sync {
    /// Evaluates the configuration table for a task.
    ///
    /// # Errors
    ///
    /// Returns [`RuleEvaluationError`] when the evaluator is unreachable or
    /// rejects the context.
    async fn evaluate_configuration(
        &self,
        context: &RuleContext,
    ) -> RuleEvaluationResult<Vec<ConfigurationValue>>;

    /// Evaluates the permissions table for a task.
    ///
    /// # Errors
    ///
    /// Returns [`RuleEvaluationError`] when the evaluator is unreachable or
    /// rejects the context.
    async fn evaluate_permissions(
        &self,
        context: &RuleContext,
    ) -> RuleEvaluationResult<Vec<PermissionRule>>;
}

/// Errors returned by rule evaluator implementations.
#[derive(Debug, Clone, Error)]
pub enum RuleEvaluationError {
    /// No decision table exists for the context.
    #[error("no decision table for {0}")]
    MissingTable(String),

    /// The evaluator could not be reached or failed.
    #[error("rule evaluation failed: {0}")]
    Unavailable(Arc<dyn std::error::Error + Send + Sync>),
}

impl RuleEvaluationError {
    /// Wraps an evaluator failure.
    pub fn unavailable(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::Unavailable(Arc::new(err))
    }
}
