//! Rule evaluator serving static decision-table outputs.

use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, RwLock};

use crate::task::{
    domain::{CaseId, ConfigurationValue, PermissionRule, RuleContext},
    ports::{RuleEvaluationError, RuleEvaluationResult, RuleEvaluator},
};

/// Decision-table key: jurisdiction, case type and task type.
type TableKey = (String, String, String);

/// In-memory rule evaluator keyed by jurisdiction, case type and task type.
///
/// Tables can be replaced at any time to simulate rule changes, and failures
/// can be injected per case to exercise error handling.
#[derive(Debug, Clone, Default)]
pub struct InMemoryRuleEvaluator {
    state: Arc<RwLock<RuleTables>>,
}

#[derive(Debug, Default)]
struct RuleTables {
    configuration: HashMap<TableKey, Vec<ConfigurationValue>>,
    permissions: HashMap<TableKey, Vec<PermissionRule>>,
    failing_cases: HashSet<CaseId>,
}

fn key(jurisdiction: &str, case_type: &str, task_type: &str) -> TableKey {
    (
        jurisdiction.to_owned(),
        case_type.to_owned(),
        task_type.to_owned(),
    )
}

fn context_key(context: &RuleContext) -> TableKey {
    key(
        context.case.jurisdiction(),
        context.case.case_type(),
        &context.task_type,
    )
}

fn table_error(err: impl ToString) -> RuleEvaluationError {
    RuleEvaluationError::unavailable(std::io::Error::other(err.to_string()))
}

impl InMemoryRuleEvaluator {
    /// Creates an evaluator with no tables.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces the configuration table for a task type.
    pub fn set_configuration(
        &self,
        jurisdiction: &str,
        case_type: &str,
        task_type: &str,
        values: Vec<ConfigurationValue>,
    ) {
        if let Ok(mut tables) = self.state.write() {
            tables
                .configuration
                .insert(key(jurisdiction, case_type, task_type), values);
        }
    }

    /// Replaces the permissions table for a task type.
    pub fn set_permissions(
        &self,
        jurisdiction: &str,
        case_type: &str,
        task_type: &str,
        rules: Vec<PermissionRule>,
    ) {
        if let Ok(mut tables) = self.state.write() {
            tables
                .permissions
                .insert(key(jurisdiction, case_type, task_type), rules);
        }
    }

    /// Makes every evaluation for `case_id` fail until cleared.
    pub fn fail_for_case(&self, case_id: CaseId) {
        if let Ok(mut tables) = self.state.write() {
            tables.failing_cases.insert(case_id);
        }
    }

    /// Clears injected failures.
    pub fn clear_failures(&self) {
        if let Ok(mut tables) = self.state.write() {
            tables.failing_cases.clear();
        }
    }

    fn lookup<T: Clone>(
        &self,
        context: &RuleContext,
        table: impl Fn(&RuleTables) -> &HashMap<TableKey, Vec<T>>,
    ) -> RuleEvaluationResult<Vec<T>> {
        let tables = self.state.read().map_err(table_error)?;
        if tables.failing_cases.contains(context.case.case_id()) {
            return Err(table_error(format!(
                "injected failure for case {}",
                context.case.case_id()
            )));
        }
        table(&*tables)
            .get(&context_key(context))
            .cloned()
            .ok_or_else(|| {
                RuleEvaluationError::MissingTable(format!("{}/{}", context.case, context.task_type))
            })
    }
}

#[async_trait]
impl RuleEvaluator for InMemoryRuleEvaluator {
    async fn evaluate_configuration(
        &self,
        context: &RuleContext,
    ) -> RuleEvaluationResult<Vec<ConfigurationValue>> {
        self.lookup(context, |tables| &tables.configuration)
    }

    async fn evaluate_permissions(
        &self,
        context: &RuleContext,
    ) -> RuleEvaluationResult<Vec<PermissionRule>> {
        self.lookup(context, |tables| &tables.permissions)
    }
}
