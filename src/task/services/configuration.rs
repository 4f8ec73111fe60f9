//! Derivation of task attributes, role grants and assignment from rules.

use super::dates::{DateCalculator, DateInputs};
use crate::access::{
    ports::{RoleAssignmentStore, RoleAssignmentStoreError},
    services::AutoAssignmentResolver,
};
use crate::task::{
    domain::{
        ActorId, AttributeName, PermissionRule, RuleContext, Task, TaskAction, TaskDomainError,
    },
    ports::{RuleEvaluationError, RuleEvaluator, WorkingCalendar},
};
use mockable::Clock;
use std::sync::Arc;
use thiserror::Error;
use tracing::debug;

/// Whether a task is being configured for the first time or refreshed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigurationMode {
    /// First configuration; every value applies.
    Initiation,
    /// Refresh of a configured task; only reconfigurable values apply.
    Reconfiguration,
}

/// Errors raised while (re)configuring one task.
#[derive(Debug, Error)]
pub enum TaskConfigurationError {
    /// The rule evaluator failed.
    #[error(transparent)]
    Rules(#[from] RuleEvaluationError),

    /// Role assignments for the case could not be loaded.
    #[error(transparent)]
    RoleAssignments(#[from] RoleAssignmentStoreError),

    /// A value, calculated date or mandatory field was invalid.
    #[error(transparent)]
    Domain(#[from] TaskDomainError),
}

/// Applies rule evaluator output to a task.
///
/// The configurator mutates the task it is given; callers hand it a working
/// copy and only persist the copy when configuration succeeds.
pub struct TaskConfigurator<E, S, W>
where
    E: RuleEvaluator,
    S: RoleAssignmentStore,
    W: WorkingCalendar,
{
    rules: Arc<E>,
    role_assignments: Arc<S>,
    calendar: Arc<W>,
    resolver: AutoAssignmentResolver,
}

impl<E, S, W> Clone for TaskConfigurator<E, S, W>
where
    E: RuleEvaluator,
    S: RoleAssignmentStore,
    W: WorkingCalendar,
{
    fn clone(&self) -> Self {
        Self {
            rules: Arc::clone(&self.rules),
            role_assignments: Arc::clone(&self.role_assignments),
            calendar: Arc::clone(&self.calendar),
            resolver: self.resolver,
        }
    }
}

impl<E, S, W> TaskConfigurator<E, S, W>
where
    E: RuleEvaluator,
    S: RoleAssignmentStore,
    W: WorkingCalendar,
{
    /// Creates a configurator.
    #[must_use]
    pub fn new(rules: Arc<E>, role_assignments: Arc<S>, calendar: Arc<W>) -> Self {
        Self {
            rules,
            role_assignments,
            calendar,
            resolver: AutoAssignmentResolver::default(),
        }
    }

    /// Returns the role assignment store used for auto-assignment.
    #[must_use]
    pub const fn role_assignments(&self) -> &Arc<S> {
        &self.role_assignments
    }

    /// Configures `task` and returns the audit action recorded on it.
    ///
    /// # Errors
    ///
    /// Returns [`TaskConfigurationError`] when any step fails. The task may
    /// be partially updated in that case and must be discarded.
    pub async fn configure(
        &self,
        task: &mut Task,
        mode: ConfigurationMode,
        actor: &ActorId,
        clock: &(impl Clock + Sync),
    ) -> Result<TaskAction, TaskConfigurationError> {
        let context = match mode {
            ConfigurationMode::Initiation => RuleContext::for_initiation(task),
            ConfigurationMode::Reconfiguration => RuleContext::for_reconfiguration(task),
        };

        let values = self.rules.evaluate_configuration(&context).await?;
        let mut dates = DateInputs::new();
        for value in &values {
            if mode == ConfigurationMode::Reconfiguration && !value.can_reconfigure {
                debug!(task_id = %task.id(), attribute = %value.name, "attribute frozen for reconfiguration");
                continue;
            }
            match AttributeName::parse(&value.name) {
                Some(AttributeName::Plain(attribute)) => {
                    task.attributes_mut().apply(attribute, &value.value)?;
                }
                Some(AttributeName::Date(field, input)) => dates.record(field, input, &value.value),
                None => {
                    debug!(task_id = %task.id(), attribute = %value.name, "ignoring unknown configuration attribute");
                }
            }
        }
        DateCalculator::new(&*self.calendar).derive(task.attributes_mut(), &dates)?;

        let permission_rules = self.rules.evaluate_permissions(&context).await?;
        task.replace_roles(permission_rules.iter().map(PermissionRule::to_grant).collect());

        let candidates = self.role_assignments.find_by_case(task.case()).await?;
        let decision = self.resolver.resolve(task, &candidates, clock.utc());
        let previous = task.assignee().cloned();
        let action = decision.audit_action(previous.as_ref());
        task.settle_assignment(decision.resulting_assignee(previous.as_ref()), clock)?;

        task.validate_configured()?;
        task.finish_configuration(actor, action, clock);
        Ok(action)
    }
}
