//! Shared wiring for in-memory integration tests.

use std::sync::Arc;

use caseflow::access::{
    adapters::memory::InMemoryRoleAssignmentStore,
    domain::{GrantType, RoleAssignment, RoleScope, RoleType},
};
use caseflow::reconfiguration::{
    domain::{
        BatchOutcome, FilterRequest, LockRetryPolicy, ReconfigurationBatch,
        ReconfigurationSettings, TriggerRequest,
    },
    services::ReconfigurationOrchestrator,
};
use caseflow::task::{
    adapters::memory::{FixedHolidayCalendar, InMemoryRuleEvaluator, InMemoryTaskRepository},
    domain::{ActorId, ConfigurationValue, Permission, PermissionRule, Task},
    services::{InitiateTaskRequest, TaskConfigurator, TaskLifecycleService},
};
use mockable::DefaultClock;
use rstest::fixture;

/// Jurisdiction used by every scenario.
pub const JURISDICTION: &str = "IA";
/// Case type used by every scenario.
pub const CASE_TYPE: &str = "Asylum";
/// Task type configured by the rule tables.
pub const TASK_TYPE: &str = "reviewTheAppeal";
/// Case the tasks belong to.
pub const CASE_ID: &str = "1615817621013640";

/// Lifecycle service wired to in-memory adapters.
pub type LifecycleService = TaskLifecycleService<
    InMemoryTaskRepository,
    InMemoryRuleEvaluator,
    InMemoryRoleAssignmentStore,
    FixedHolidayCalendar,
    DefaultClock,
>;

/// Reconfiguration orchestrator wired to in-memory adapters.
pub type Orchestrator = ReconfigurationOrchestrator<
    InMemoryTaskRepository,
    InMemoryRuleEvaluator,
    InMemoryRoleAssignmentStore,
    FixedHolidayCalendar,
    DefaultClock,
>;

/// Services sharing one task repository, rule table and role store.
pub struct Platform {
    pub repository: Arc<InMemoryTaskRepository>,
    pub rules: Arc<InMemoryRuleEvaluator>,
    pub role_assignments: Arc<InMemoryRoleAssignmentStore>,
    pub settings: ReconfigurationSettings,
    pub lifecycle: LifecycleService,
    pub orchestrator: Orchestrator,
}

fn configurator(
    rules: &Arc<InMemoryRuleEvaluator>,
    role_assignments: &Arc<InMemoryRoleAssignmentStore>,
) -> TaskConfigurator<InMemoryRuleEvaluator, InMemoryRoleAssignmentStore, FixedHolidayCalendar> {
    TaskConfigurator::new(
        Arc::clone(rules),
        Arc::clone(role_assignments),
        Arc::new(FixedHolidayCalendar::new()),
    )
}

/// Configuration rows applied to every initiated task.
pub fn configuration(title: &str, title_reconfigurable: bool) -> Vec<ConfigurationValue> {
    vec![
        ConfigurationValue::new("title", title, title_reconfigurable),
        ConfigurationValue::new("dueDateIntervalDays", "5", true),
        ConfigurationValue::new("dueDateOrigin", "2025-03-12T16:00:00Z", true),
        ConfigurationValue::new("workType", "decision_making_work", true),
    ]
}

/// Permission rows granting caseworkers ownership and managers control.
pub fn permission_rules() -> Vec<PermissionRule> {
    let caseworker = PermissionRule {
        assignment_priority: Some(1),
        auto_assignable: true,
        ..PermissionRule::new(
            "tribunal-caseworker",
            [Permission::Read, Permission::Own, Permission::Claim]
                .into_iter()
                .collect(),
        )
    };
    let manager = PermissionRule::new(
        "case-manager",
        [
            Permission::Read,
            Permission::Manage,
            Permission::Assign,
            Permission::Cancel,
        ]
        .into_iter()
        .collect(),
    );
    vec![caseworker, manager]
}

/// Provides a platform with the default rule tables loaded.
#[fixture]
pub fn platform() -> Platform {
    let repository = Arc::new(InMemoryTaskRepository::new());
    let rules = Arc::new(InMemoryRuleEvaluator::new());
    let role_assignments = Arc::new(InMemoryRoleAssignmentStore::new());
    rules.set_configuration(
        JURISDICTION,
        CASE_TYPE,
        TASK_TYPE,
        configuration("Review the appeal", true),
    );
    rules.set_permissions(JURISDICTION, CASE_TYPE, TASK_TYPE, permission_rules());
    let settings = ReconfigurationSettings::default()
        .with_failure_report_delay_seconds(0)
        .with_lock_retry(LockRetryPolicy {
            max_attempts: 2,
            base_delay_ms: 1,
            max_delay_ms: 2,
            jitter: true,
        });
    let lifecycle = TaskLifecycleService::new(
        Arc::clone(&repository),
        configurator(&rules, &role_assignments),
        Arc::new(DefaultClock),
        settings.system_actor.clone(),
    );
    let orchestrator = ReconfigurationOrchestrator::new(
        Arc::clone(&repository),
        configurator(&rules, &role_assignments),
        Arc::new(DefaultClock),
        settings.clone(),
    );
    Platform {
        repository,
        rules,
        role_assignments,
        settings,
        lifecycle,
        orchestrator,
    }
}

impl Platform {
    /// Grants `role` to `name` across the case type.
    ///
    /// # Errors
    ///
    /// Returns an error if the assignment is invalid or the store rejects it.
    pub fn grant(&self, name: &str, role: &str) -> eyre::Result<ActorId> {
        let actor = ActorId::new(name)?;
        let assignment = RoleAssignment::new(
            actor.clone(),
            role,
            GrantType::Standard,
            RoleType::Organisation,
            RoleScope::for_case_type(JURISDICTION, CASE_TYPE),
        )?;
        self.role_assignments.grant(assignment)?;
        Ok(actor)
    }

    /// Initiates a task on [`CASE_ID`].
    ///
    /// # Errors
    ///
    /// Returns an error if initiation fails.
    pub async fn initiate(&self) -> eyre::Result<Task> {
        let task = self
            .lifecycle
            .initiate(InitiateTaskRequest::new(
                JURISDICTION,
                CASE_TYPE,
                CASE_ID,
                TASK_TYPE,
                "Review the appeal",
            ))
            .await?;
        Ok(task)
    }

    /// Runs one batch built from `request`.
    ///
    /// # Errors
    ///
    /// Returns an error if the request is invalid or the batch aborts.
    pub async fn run(&self, request: TriggerRequest) -> eyre::Result<BatchOutcome> {
        let batch = ReconfigurationBatch::from_request(request, &self.settings)?;
        Ok(self.orchestrator.run(&batch).await?)
    }
}

/// Builds a request for `operation` scoped to [`CASE_ID`].
#[must_use]
pub fn for_case(operation: &str) -> TriggerRequest {
    TriggerRequest::new(operation).with_filter(FilterRequest::new("case_id", "IN", [CASE_ID]))
}
