//! Shared world state for reconfiguration BDD scenarios.

use std::sync::Arc;

use caseflow::access::adapters::memory::InMemoryRoleAssignmentStore;
use caseflow::reconfiguration::{
    domain::{
        BatchOutcome, FilterRequest, ReconfigurationBatch, ReconfigurationRequestError,
        ReconfigurationSettings, TriggerRequest,
    },
    services::ReconfigurationOrchestrator,
};
use caseflow::task::{
    adapters::memory::{FixedHolidayCalendar, InMemoryRuleEvaluator, InMemoryTaskRepository},
    domain::{ConfigurationValue, Permission, PermissionRule, Task},
    ports::TaskRepository,
    services::{TaskConfigurator, TaskLifecycleService},
};
use mockable::DefaultClock;
use rstest::fixture;

/// Jurisdiction of every scenario case.
pub const JURISDICTION: &str = "IA";
/// Case type of every scenario case.
pub const CASE_TYPE: &str = "Asylum";
/// Task type the rule tables describe.
pub const TASK_TYPE: &str = "reviewTheAppeal";

/// Lifecycle service used to set up scenario tasks.
pub type ScenarioLifecycle = TaskLifecycleService<
    InMemoryTaskRepository,
    InMemoryRuleEvaluator,
    InMemoryRoleAssignmentStore,
    FixedHolidayCalendar,
    DefaultClock,
>;

/// Orchestrator under test.
pub type ScenarioOrchestrator = ReconfigurationOrchestrator<
    InMemoryTaskRepository,
    InMemoryRuleEvaluator,
    InMemoryRoleAssignmentStore,
    FixedHolidayCalendar,
    DefaultClock,
>;

/// Scenario world for reconfiguration behaviour tests.
pub struct ReconfigurationWorld {
    pub repository: Arc<InMemoryTaskRepository>,
    pub rules: Arc<InMemoryRuleEvaluator>,
    pub role_assignments: Arc<InMemoryRoleAssignmentStore>,
    pub settings: ReconfigurationSettings,
    pub lifecycle: ScenarioLifecycle,
    pub orchestrator: ScenarioOrchestrator,
    pub case_id: Option<String>,
    pub task: Option<Task>,
    pub last_outcome: Option<BatchOutcome>,
    pub last_request_error: Option<ReconfigurationRequestError>,
}

/// Configuration rows giving tasks `title` and a five-day due date.
pub fn configuration(title: &str) -> Vec<ConfigurationValue> {
    vec![
        ConfigurationValue::new("title", title, true),
        ConfigurationValue::new("dueDateOrigin", "2025-03-12T16:00:00Z", true),
        ConfigurationValue::new("dueDateIntervalDays", "5", true),
    ]
}

fn permission_rules() -> Vec<PermissionRule> {
    vec![
        PermissionRule::new(
            "tribunal-caseworker",
            [Permission::Read, Permission::Own].into_iter().collect(),
        ),
        PermissionRule::new(
            "case-manager",
            [Permission::Read, Permission::Manage, Permission::Cancel]
                .into_iter()
                .collect(),
        ),
    ]
}

impl ReconfigurationWorld {
    /// Creates a world with the rule tables loaded and no tasks.
    #[must_use]
    pub fn new() -> Self {
        let repository = Arc::new(InMemoryTaskRepository::new());
        let rules = Arc::new(InMemoryRuleEvaluator::new());
        let role_assignments = Arc::new(InMemoryRoleAssignmentStore::new());
        rules.set_configuration(
            JURISDICTION,
            CASE_TYPE,
            TASK_TYPE,
            configuration("Review the appeal"),
        );
        rules.set_permissions(JURISDICTION, CASE_TYPE, TASK_TYPE, permission_rules());
        let settings = ReconfigurationSettings::default().with_failure_report_delay_seconds(0);
        let configurator = || {
            TaskConfigurator::new(
                Arc::clone(&rules),
                Arc::clone(&role_assignments),
                Arc::new(FixedHolidayCalendar::new()),
            )
        };
        let lifecycle = TaskLifecycleService::new(
            Arc::clone(&repository),
            configurator(),
            Arc::new(DefaultClock),
            settings.system_actor.clone(),
        );
        let orchestrator = ReconfigurationOrchestrator::new(
            Arc::clone(&repository),
            configurator(),
            Arc::new(DefaultClock),
            settings.clone(),
        );

        Self {
            repository,
            rules,
            role_assignments,
            settings,
            lifecycle,
            orchestrator,
            case_id: None,
            task: None,
            last_outcome: None,
            last_request_error: None,
        }
    }

    /// Returns the scenario case identifier.
    ///
    /// # Errors
    ///
    /// Returns an error if no task has been initiated yet.
    pub fn case_id(&self) -> Result<String, eyre::Report> {
        self.case_id
            .clone()
            .ok_or_else(|| eyre::eyre!("missing case id in scenario world"))
    }

    /// Builds a request for `operation` filtered to the scenario case.
    ///
    /// # Errors
    ///
    /// Returns an error if no task has been initiated yet.
    pub fn request_for_case(&self, operation: &str) -> Result<TriggerRequest, eyre::Report> {
        Ok(TriggerRequest::new(operation).with_filter(FilterRequest::new(
            "case_id",
            "IN",
            [self.case_id()?],
        )))
    }

    /// Runs a batch and records its outcome.
    ///
    /// # Errors
    ///
    /// Returns an error if the request is invalid or the batch aborts.
    pub fn run_batch(&mut self, request: TriggerRequest) -> Result<BatchOutcome, eyre::Report> {
        let batch = ReconfigurationBatch::from_request(request, &self.settings)?;
        let outcome = run_async(self.orchestrator.run(&batch))?;
        self.last_outcome = Some(outcome.clone());
        Ok(outcome)
    }

    /// Reloads the scenario task from the repository.
    ///
    /// # Errors
    ///
    /// Returns an error if no task was initiated or it is no longer stored.
    pub fn stored_task(&self) -> Result<Task, eyre::Report> {
        let task = self
            .task
            .as_ref()
            .ok_or_else(|| eyre::eyre!("missing task in scenario world"))?;
        run_async(self.repository.find_by_id(task.id()))?
            .ok_or_else(|| eyre::eyre!("task {} is no longer stored", task.id()))
    }
}

impl Default for ReconfigurationWorld {
    fn default() -> Self {
        Self::new()
    }
}

/// Fixture that creates a new scenario world.
#[fixture]
pub fn world() -> ReconfigurationWorld {
    ReconfigurationWorld::default()
}

/// Runs an async operation within sync step definitions.
pub fn run_async<T>(future: impl std::future::Future<Output = T>) -> T {
    tokio::task::block_in_place(|| tokio::runtime::Handle::current().block_on(future))
}
