//! Shared world state for task lifecycle BDD scenarios.

use std::sync::Arc;

use caseflow::access::adapters::memory::InMemoryRoleAssignmentStore;
use caseflow::task::{
    adapters::memory::{FixedHolidayCalendar, InMemoryRuleEvaluator, InMemoryTaskRepository},
    domain::{ActorId, ConfigurationValue, Permission, PermissionRule, Task, TaskId},
    ports::TaskRepository,
    services::{TaskConfigurator, TaskLifecycleError, TaskLifecycleService},
};
use mockable::DefaultClock;
use rstest::fixture;

/// Jurisdiction of the scenario case.
pub const JURISDICTION: &str = "IA";
/// Case type of the scenario case.
pub const CASE_TYPE: &str = "Asylum";
/// Task type the rule tables describe.
pub const TASK_TYPE: &str = "reviewTheAppeal";

/// Service type used by the BDD world.
pub type TestTaskService = TaskLifecycleService<
    InMemoryTaskRepository,
    InMemoryRuleEvaluator,
    InMemoryRoleAssignmentStore,
    FixedHolidayCalendar,
    DefaultClock,
>;

/// Scenario world for task lifecycle behaviour tests.
pub struct LifecycleWorld {
    pub repository: Arc<InMemoryTaskRepository>,
    pub role_assignments: Arc<InMemoryRoleAssignmentStore>,
    pub service: TestTaskService,
    pub task: Option<Task>,
    pub last_result: Option<Result<Task, TaskLifecycleError>>,
}

impl LifecycleWorld {
    /// Creates a world with rule tables loaded and no tasks.
    #[must_use]
    pub fn new() -> Self {
        let repository = Arc::new(InMemoryTaskRepository::new());
        let rules = Arc::new(InMemoryRuleEvaluator::new());
        let role_assignments = Arc::new(InMemoryRoleAssignmentStore::new());
        rules.set_configuration(
            JURISDICTION,
            CASE_TYPE,
            TASK_TYPE,
            vec![
                ConfigurationValue::new("title", "Review the appeal", true),
                ConfigurationValue::new("dueDate", "2025-03-19T16:00:00Z", true),
            ],
        );
        rules.set_permissions(
            JURISDICTION,
            CASE_TYPE,
            TASK_TYPE,
            vec![PermissionRule::new(
                "tribunal-caseworker",
                [Permission::Read, Permission::Own, Permission::Claim]
                    .into_iter()
                    .collect(),
            )],
        );
        let service = TaskLifecycleService::new(
            Arc::clone(&repository),
            TaskConfigurator::new(
                rules,
                Arc::clone(&role_assignments),
                Arc::new(FixedHolidayCalendar::new()),
            ),
            Arc::new(DefaultClock),
            ActorId::system(),
        );

        Self {
            repository,
            role_assignments,
            service,
            task: None,
            last_result: None,
        }
    }

    /// Returns the identifier of the scenario task.
    ///
    /// # Errors
    ///
    /// Returns an error if no task has been initiated yet.
    pub fn task_id(&self) -> Result<TaskId, eyre::Report> {
        self.task
            .as_ref()
            .map(Task::id)
            .ok_or_else(|| eyre::eyre!("missing task in scenario world"))
    }

    /// Reloads the scenario task from the repository.
    ///
    /// # Errors
    ///
    /// Returns an error if no task was initiated or it is no longer stored.
    pub fn stored_task(&self) -> Result<Task, eyre::Report> {
        let task_id = self.task_id()?;
        run_async(self.repository.find_by_id(task_id))?
            .ok_or_else(|| eyre::eyre!("task {task_id} is no longer stored"))
    }
}

impl Default for LifecycleWorld {
    fn default() -> Self {
        Self::new()
    }
}

/// Fixture that creates a new scenario world.
#[fixture]
pub fn world() -> LifecycleWorld {
    LifecycleWorld::default()
}

/// Runs an async operation within sync step definitions.
pub fn run_async<T>(future: impl std::future::Future<Output = T>) -> T {
    tokio::task::block_in_place(|| tokio::runtime::Handle::current().block_on(future))
}
