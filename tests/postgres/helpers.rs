//! Shared helpers for `PostgreSQL` integration tests.

use caseflow::task::{
    adapters::postgres::PostgresTaskRepository,
    domain::{
        CaseScope, NewTask, Permission, PermissionSet, SecurityClassification, Task,
        TaskRoleGrant,
    },
};
use chrono::Duration;
use diesel::connection::SimpleConnection;
use diesel::prelude::*;
use diesel::r2d2::{ConnectionManager, Pool};
use mockable::{Clock, DefaultClock};
use pg_embedded_setup_unpriv::TestCluster;
use tokio::runtime::Runtime;
use tracing::warn;

/// SQL that creates the task tables.
const CREATE_TASKS_SQL: &str =
    include_str!("../../migrations/2025-03-01-000000_create_tasks/up.sql");

/// Template database name for the pre-migrated schema.
const TEMPLATE_DB: &str = "caseflow_test_template";

/// Creates a tokio runtime for driving the async repository.
pub fn test_runtime() -> eyre::Result<Runtime> {
    Ok(tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?)
}

/// Ensures the template database exists with the task schema applied.
pub fn ensure_template(cluster: &TestCluster) -> eyre::Result<()> {
    cluster
        .ensure_template_exists(TEMPLATE_DB, |db_name| {
            let url = cluster.connection().database_url(db_name);
            let mut conn = PgConnection::establish(&url).map_err(|e| eyre::eyre!("{e}"))?;
            conn.batch_execute(CREATE_TASKS_SQL)
                .map_err(|e| eyre::eyre!("{e}"))?;
            Ok(())
        })
        .map_err(|e| eyre::eyre!("{e}"))
}

/// Throwaway database cloned from the template, dropped with the guard.
pub struct TaskDatabase<'a> {
    cluster: &'a TestCluster,
    name: String,
    /// Repository bound to the database.
    pub repository: PostgresTaskRepository,
}

impl<'a> TaskDatabase<'a> {
    /// Clones the template into a fresh database and opens a repository.
    ///
    /// The pool holds several connections so that concurrent guards can
    /// contend for the same row.
    pub fn create(cluster: &'a TestCluster, prefix: &str) -> eyre::Result<Self> {
        ensure_template(cluster)?;
        let name = format!("{prefix}_{}", uuid::Uuid::new_v4().simple());
        cluster
            .create_database_from_template(name.as_str(), TEMPLATE_DB)
            .map_err(|e| eyre::eyre!("{e}"))?;
        let url = cluster.connection().database_url(&name);
        let pool = Pool::builder()
            .max_size(4)
            .build(ConnectionManager::<PgConnection>::new(url))?;
        Ok(Self {
            cluster,
            name,
            repository: PostgresTaskRepository::new(pool),
        })
    }
}

impl Drop for TaskDatabase<'_> {
    fn drop(&mut self) {
        if let Err(err) = self.cluster.drop_database(self.name.as_str()) {
            warn!(database = %self.name, error = %err, "failed to drop test database");
        }
    }
}

/// Builds an unassigned, configured task carrying one caseworker grant.
pub fn open_task(case_id: &str) -> eyre::Result<Task> {
    let clock = DefaultClock;
    let case = CaseScope::from_parts("IA", "Asylum", case_id)?;
    let mut task = Task::new(
        NewTask {
            case,
            task_type: "reviewTheAppeal".to_owned(),
            title: "Review the appeal".to_owned(),
            security_classification: SecurityClassification::Public,
        },
        &clock,
    )?;
    task.attributes_mut().due_date = Some(clock.utc() + Duration::days(5));
    task.replace_roles(vec![grant(
        "tribunal-caseworker",
        &[Permission::Read, Permission::Own],
    )]);
    task.settle_assignment(None, &clock)?;
    Ok(task)
}

/// Builds a role grant with the given permissions.
pub fn grant(role_name: &str, permissions: &[Permission]) -> TaskRoleGrant {
    TaskRoleGrant::new(
        role_name,
        permissions.iter().copied().collect::<PermissionSet>(),
    )
}
