//! `PostgreSQL` repository implementation for case task storage.

use super::{
    models::{TaskRecord, TaskRoleRow, TaskRow},
    schema::{task_roles, tasks},
};
use crate::task::{
    domain::{CaseId, Task, TaskId, TaskState},
    ports::{
        LockOutcome, TaskLock, TaskQuery, TaskRepository, TaskRepositoryError,
        TaskRepositoryResult,
    },
};
use async_trait::async_trait;
use diesel::connection::{AnsiTransactionManager, TransactionManager};
use diesel::pg::{Pg, PgConnection};
use diesel::prelude::*;
use diesel::r2d2::{ConnectionManager, Pool, PooledConnection};
use diesel::result::{DatabaseErrorKind, Error as DieselError};
use std::collections::HashMap;
use std::fmt;
use tracing::warn;

/// `PostgreSQL` connection pool type used by task adapters.
pub type TaskPgPool = Pool<ConnectionManager<PgConnection>>;

type TaskPgConnection = PooledConnection<ConnectionManager<PgConnection>>;

/// `PostgreSQL`-backed task repository.
///
/// Locks are row locks taken with `SELECT ... FOR UPDATE SKIP LOCKED` inside
/// a transaction that lives on a dedicated pooled connection until the guard
/// commits, rolls back or is dropped.
#[derive(Debug, Clone)]
pub struct PostgresTaskRepository {
    pool: TaskPgPool,
}

impl PostgresTaskRepository {
    /// Creates a new repository from a `PostgreSQL` connection pool.
    #[must_use]
    pub const fn new(pool: TaskPgPool) -> Self {
        Self { pool }
    }

    async fn run_blocking<F, T>(&self, f: F) -> TaskRepositoryResult<T>
    where
        F: FnOnce(&mut PgConnection) -> TaskRepositoryResult<T> + Send + 'static,
        T: Send + 'static,
    {
        let pool = self.pool.clone();
        tokio::task::spawn_blocking(move || {
            let mut connection = pool.get().map_err(TaskRepositoryError::persistence)?;
            f(&mut connection)
        })
        .await
        .map_err(TaskRepositoryError::persistence)?
    }
}

#[async_trait]
impl TaskRepository for PostgresTaskRepository {
    type Lock = PostgresTaskLock;

    async fn store(&self, task: &Task) -> TaskRepositoryResult<()> {
        let task_id = task.id();
        let record = TaskRecord::from_task(task);
        let roles = TaskRoleRow::for_task(task).map_err(TaskRepositoryError::persistence)?;

        self.run_blocking(move |connection| {
            connection
                .transaction::<_, DieselError, _>(|conn| {
                    diesel::insert_into(tasks::table)
                        .values(&record)
                        .execute(conn)?;
                    insert_roles(conn, &roles)
                })
                .map_err(|err| match err {
                    DieselError::DatabaseError(DatabaseErrorKind::UniqueViolation, _) => {
                        TaskRepositoryError::DuplicateTask(task_id)
                    }
                    _ => TaskRepositoryError::persistence(err),
                })
        })
        .await
    }

    async fn find_by_id(&self, id: TaskId) -> TaskRepositoryResult<Option<Task>> {
        self.run_blocking(move |connection| {
            let row = tasks::table
                .find(id.into_inner())
                .select(TaskRow::as_select())
                .first::<TaskRow>(connection)
                .optional()
                .map_err(TaskRepositoryError::persistence)?;
            Ok(hydrate(connection, row.into_iter().collect())?.pop())
        })
        .await
    }

    async fn find_by_case_id(&self, case_id: &CaseId) -> TaskRepositoryResult<Vec<Task>> {
        self.find(&TaskQuery::new().with_case_ids([case_id.clone()]))
            .await
    }

    async fn find(&self, query: &TaskQuery) -> TaskRepositoryResult<Vec<Task>> {
        let query = query.clone();
        self.run_blocking(move |connection| {
            let rows = filtered(&query)
                .select(TaskRow::as_select())
                .load::<TaskRow>(connection)
                .map_err(TaskRepositoryError::persistence)?;
            hydrate(connection, rows)
        })
        .await
    }

    async fn find_ids(&self, query: &TaskQuery) -> TaskRepositoryResult<Vec<TaskId>> {
        let query = query.clone();
        self.run_blocking(move |connection| {
            let ids = filtered(&query)
                .select(tasks::id)
                .load::<uuid::Uuid>(connection)
                .map_err(TaskRepositoryError::persistence)?;
            Ok(ids.into_iter().map(TaskId::from_uuid).collect())
        })
        .await
    }

    async fn lock(
        &self,
        id: TaskId,
        eligible: &[TaskState],
    ) -> TaskRepositoryResult<LockOutcome<Self::Lock>> {
        let pool = self.pool.clone();
        let eligible = eligible.to_vec();
        tokio::task::spawn_blocking(move || {
            let mut connection = pool.get().map_err(TaskRepositoryError::persistence)?;
            AnsiTransactionManager::begin_transaction(&mut *connection)
                .map_err(TaskRepositoryError::persistence)?;
            match select_for_update(&mut connection, id, &eligible) {
                Ok(Some(task)) => Ok(LockOutcome::Acquired(PostgresTaskLock {
                    connection: Some(connection),
                    task,
                })),
                Ok(None) => {
                    let outcome = classify_skipped_row(&mut connection, id, &eligible);
                    rollback_quietly(&mut connection, id);
                    outcome
                }
                Err(err) => {
                    rollback_quietly(&mut connection, id);
                    Err(err)
                }
            }
        })
        .await
        .map_err(TaskRepositoryError::persistence)?
    }
}

/// Row lock on one task, backed by an open transaction.
pub struct PostgresTaskLock {
    connection: Option<TaskPgConnection>,
    task: Task,
}

impl fmt::Debug for PostgresTaskLock {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PostgresTaskLock")
            .field("task_id", &self.task.id())
            .field("open", &self.connection.is_some())
            .finish_non_exhaustive()
    }
}

impl PostgresTaskLock {
    fn take_connection(&mut self) -> TaskRepositoryResult<TaskPgConnection> {
        self.connection.take().ok_or_else(|| {
            TaskRepositoryError::persistence(std::io::Error::other("task lock already released"))
        })
    }
}

#[async_trait]
impl TaskLock for PostgresTaskLock {
    fn task(&self) -> &Task {
        &self.task
    }

    async fn commit(mut self, task: &Task) -> TaskRepositoryResult<()> {
        if task.id() != self.task.id() {
            return Err(TaskRepositoryError::NotFound(task.id()));
        }
        let task_id = task.id();
        let record = TaskRecord::from_task(task);
        let roles = TaskRoleRow::for_task(task).map_err(TaskRepositoryError::persistence)?;
        let mut connection = self.take_connection()?;

        tokio::task::spawn_blocking(move || {
            match write_locked(&mut connection, &record, &roles) {
                Ok(()) => AnsiTransactionManager::commit_transaction(&mut *connection)
                    .map_err(TaskRepositoryError::persistence),
                Err(err) => {
                    rollback_quietly(&mut connection, task_id);
                    Err(TaskRepositoryError::persistence(err))
                }
            }
        })
        .await
        .map_err(TaskRepositoryError::persistence)?
    }

    async fn rollback(mut self) -> TaskRepositoryResult<()> {
        let mut connection = self.take_connection()?;
        tokio::task::spawn_blocking(move || {
            AnsiTransactionManager::rollback_transaction(&mut *connection)
                .map_err(TaskRepositoryError::persistence)
        })
        .await
        .map_err(TaskRepositoryError::persistence)?
    }
}

impl Drop for PostgresTaskLock {
    fn drop(&mut self) {
        let Some(mut connection) = self.connection.take() else {
            return;
        };
        let task_id = self.task.id();
        if let Ok(handle) = tokio::runtime::Handle::try_current() {
            handle.spawn_blocking(move || rollback_quietly(&mut connection, task_id));
        } else {
            rollback_quietly(&mut connection, task_id);
        }
    }
}

fn rollback_quietly(connection: &mut PgConnection, task_id: TaskId) {
    if let Err(err) = AnsiTransactionManager::rollback_transaction(connection) {
        warn!(task_id = %task_id, error = %err, "failed to roll back task lock transaction");
    }
}

fn filtered(query: &TaskQuery) -> tasks::BoxedQuery<'static, Pg> {
    let mut statement = tasks::table.into_boxed();
    if !query.case_ids.is_empty() {
        let case_ids: Vec<String> = query
            .case_ids
            .iter()
            .map(|case_id| case_id.as_str().to_owned())
            .collect();
        statement = statement.filter(tasks::case_id.eq_any(case_ids));
    }
    if !query.task_ids.is_empty() {
        let task_ids: Vec<uuid::Uuid> = query.task_ids.iter().map(|id| id.into_inner()).collect();
        statement = statement.filter(tasks::id.eq_any(task_ids));
    }
    if !query.states.is_empty() {
        statement = statement.filter(tasks::state.eq_any(state_names(&query.states)));
    }
    if let Some(after) = query.reconfigure_requested_after {
        statement = statement.filter(tasks::reconfigure_request_time.gt(after));
    }
    if let Some(before) = query.reconfigure_requested_before {
        statement = statement.filter(tasks::reconfigure_request_time.le(before));
    }
    statement.order((tasks::created_at.asc(), tasks::id.asc()))
}

fn state_names(states: &[TaskState]) -> Vec<String> {
    states.iter().map(|state| state.as_str().to_owned()).collect()
}

/// Attaches ordered role grants to task rows and decodes them.
fn hydrate(connection: &mut PgConnection, rows: Vec<TaskRow>) -> TaskRepositoryResult<Vec<Task>> {
    if rows.is_empty() {
        return Ok(Vec::new());
    }
    let ids: Vec<uuid::Uuid> = rows.iter().map(|row| row.id).collect();
    let role_rows = task_roles::table
        .filter(task_roles::task_id.eq_any(ids))
        .order((task_roles::task_id.asc(), task_roles::position.asc()))
        .select(TaskRoleRow::as_select())
        .load::<TaskRoleRow>(connection)
        .map_err(TaskRepositoryError::persistence)?;
    let mut roles_by_task: HashMap<uuid::Uuid, Vec<TaskRoleRow>> = HashMap::new();
    for role in role_rows {
        roles_by_task.entry(role.task_id).or_default().push(role);
    }
    rows.into_iter()
        .map(|row| {
            let roles = roles_by_task.remove(&row.id).unwrap_or_default();
            row.into_task(roles).map_err(TaskRepositoryError::persistence)
        })
        .collect()
}

fn select_for_update(
    connection: &mut PgConnection,
    id: TaskId,
    eligible: &[TaskState],
) -> TaskRepositoryResult<Option<Task>> {
    let row = tasks::table
        .filter(tasks::id.eq(id.into_inner()))
        .filter(tasks::state.eq_any(state_names(eligible)))
        .select(TaskRow::as_select())
        .for_update()
        .skip_locked()
        .first::<TaskRow>(connection)
        .optional()
        .map_err(TaskRepositoryError::persistence)?;
    Ok(hydrate(connection, row.into_iter().collect())?.pop())
}

/// Explains why the locking read returned nothing.
///
/// An eligible row that was skipped is held by another transaction.
fn classify_skipped_row(
    connection: &mut PgConnection,
    id: TaskId,
    eligible: &[TaskState],
) -> TaskRepositoryResult<LockOutcome<PostgresTaskLock>> {
    let state = tasks::table
        .find(id.into_inner())
        .select(tasks::state)
        .first::<String>(connection)
        .optional()
        .map_err(TaskRepositoryError::persistence)?;
    let Some(raw_state) = state else {
        return Ok(LockOutcome::NotFound);
    };
    let state =
        TaskState::try_from(raw_state.as_str()).map_err(TaskRepositoryError::persistence)?;
    if eligible.contains(&state) {
        Err(TaskRepositoryError::LockConflict(id))
    } else {
        Ok(LockOutcome::Ineligible(state))
    }
}

fn write_locked(
    connection: &mut PgConnection,
    record: &TaskRecord,
    roles: &[TaskRoleRow],
) -> Result<(), DieselError> {
    diesel::update(tasks::table.find(record.id))
        .set(record)
        .execute(connection)?;
    diesel::delete(task_roles::table.filter(task_roles::task_id.eq(record.id)))
        .execute(connection)?;
    insert_roles(connection, roles)
}

fn insert_roles(connection: &mut PgConnection, roles: &[TaskRoleRow]) -> Result<(), DieselError> {
    if roles.is_empty() {
        return Ok(());
    }
    diesel::insert_into(task_roles::table)
        .values(roles)
        .execute(connection)?;
    Ok(())
}
