//! Row locking behaviour of the `PostgreSQL` task repository.

use super::helpers::{TaskDatabase, grant, open_task, test_runtime};
use caseflow::task::{
    domain::{ActorId, Permission, TaskAction, TaskId, TaskState},
    ports::{LockOutcome, TaskLock, TaskQuery, TaskRepository, TaskRepositoryError},
};
use eyre::{bail, ensure};
use mockable::DefaultClock;
use pg_embedded_setup_unpriv::TestCluster;
use pg_embedded_setup_unpriv::test_support::shared_test_cluster;
use rstest::rstest;

#[rstest]
fn second_lock_on_a_held_row_conflicts(
    shared_test_cluster: &'static TestCluster,
) -> eyre::Result<()> {
    let database = TaskDatabase::create(shared_test_cluster, "lock_conflict")?;
    let repository = &database.repository;
    let task = open_task("1615817621013640")?;
    let rt = test_runtime()?;
    rt.block_on(repository.store(&task))?;

    let held = rt.block_on(repository.lock(task.id(), &TaskState::RECONFIGURABLE))?;
    let contended = rt.block_on(repository.lock(task.id(), &TaskState::RECONFIGURABLE));

    ensure!(matches!(held, LockOutcome::Acquired(_)));
    ensure!(matches!(
        contended,
        Err(TaskRepositoryError::LockConflict(id)) if id == task.id()
    ));
    drop(held);
    let relocked = rt.block_on(repository.lock(task.id(), &TaskState::RECONFIGURABLE))?;
    ensure!(matches!(relocked, LockOutcome::Acquired(_)));
    Ok(())
}

#[rstest]
fn closed_or_missing_rows_are_not_locked(
    shared_test_cluster: &'static TestCluster,
) -> eyre::Result<()> {
    let database = TaskDatabase::create(shared_test_cluster, "lock_ineligible")?;
    let repository = &database.repository;
    let mut task = open_task("1615817621013640")?;
    task.cancel(&ActorId::new("manager")?, &DefaultClock)?;
    let rt = test_runtime()?;
    rt.block_on(repository.store(&task))?;

    let cancelled = rt.block_on(repository.lock(task.id(), &TaskState::RECONFIGURABLE))?;
    let missing = rt.block_on(repository.lock(TaskId::new(), &TaskState::RECONFIGURABLE))?;

    ensure!(matches!(
        cancelled,
        LockOutcome::Ineligible(TaskState::Cancelled)
    ));
    ensure!(matches!(missing, LockOutcome::NotFound));
    Ok(())
}

#[rstest]
fn committed_reconfiguration_clears_the_request_time(
    shared_test_cluster: &'static TestCluster,
) -> eyre::Result<()> {
    let database = TaskDatabase::create(shared_test_cluster, "lock_commit")?;
    let repository = &database.repository;
    let task = open_task("1615817621013640")?;
    let system = ActorId::system();
    let rt = test_runtime()?;
    rt.block_on(repository.store(&task))?;

    let LockOutcome::Acquired(lock) =
        rt.block_on(repository.lock(task.id(), &TaskState::RECONFIGURABLE))?
    else {
        bail!("expected to lock the task for marking");
    };
    let mut marked = lock.task().clone();
    marked.mark_for_reconfiguration(&system, &DefaultClock)?;
    rt.block_on(lock.commit(&marked))?;
    let dirty = rt.block_on(
        repository.find_ids(
            &TaskQuery::new()
                .with_states(TaskState::RECONFIGURABLE)
                .reconfigure_requested_after(task.created_at() - chrono::Duration::seconds(1)),
        ),
    )?;

    let LockOutcome::Acquired(lock) =
        rt.block_on(repository.lock(task.id(), &TaskState::RECONFIGURABLE))?
    else {
        bail!("expected to lock the task for execution");
    };
    let mut refreshed = lock.task().clone();
    refreshed.finish_configuration(&system, TaskAction::Configure, &DefaultClock);
    rt.block_on(lock.commit(&refreshed))?;
    let stored = rt
        .block_on(repository.find_by_id(task.id()))?
        .ok_or_else(|| eyre::eyre!("task missing after commit"))?;

    ensure!(dirty == vec![task.id()]);
    ensure!(stored.reconfigure_request_time().is_none());
    ensure!(stored.last_reconfiguration_time().is_some());
    ensure!(stored.last_updated_user() == Some(&system));
    ensure!(stored.last_updated_action() == Some(TaskAction::Configure));
    Ok(())
}

#[rstest]
fn commit_replaces_role_grants_wholesale(
    shared_test_cluster: &'static TestCluster,
) -> eyre::Result<()> {
    let database = TaskDatabase::create(shared_test_cluster, "lock_roles")?;
    let repository = &database.repository;
    let mut task = open_task("1615817621013640")?;
    task.replace_roles(vec![
        grant("tribunal-caseworker", &[Permission::Read, Permission::Own]),
        grant("senior-tribunal-caseworker", &[Permission::Read, Permission::Manage]),
    ]);
    let rt = test_runtime()?;
    rt.block_on(repository.store(&task))?;

    let LockOutcome::Acquired(lock) =
        rt.block_on(repository.lock(task.id(), &TaskState::RECONFIGURABLE))?
    else {
        bail!("expected to lock the task");
    };
    let mut regranted = lock.task().clone();
    regranted.replace_roles(vec![grant(
        "case-manager",
        &[Permission::Read, Permission::Assign],
    )]);
    rt.block_on(lock.commit(&regranted))?;
    let stored = rt
        .block_on(repository.find_by_id(task.id()))?
        .ok_or_else(|| eyre::eyre!("task missing after commit"))?;

    let names: Vec<&str> = stored.roles().iter().map(|role| role.role_name()).collect();
    ensure!(names == vec!["case-manager"]);
    Ok(())
}

#[rstest]
fn released_locks_discard_uncommitted_changes(
    shared_test_cluster: &'static TestCluster,
) -> eyre::Result<()> {
    let database = TaskDatabase::create(shared_test_cluster, "lock_rollback")?;
    let repository = &database.repository;
    let task = open_task("1615817621013640")?;
    let rt = test_runtime()?;
    rt.block_on(repository.store(&task))?;

    let LockOutcome::Acquired(lock) =
        rt.block_on(repository.lock(task.id(), &TaskState::RECONFIGURABLE))?
    else {
        bail!("expected to lock the task");
    };
    rt.block_on(lock.rollback())?;
    let LockOutcome::Acquired(lock) =
        rt.block_on(repository.lock(task.id(), &TaskState::RECONFIGURABLE))?
    else {
        bail!("expected the rolled back lock to be free");
    };
    let mut abandoned = lock.task().clone();
    abandoned.mark_for_reconfiguration(&ActorId::system(), &DefaultClock)?;
    drop(lock);
    let relocked = rt.block_on(repository.lock(task.id(), &TaskState::RECONFIGURABLE))?;
    let stored = rt
        .block_on(repository.find_by_id(task.id()))?
        .ok_or_else(|| eyre::eyre!("task missing"))?;

    ensure!(matches!(relocked, LockOutcome::Acquired(_)));
    ensure!(abandoned.is_dirty());
    ensure!(!stored.is_dirty());
    ensure!(stored.state() == TaskState::Unassigned);
    Ok(())
}
