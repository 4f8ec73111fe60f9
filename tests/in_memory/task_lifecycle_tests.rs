//! In-memory integration tests for task lifecycle operations.

use super::helpers::{CASE_ID, Platform, platform};
use caseflow::task::{
    domain::{ActorId, CaseId, TaskAction, TaskState},
    services::TaskLifecycleError,
};
use rstest::rstest;

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn initiated_task_is_configured_and_stored(platform: Platform) -> eyre::Result<()> {
    let task = platform.initiate().await?;

    eyre::ensure!(task.state() == TaskState::Unassigned);
    eyre::ensure!(task.attributes().work_type.as_deref() == Some("decision_making_work"));
    eyre::ensure!(task.attributes().due_date.is_some());
    eyre::ensure!(task.roles().len() == 2);
    let found = platform.lifecycle.tasks_for_case(&CaseId::new(CASE_ID)?).await?;
    eyre::ensure!(found == vec![task]);
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn caseworker_claims_and_completes_their_task(platform: Platform) -> eyre::Result<()> {
    let task = platform.initiate().await?;
    let alice = platform.grant("alice", "tribunal-caseworker")?;

    let claimed = platform.lifecycle.claim(task.id(), &alice).await?;
    let completed = platform.lifecycle.complete(task.id(), &alice).await?;

    eyre::ensure!(claimed.assignee() == Some(&alice));
    eyre::ensure!(completed.state() == TaskState::Completed);
    eyre::ensure!(completed.last_updated_action() == Some(TaskAction::Complete));
    let read_back = platform.lifecycle.get_task(task.id(), &alice).await?;
    eyre::ensure!(read_back == completed);
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn manager_hands_work_to_a_caseworker(platform: Platform) -> eyre::Result<()> {
    let task = platform.initiate().await?;
    let manager = platform.grant("morgan", "case-manager")?;
    let bob = platform.grant("bob", "tribunal-caseworker")?;

    let assigned = platform.lifecycle.assign(task.id(), &manager, &bob).await?;

    eyre::ensure!(assigned.assignee() == Some(&bob));
    eyre::ensure!(assigned.last_updated_user() == Some(&manager));
    let refused = platform.lifecycle.claim(task.id(), &manager).await;
    eyre::ensure!(matches!(refused, Err(TaskLifecycleError::Forbidden { .. })));
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn actor_without_roles_cannot_read_the_task(platform: Platform) -> eyre::Result<()> {
    let task = platform.initiate().await?;
    let stranger = ActorId::new("stranger")?;

    let result = platform.lifecycle.get_task(task.id(), &stranger).await;

    eyre::ensure!(matches!(result, Err(TaskLifecycleError::Forbidden { .. })));
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn terminated_task_refuses_further_work(platform: Platform) -> eyre::Result<()> {
    let task = platform.initiate().await?;
    let manager = platform.grant("morgan", "case-manager")?;
    platform.lifecycle.cancel(task.id(), &manager).await?;

    let terminated = platform.lifecycle.terminate(task.id(), "cancelled").await?;
    let again = platform.lifecycle.terminate(task.id(), "cancelled").await;

    eyre::ensure!(terminated.state() == TaskState::Terminated);
    eyre::ensure!(terminated.termination_reason() == Some("cancelled"));
    eyre::ensure!(matches!(
        again,
        Err(TaskLifecycleError::Ineligible {
            state: TaskState::Terminated,
            ..
        })
    ));
    Ok(())
}
