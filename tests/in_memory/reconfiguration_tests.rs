//! In-memory integration tests for bulk reconfiguration.

use super::helpers::{
    CASE_TYPE, JURISDICTION, Platform, TASK_TYPE, configuration, for_case, platform,
};
use caseflow::reconfiguration::domain::{BatchStatus, TriggerRequest};
use caseflow::task::domain::{TaskAction, TaskState};
use rstest::rstest;

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn rule_changes_reach_open_tasks_after_mark_and_execute(
    platform: Platform,
) -> eyre::Result<()> {
    let open = platform.initiate().await?;
    let closed = platform.initiate().await?;
    let manager = platform.grant("morgan", "case-manager")?;
    platform.lifecycle.cancel(closed.id(), &manager).await?;
    platform.rules.set_configuration(
        JURISDICTION,
        CASE_TYPE,
        TASK_TYPE,
        configuration("Review the amended appeal", true),
    );

    let marked = platform.run(for_case("MARK_TO_RECONFIGURE")).await?;
    let executed = platform.run(TriggerRequest::new("EXECUTE_RECONFIGURE")).await?;

    eyre::ensure!(marked.status == BatchStatus::Completed);
    eyre::ensure!(marked.counts.succeeded == 1);
    eyre::ensure!(marked.counts.skipped == 1);
    eyre::ensure!(executed.counts.succeeded == 1);
    let refreshed = platform
        .lifecycle
        .tasks_for_case(open.case().case_id())
        .await?
        .into_iter()
        .find(|task| task.id() == open.id())
        .ok_or_else(|| eyre::eyre!("open task missing"))?;
    eyre::ensure!(refreshed.attributes().title == "Review the amended appeal");
    eyre::ensure!(!refreshed.is_dirty());
    eyre::ensure!(refreshed.last_reconfiguration_time().is_some());
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn frozen_attributes_survive_reconfiguration(platform: Platform) -> eyre::Result<()> {
    let task = platform.initiate().await?;
    platform.rules.set_configuration(
        JURISDICTION,
        CASE_TYPE,
        TASK_TYPE,
        configuration("Renamed while frozen", false),
    );

    platform.run(for_case("MARK_TO_RECONFIGURE")).await?;
    platform.run(for_case("EXECUTE_RECONFIGURE")).await?;

    let manager = platform.grant("morgan", "case-manager")?;
    let refreshed = platform.lifecycle.get_task(task.id(), &manager).await?;
    eyre::ensure!(refreshed.attributes().title == "Review the appeal");
    eyre::ensure!(refreshed.last_reconfiguration_time().is_some());
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn reconfiguration_moves_work_from_a_departed_caseworker(
    platform: Platform,
) -> eyre::Result<()> {
    let alice = platform.grant("alice", "tribunal-caseworker")?;
    let task = platform.initiate().await?;
    eyre::ensure!(task.assignee() == Some(&alice));
    platform.role_assignments.revoke_all(&alice)?;
    let bob = platform.grant("bob", "tribunal-caseworker")?;

    platform.run(for_case("MARK_TO_RECONFIGURE")).await?;
    platform.run(for_case("EXECUTE_RECONFIGURE")).await?;

    let refreshed = platform.lifecycle.get_task(task.id(), &bob).await?;
    eyre::ensure!(refreshed.state() == TaskState::Assigned);
    eyre::ensure!(refreshed.assignee() == Some(&bob));
    eyre::ensure!(refreshed.last_updated_action() == Some(TaskAction::AutoUnassignAssign));
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn failing_rules_are_reported_by_the_failure_listing(
    platform: Platform,
) -> eyre::Result<()> {
    let task = platform.initiate().await?;
    platform.run(for_case("MARK_TO_RECONFIGURE")).await?;
    platform.rules.fail_for_case(task.case().case_id().clone());

    let executed = platform.run(for_case("EXECUTE_RECONFIGURE")).await?;
    let listed = platform
        .run(TriggerRequest::new("EXECUTE_RECONFIGURE_FAILURES"))
        .await?;

    eyre::ensure!(executed.counts.failed == 1);
    eyre::ensure!(listed.failures.len() == 1);
    eyre::ensure!(listed.failures.iter().all(|failure| failure.task_id == task.id()));
    platform.rules.clear_failures();
    let retried = platform.run(for_case("EXECUTE_RECONFIGURE")).await?;
    eyre::ensure!(retried.counts.succeeded == 1);
    Ok(())
}
