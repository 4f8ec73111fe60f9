//! Then steps for reconfiguration BDD scenarios.

use super::world::{ReconfigurationWorld, run_async};
use caseflow::reconfiguration::domain::{
    BatchOutcome, ReconfigurationBatch, ReconfigurationRequestError, TriggerRequest,
};
use rstest_bdd_macros::then;

fn last_outcome(world: &ReconfigurationWorld) -> Result<&BatchOutcome, eyre::Report> {
    world
        .last_outcome
        .as_ref()
        .ok_or_else(|| eyre::eyre!("no batch has run in this scenario"))
}

#[then(r#"the task title is "{title}""#)]
fn task_title_is(world: &ReconfigurationWorld, title: String) -> Result<(), eyre::Report> {
    let task = world.stored_task()?;
    eyre::ensure!(
        task.attributes().title == title,
        "expected title {title:?}, found {:?}",
        task.attributes().title
    );
    Ok(())
}

#[then("the task is awaiting reconfiguration")]
fn task_is_awaiting(world: &ReconfigurationWorld) -> Result<(), eyre::Report> {
    eyre::ensure!(
        world.stored_task()?.is_dirty(),
        "expected a pending reconfiguration request"
    );
    Ok(())
}

#[then("the task is not awaiting reconfiguration")]
fn task_is_not_awaiting(world: &ReconfigurationWorld) -> Result<(), eyre::Report> {
    eyre::ensure!(
        !world.stored_task()?.is_dirty(),
        "expected no pending reconfiguration request"
    );
    Ok(())
}

#[then("the batch skipped {count:usize} task")]
fn batch_skipped(world: &ReconfigurationWorld, count: usize) -> Result<(), eyre::Report> {
    let skipped = last_outcome(world)?.counts.skipped;
    eyre::ensure!(skipped == count, "expected {count} skipped, found {skipped}");
    Ok(())
}

#[then("the batch failed {count:usize} task")]
fn batch_failed(world: &ReconfigurationWorld, count: usize) -> Result<(), eyre::Report> {
    let failed = last_outcome(world)?.counts.failed;
    eyre::ensure!(failed == count, "expected {count} failed, found {failed}");
    Ok(())
}

#[then("the failure listing reports the task")]
fn failure_listing_reports_task(world: &ReconfigurationWorld) -> Result<(), eyre::Report> {
    let task = world.stored_task()?;
    let batch = ReconfigurationBatch::from_request(
        TriggerRequest::new("EXECUTE_RECONFIGURE_FAILURES"),
        &world.settings,
    )?;
    let outcome = run_async(world.orchestrator.run(&batch))?;
    eyre::ensure!(
        outcome.failures.iter().any(|failure| failure.task_id == task.id()),
        "task {} missing from failure listing",
        task.id()
    );
    Ok(())
}

#[then("the request is rejected for a missing case filter")]
fn request_rejected_for_missing_case_filter(
    world: &ReconfigurationWorld,
) -> Result<(), eyre::Report> {
    let error = world
        .last_request_error
        .as_ref()
        .ok_or_else(|| eyre::eyre!("expected the request to be rejected"))?;
    eyre::ensure!(
        matches!(error, ReconfigurationRequestError::MissingCaseFilter(_)),
        "expected MissingCaseFilter, got {error:?}"
    );
    Ok(())
}
