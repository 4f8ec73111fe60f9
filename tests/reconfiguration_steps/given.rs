//! Given steps for reconfiguration BDD scenarios.

use super::world::{
    CASE_TYPE, JURISDICTION, ReconfigurationWorld, TASK_TYPE, configuration, run_async,
};
use caseflow::access::domain::{GrantType, RoleAssignment, RoleScope, RoleType};
use caseflow::task::{
    domain::{ActorId, CaseId},
    services::InitiateTaskRequest,
};
use eyre::WrapErr;
use rstest_bdd_macros::given;

#[given(r#"an open task on case "{case_id}""#)]
fn open_task(world: &mut ReconfigurationWorld, case_id: String) -> Result<(), eyre::Report> {
    let task = run_async(world.lifecycle.initiate(InitiateTaskRequest::new(
        JURISDICTION,
        CASE_TYPE,
        case_id.as_str(),
        TASK_TYPE,
        "Review the appeal",
    )))
    .wrap_err("initiate scenario task")?;
    world.case_id = Some(case_id);
    world.task = Some(task);
    Ok(())
}

#[given(r#"the rule tables now title tasks "{title}""#)]
fn rules_retitle_tasks(world: &mut ReconfigurationWorld, title: String) {
    world
        .rules
        .set_configuration(JURISDICTION, CASE_TYPE, TASK_TYPE, configuration(&title));
}

#[given("the task has been cancelled")]
fn task_cancelled(world: &mut ReconfigurationWorld) -> Result<(), eyre::Report> {
    let manager = ActorId::new("morgan")?;
    world.role_assignments.grant(RoleAssignment::new(
        manager.clone(),
        "case-manager",
        GrantType::Standard,
        RoleType::Organisation,
        RoleScope::for_case_type(JURISDICTION, CASE_TYPE),
    )?)?;
    let task = world
        .task
        .as_ref()
        .ok_or_else(|| eyre::eyre!("missing task in scenario world"))?;
    let cancelled = run_async(world.lifecycle.cancel(task.id(), &manager))
        .wrap_err("cancel scenario task")?;
    world.task = Some(cancelled);
    Ok(())
}

#[given(r#"the "{operation}" batch has run for the case"#)]
fn batch_has_run(world: &mut ReconfigurationWorld, operation: String) -> Result<(), eyre::Report> {
    let request = world.request_for_case(&operation)?;
    world.run_batch(request).wrap_err("run setup batch")?;
    Ok(())
}

#[given("rule evaluation fails for the case")]
fn rule_evaluation_fails(world: &mut ReconfigurationWorld) -> Result<(), eyre::Report> {
    world.rules.fail_for_case(CaseId::new(world.case_id()?)?);
    Ok(())
}
