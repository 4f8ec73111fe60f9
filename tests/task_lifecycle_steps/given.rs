//! Given steps for task lifecycle BDD scenarios.

use super::world::{CASE_TYPE, JURISDICTION, LifecycleWorld, TASK_TYPE, run_async};
use caseflow::access::domain::{GrantType, RoleAssignment, RoleScope, RoleType};
use caseflow::task::{domain::ActorId, services::InitiateTaskRequest};
use eyre::WrapErr;
use rstest_bdd_macros::given;

#[given(r#"caseworkers "{first}" and "{second}" on the case type"#)]
fn caseworkers(
    world: &mut LifecycleWorld,
    first: String,
    second: String,
) -> Result<(), eyre::Report> {
    for name in [first, second] {
        world.role_assignments.grant(RoleAssignment::new(
            ActorId::new(name)?,
            "tribunal-caseworker",
            GrantType::Standard,
            RoleType::Organisation,
            RoleScope::for_case_type(JURISDICTION, CASE_TYPE),
        )?)?;
    }
    Ok(())
}

#[given(r#"an unassigned task on case "{case_id}""#)]
fn unassigned_task(world: &mut LifecycleWorld, case_id: String) -> Result<(), eyre::Report> {
    let task = run_async(world.service.initiate(InitiateTaskRequest::new(
        JURISDICTION,
        CASE_TYPE,
        case_id,
        TASK_TYPE,
        "Review the appeal",
    )))
    .wrap_err("initiate scenario task")?;
    world.task = Some(task);
    Ok(())
}

#[given(r#""{actor}" has claimed the task"#)]
fn has_claimed(world: &mut LifecycleWorld, actor: String) -> Result<(), eyre::Report> {
    let claimed = run_async(world.service.claim(world.task_id()?, &ActorId::new(actor)?))
        .wrap_err("claim task in scenario setup")?;
    world.task = Some(claimed);
    Ok(())
}
