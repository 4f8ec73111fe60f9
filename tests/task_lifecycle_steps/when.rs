//! When steps for task lifecycle BDD scenarios.

use super::world::{LifecycleWorld, run_async};
use caseflow::task::domain::ActorId;
use rstest_bdd_macros::when;

#[when(r#""{actor}" claims the task"#)]
fn claims(world: &mut LifecycleWorld, actor: String) -> Result<(), eyre::Report> {
    let result = run_async(world.service.claim(world.task_id()?, &ActorId::new(actor)?));
    world.last_result = Some(result);
    Ok(())
}

#[when(r#""{actor}" completes the task"#)]
fn completes(world: &mut LifecycleWorld, actor: String) -> Result<(), eyre::Report> {
    let result = run_async(
        world
            .service
            .complete(world.task_id()?, &ActorId::new(actor)?),
    );
    world.last_result = Some(result);
    Ok(())
}
