//! When steps for reconfiguration BDD scenarios.

use super::world::ReconfigurationWorld;
use caseflow::reconfiguration::domain::{ReconfigurationBatch, TriggerRequest};
use rstest_bdd_macros::when;

#[when(r#"the "{operation}" batch runs for the case"#)]
fn batch_runs(world: &mut ReconfigurationWorld, operation: String) -> Result<(), eyre::Report> {
    let request = world.request_for_case(&operation)?;
    world.run_batch(request)?;
    Ok(())
}

#[when(r#"a "{operation}" batch is requested without filters"#)]
fn batch_requested_without_filters(world: &mut ReconfigurationWorld, operation: String) {
    let result = ReconfigurationBatch::from_request(TriggerRequest::new(operation), &world.settings);
    world.last_request_error = result.err();
}
