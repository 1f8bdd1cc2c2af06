//! When steps for participation BDD scenarios.

use super::world::{ParticipationWorld, run_async};
use rstest_bdd_macros::when;
use samaritan::task::services::{JoinTaskRequest, TransitionTaskRequest};

#[when(r#""{subject}" joins the task"#)]
fn joins_task(world: &mut ParticipationWorld, subject: String) -> Result<(), eyre::Report> {
    let principal = world.principal(&subject)?;
    let task_id = world.task()?.id();
    let result = run_async(
        world
            .service
            .participation()
            .join(&principal, JoinTaskRequest::new(task_id)),
    );
    world.last_outcome = Some(result.map(|_| ()).map_err(|err| err.kind()));
    Ok(())
}

#[when(r#""{subject}" leaves the task"#)]
fn leaves_task(world: &mut ParticipationWorld, subject: String) -> Result<(), eyre::Report> {
    let principal = world.principal(&subject)?;
    let task_id = world.task()?.id();
    let result = run_async(world.service.participation().leave(&principal, task_id));
    world.last_outcome = Some(result.map(|_| ()).map_err(|err| err.kind()));
    Ok(())
}

#[when(r#""{subject}" moves the task to "{status}""#)]
fn moves_task(
    world: &mut ParticipationWorld,
    subject: String,
    status: String,
) -> Result<(), eyre::Report> {
    let principal = world.principal(&subject)?;
    let task_id = world.task()?.id();
    let result = run_async(
        world
            .service
            .transition(&principal, TransitionTaskRequest::new(task_id, status)),
    );
    world.last_outcome = Some(match result {
        Ok(updated) => {
            world.task = Some(updated);
            Ok(())
        }
        Err(err) => Err(err.kind()),
    });
    Ok(())
}
