//! Then steps for participation BDD scenarios.

use super::world::{ParticipationWorld, run_async};
use rstest_bdd_macros::then;
use samaritan::task::domain::TaskStatus;

#[then("the last operation succeeds")]
fn last_operation_succeeds(world: &ParticipationWorld) -> Result<(), eyre::Report> {
    match world.last_outcome {
        Some(Ok(())) => Ok(()),
        Some(Err(kind)) => Err(eyre::eyre!("expected success, got {kind}")),
        None => Err(eyre::eyre!("no operation recorded in scenario world")),
    }
}

#[then(r#"the last operation fails with "{kind}""#)]
fn last_operation_fails_with(world: &ParticipationWorld, kind: String) -> Result<(), eyre::Report> {
    match world.last_outcome {
        Some(Err(actual)) if actual.as_str() == kind => Ok(()),
        Some(Err(actual)) => Err(eyre::eyre!("expected {kind}, got {actual}")),
        Some(Ok(())) => Err(eyre::eyre!("expected {kind}, but the operation succeeded")),
        None => Err(eyre::eyre!("no operation recorded in scenario world")),
    }
}

#[then("the task has {count:u32} active participants")]
fn task_has_active_participants(
    world: &ParticipationWorld,
    count: u32,
) -> Result<(), eyre::Report> {
    let task_id = world.task()?.id();
    let actual = run_async(world.service.participation().participant_count(task_id))?;
    eyre::ensure!(actual == count, "expected {count} active participants, found {actual}");
    Ok(())
}

#[then(r#"the task status is "{status}""#)]
fn task_status_is(world: &ParticipationWorld, status: String) -> Result<(), eyre::Report> {
    let expected = TaskStatus::try_from(status.as_str())
        .map_err(|err| eyre::eyre!("invalid expected status in scenario: {err}"))?;
    let task_id = world.task()?.id();
    let stored = run_async(world.service.find_by_id(task_id))?
        .ok_or_else(|| eyre::eyre!("scenario task disappeared"))?;
    eyre::ensure!(
        stored.status() == expected,
        "expected status {expected}, found {}",
        stored.status()
    );
    Ok(())
}
