//! Given steps for participation BDD scenarios.

use super::world::{ParticipationWorld, run_async};
use chrono::{Duration, Utc};
use eyre::WrapErr;
use rstest_bdd_macros::given;
use samaritan::task::services::CreateTaskRequest;

#[given(r#"the token of "{subject}" carries roles "{roles}""#)]
fn token_with_roles(
    world: &mut ParticipationWorld,
    subject: String,
    roles: String,
) -> Result<(), eyre::Report> {
    let names: Vec<&str> = roles.split(',').map(str::trim).collect();
    world
        .register(&subject, &names)
        .wrap_err("resolve principal from token claims")
}

#[given(r#""{subject}" posts an open task with room for {max:u32} participants"#)]
fn posts_open_task(
    world: &mut ParticipationWorld,
    subject: String,
    max: u32,
) -> Result<(), eyre::Report> {
    let creator = world.principal(&subject)?;
    let request = CreateTaskRequest::new(
        "Hand out blankets at the shelter",
        Utc::now() + Duration::days(1),
        max,
    );
    let task = run_async(world.service.create_task(&creator, request))
        .wrap_err("post scenario task")?;
    world.task = Some(task);
    Ok(())
}
