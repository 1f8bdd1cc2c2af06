//! `PostgreSQL` integration tests for task and participation persistence.

use super::helpers::{context, post_task, principal};
use samaritan::error::FailureKind;
use samaritan::identity::domain::Role;
use samaritan::task::{
    domain::{
        Participation, ParticipationStatus, TaskDetails, TaskDomainError, TaskStatus, TaskTitle,
    },
    ports::{ParticipationRepository, TaskRepository, TaskRepositoryError},
    services::{JoinTaskRequest, TransitionTaskRequest},
};
use mockable::DefaultClock;
use rstest::rstest;

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn stored_task_round_trips_with_all_fields() -> Result<(), eyre::Report> {
    let Some(ctx) = context(2).await? else {
        return Ok(());
    };
    let creator = principal("org", Role::Organizer);
    let task = post_task(&ctx.service, &creator, 4).await?;

    let fetched = ctx
        .store
        .find_by_id(task.id())
        .await?
        .ok_or_else(|| eyre::eyre!("stored task missing"))?;
    eyre::ensure!(fetched.id() == task.id(), "id mismatch");
    eyre::ensure!(fetched.details() == task.details(), "details mismatch");
    eyre::ensure!(fetched.max_participants() == task.max_participants(), "limit mismatch");
    eyre::ensure!(fetched.status() == TaskStatus::Open, "status mismatch");
    eyre::ensure!(fetched.creator() == creator.id(), "creator mismatch");

    let listed = ctx.store.list_by_creator(creator.id()).await?;
    eyre::ensure!(listed.len() == 1, "expected one task for creator, found {}", listed.len());
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn storing_same_task_twice_is_duplicate() -> Result<(), eyre::Report> {
    let Some(ctx) = context(2).await? else {
        return Ok(());
    };
    let task = post_task(&ctx.service, &principal("org", Role::Organizer), 2).await?;

    let result = ctx.store.store(&task).await;

    eyre::ensure!(
        matches!(result, Err(TaskRepositoryError::DuplicateTask(id)) if id == task.id()),
        "expected duplicate task error, got {result:?}"
    );
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn stale_copy_cannot_overwrite_committed_revision() -> Result<(), eyre::Report> {
    let Some(ctx) = context(2).await? else {
        return Ok(());
    };
    let creator = principal("org", Role::Organizer);
    let task = post_task(&ctx.service, &creator, 2).await?;
    let mut revised = task.clone();
    let mut started = task.clone();

    revised.revise(
        TaskDetails::new(TaskTitle::new("Sandbag the north bank")?),
        revised.scheduled_at(),
        &DefaultClock,
    )?;
    ctx.store.update(&revised, task.revision()).await?;
    started.transition_to(TaskStatus::InProgress, &DefaultClock)?;
    let result = ctx.store.update(&started, task.revision()).await;

    eyre::ensure!(
        matches!(
            result,
            Err(TaskRepositoryError::StaleRevision { expected, actual, .. })
                if expected == task.revision() && actual == revised.revision()
        ),
        "expected stale revision, got {result:?}"
    );
    let stored = ctx
        .store
        .find_by_id(task.id())
        .await?
        .ok_or_else(|| eyre::eyre!("stored task missing"))?;
    eyre::ensure!(
        stored.details().title().as_str() == "Sandbag the north bank",
        "revision was overwritten"
    );
    eyre::ensure!(stored.status() == TaskStatus::Open, "stale status landed");
    eyre::ensure!(stored.revision() == revised.revision(), "revision not persisted");
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn admit_and_withdraw_follow_admission_rules() -> Result<(), eyre::Report> {
    let Some(ctx) = context(2).await? else {
        return Ok(());
    };
    let creator = principal("org", Role::Organizer);
    let task = post_task(&ctx.service, &creator, 1).await?;
    let first = principal("vol", Role::Volunteer);
    let second = principal("vol", Role::Volunteer);

    let joined = ctx
        .service
        .participation()
        .join(&first, JoinTaskRequest::new(task.id()).with_note("Bringing a drill"))
        .await?;

    let duplicate = Participation::new_active(task.id(), first.id().clone(), None, &DefaultClock);
    let again = ctx.store.admit(&duplicate).await;
    eyre::ensure!(
        matches!(
            again,
            Err(TaskRepositoryError::Rejected(TaskDomainError::AlreadyParticipating { .. }))
        ),
        "expected AlreadyParticipating, got {again:?}"
    );

    let full = ctx
        .service
        .participation()
        .join(&second, JoinTaskRequest::new(task.id()))
        .await;
    eyre::ensure!(
        full.as_ref().map_err(|err| err.kind()).err() == Some(FailureKind::TaskFull),
        "expected TaskFull, got {full:?}"
    );

    let left = ctx.service.participation().leave(&first, task.id()).await?;
    eyre::ensure!(left.id() == joined.id(), "withdrew a different record");
    eyre::ensure!(left.status() == ParticipationStatus::Left, "record not marked left");
    eyre::ensure!(ctx.store.find_active(task.id(), first.id()).await?.is_none(), "still active");

    ctx.service
        .participation()
        .join(&second, JoinTaskRequest::new(task.id()))
        .await?;
    let history = ctx.store.list_by_task(task.id()).await?;
    eyre::ensure!(history.len() == 2, "expected two records, found {}", history.len());
    let note = history
        .first()
        .and_then(|p| p.note().map(|n| n.as_str().to_owned()));
    eyre::ensure!(note.as_deref() == Some("Bringing a drill"), "note lost: {note:?}");
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn cancelled_task_freezes_participations() -> Result<(), eyre::Report> {
    let Some(ctx) = context(2).await? else {
        return Ok(());
    };
    let creator = principal("org", Role::Organizer);
    let task = post_task(&ctx.service, &creator, 3).await?;
    let participant = principal("vol", Role::Volunteer);
    ctx.service
        .participation()
        .join(&participant, JoinTaskRequest::new(task.id()))
        .await?;
    ctx.service
        .transition(&creator, TransitionTaskRequest::new(task.id(), "cancelled"))
        .await?;

    let leave = ctx.service.participation().leave(&participant, task.id()).await;

    eyre::ensure!(
        leave.as_ref().map_err(|err| err.kind()).err() == Some(FailureKind::TaskNotOpen),
        "expected TaskNotOpen, got {leave:?}"
    );
    eyre::ensure!(ctx.store.count_active(task.id()).await? == 1, "frozen count changed");
    Ok(())
}
