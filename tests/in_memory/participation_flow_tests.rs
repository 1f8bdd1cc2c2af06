//! In-memory integration tests for joining and leaving tasks.

use super::helpers::{TestService, organizer, post_task, service, volunteer};
use rstest::rstest;
use samaritan::error::FailureKind;
use samaritan::task::{
    domain::{ParticipationStatus, TaskId},
    services::{JoinTaskRequest, TransitionTaskRequest},
};

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn freed_slot_can_be_taken_by_rejected_volunteer(
    service: TestService,
) -> Result<(), eyre::Report> {
    let task = post_task(&service, &organizer("org-1"), 2).await?;
    let coordinator = service.participation();
    let (a, b, c) = (volunteer("vol-a"), volunteer("vol-b"), volunteer("vol-c"));

    coordinator.join(&a, JoinTaskRequest::new(task.id())).await?;
    eyre::ensure!(coordinator.participant_count(task.id()).await? == 1, "count after A");
    coordinator.join(&b, JoinTaskRequest::new(task.id())).await?;
    eyre::ensure!(coordinator.participant_count(task.id()).await? == 2, "count after B");

    let rejected = coordinator.join(&c, JoinTaskRequest::new(task.id())).await;
    eyre::ensure!(
        rejected.as_ref().map_err(|err| err.kind()).err() == Some(FailureKind::TaskFull),
        "expected TaskFull for C, got {rejected:?}"
    );

    coordinator.leave(&a, task.id()).await?;
    eyre::ensure!(coordinator.participant_count(task.id()).await? == 1, "count after A left");

    coordinator.join(&c, JoinTaskRequest::new(task.id())).await?;
    eyre::ensure!(coordinator.participant_count(task.id()).await? == 2, "count after C");
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn second_join_while_active_is_rejected(service: TestService) -> Result<(), eyre::Report> {
    let task = post_task(&service, &organizer("org-1"), 5).await?;
    let coordinator = service.participation();
    let participant = volunteer("vol-1");

    coordinator
        .join(&participant, JoinTaskRequest::new(task.id()))
        .await?;
    let err = coordinator
        .join(&participant, JoinTaskRequest::new(task.id()))
        .await
        .expect_err("duplicate active join must fail");

    assert_eq!(err.kind(), FailureKind::AlreadyParticipating);
    assert_eq!(coordinator.participant_count(task.id()).await?, 1);
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn rejoin_after_leave_keeps_history(service: TestService) -> Result<(), eyre::Report> {
    let task = post_task(&service, &organizer("org-1"), 5).await?;
    let coordinator = service.participation();
    let participant = volunteer("vol-1");

    let first = coordinator
        .join(&participant, JoinTaskRequest::new(task.id()))
        .await?;
    let left = coordinator.leave(&participant, task.id()).await?;
    let second = coordinator
        .join(&participant, JoinTaskRequest::new(task.id()).with_note("Back again"))
        .await?;

    assert_eq!(left.id(), first.id());
    assert_eq!(left.status(), ParticipationStatus::Left);
    assert!(left.left_at().is_some());
    assert_ne!(second.id(), first.id());

    let history = coordinator.participations_for_task(task.id()).await?;
    let statuses: Vec<_> = history.iter().map(|p| p.status()).collect();
    assert_eq!(
        statuses,
        vec![ParticipationStatus::Left, ParticipationStatus::Active]
    );
    assert_eq!(
        coordinator
            .participations_for_participant(participant.id())
            .await?
            .len(),
        2
    );
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn leaving_without_joining_is_participation_not_found(
    service: TestService,
) -> Result<(), eyre::Report> {
    let task = post_task(&service, &organizer("org-1"), 2).await?;

    let err = service
        .participation()
        .leave(&volunteer("vol-1"), task.id())
        .await
        .expect_err("leave without join must fail");

    assert_eq!(err.kind(), FailureKind::ParticipationNotFound);
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn unknown_task_is_not_found_for_every_operation(service: TestService) {
    let coordinator = service.participation();
    let task_id = TaskId::new();
    let participant = volunteer("vol-1");

    let join = coordinator
        .join(&participant, JoinTaskRequest::new(task_id))
        .await;
    let leave = coordinator.leave(&participant, task_id).await;
    let count = coordinator.participant_count(task_id).await;

    assert_eq!(join.map_err(|e| e.kind()).err(), Some(FailureKind::TaskNotFound));
    assert_eq!(leave.map_err(|e| e.kind()).err(), Some(FailureKind::TaskNotFound));
    assert_eq!(count.map_err(|e| e.kind()).err(), Some(FailureKind::TaskNotFound));
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn volunteer_may_leave_task_in_progress(service: TestService) -> Result<(), eyre::Report> {
    let creator = organizer("org-1");
    let task = post_task(&service, &creator, 2).await?;
    let participant = volunteer("vol-1");
    service
        .participation()
        .join(&participant, JoinTaskRequest::new(task.id()))
        .await?;
    service
        .transition(
            &creator,
            TransitionTaskRequest::new(task.id(), "in_progress"),
        )
        .await?;

    let left = service.participation().leave(&participant, task.id()).await?;

    assert_eq!(left.status(), ParticipationStatus::Left);
    Ok(())
}
