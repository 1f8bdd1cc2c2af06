//! In-memory integration tests for task lifecycle rules.

use super::helpers::{TestService, admin, organizer, post_task, service, volunteer};
use rstest::rstest;
use samaritan::error::FailureKind;
use samaritan::task::{
    domain::TaskStatus,
    services::{JoinTaskRequest, TransitionTaskRequest},
};

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn creator_join_and_cancelled_join_are_rejected(
    service: TestService,
) -> Result<(), eyre::Report> {
    let creator = organizer("u1");
    let task = post_task(&service, &creator, 3).await?;
    let coordinator = service.participation();

    let own = coordinator
        .join(&creator, JoinTaskRequest::new(task.id()))
        .await;
    assert_eq!(
        own.map_err(|err| err.kind()).err(),
        Some(FailureKind::CannotParticipateOwnTask)
    );

    let cancelled = service
        .transition(&admin("root"), TransitionTaskRequest::new(task.id(), "CANCELLED"))
        .await?;
    assert_eq!(cancelled.status(), TaskStatus::Cancelled);

    let late = coordinator
        .join(&volunteer("u2"), JoinTaskRequest::new(task.id()))
        .await;
    assert_eq!(
        late.map_err(|err| err.kind()).err(),
        Some(FailureKind::TaskNotOpen)
    );
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn completed_task_keeps_active_participations_untouched(
    service: TestService,
) -> Result<(), eyre::Report> {
    let creator = organizer("org-1");
    let task = post_task(&service, &creator, 3).await?;
    let coordinator = service.participation();
    for id in ["vol-1", "vol-2"] {
        coordinator
            .join(&volunteer(id), JoinTaskRequest::new(task.id()))
            .await?;
    }
    let before = coordinator.participations_for_task(task.id()).await?;

    for target in ["in_progress", "completed"] {
        service
            .transition(&creator, TransitionTaskRequest::new(task.id(), target))
            .await?;
    }

    assert_eq!(coordinator.participations_for_task(task.id()).await?, before);
    assert_eq!(coordinator.participant_count(task.id()).await?, 2);
    assert_eq!(service.available_slots(task.id()).await?, 1);
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn terminal_status_admits_no_further_transition(
    service: TestService,
) -> Result<(), eyre::Report> {
    let creator = organizer("org-1");
    let task = post_task(&service, &creator, 3).await?;
    service
        .transition(&creator, TransitionTaskRequest::new(task.id(), "cancelled"))
        .await?;

    for target in ["open", "in_progress", "completed", "cancelled"] {
        let err = service
            .transition(&creator, TransitionTaskRequest::new(task.id(), target))
            .await
            .expect_err("cancelled task must stay cancelled");
        assert_eq!(err.kind(), FailureKind::InvalidStatusTransition);
    }
    Ok(())
}
