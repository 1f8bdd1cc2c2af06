//! Concurrency tests for the in-memory store.

use super::helpers::{TestService, organizer, post_task, service, volunteer};
use chrono::{Duration, Utc};
use mockable::DefaultClock;
use rstest::rstest;
use samaritan::error::FailureKind;
use samaritan::task::{
    adapters::memory::InMemoryTaskStore,
    domain::{TaskDetails, TaskStatus, TaskTitle},
    ports::{TaskRepository, TaskRepositoryError},
    services::{
        CreateTaskRequest, JoinTaskRequest, TaskLifecycleService, TransitionTaskRequest,
        UpdateTaskDetailsRequest,
    },
};
use std::sync::Arc;
use tokio::sync::Barrier;

#[rstest]
#[case(1, 8)]
#[case(3, 16)]
#[case(5, 5)]
#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_joins_never_exceed_capacity(
    service: TestService,
    #[case] max_participants: u32,
    #[case] joiners: usize,
) -> Result<(), eyre::Report> {
    let task = post_task(&service, &organizer("org-1"), max_participants).await?;
    let service = Arc::new(service);
    let barrier = Arc::new(Barrier::new(joiners));

    let handles: Vec<_> = (0..joiners)
        .map(|index| {
            let service = Arc::clone(&service);
            let barrier = Arc::clone(&barrier);
            let task_id = task.id();
            tokio::spawn(async move {
                barrier.wait().await;
                service
                    .participation()
                    .join(&volunteer(&format!("vol-{index}")), JoinTaskRequest::new(task_id))
                    .await
                    .map_err(|err| err.kind())
            })
        })
        .collect();

    let mut admitted = 0_usize;
    for handle in handles {
        match handle.await? {
            Ok(_) => admitted += 1,
            Err(kind) => eyre::ensure!(kind == FailureKind::TaskFull, "unexpected {kind}"),
        }
    }

    let expected = joiners.min(usize::try_from(max_participants)?);
    eyre::ensure!(admitted == expected, "admitted {admitted}, expected {expected}");
    let count = service.participation().participant_count(task.id()).await?;
    eyre::ensure!(usize::try_from(count)? == expected, "stored count {count}");
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn racing_transitions_apply_exactly_once(service: TestService) -> Result<(), eyre::Report> {
    let creator = organizer("org-1");
    let task = post_task(&service, &creator, 2).await?;
    let service = Arc::new(service);
    let barrier = Arc::new(Barrier::new(2));

    let handles: Vec<_> = ["in_progress", "cancelled"]
        .into_iter()
        .map(|target| {
            let service = Arc::clone(&service);
            let barrier = Arc::clone(&barrier);
            let creator = creator.clone();
            let task_id = task.id();
            tokio::spawn(async move {
                barrier.wait().await;
                service
                    .transition(&creator, TransitionTaskRequest::new(task_id, target))
                    .await
                    .map(|updated| updated.status())
                    .map_err(|err| err.kind())
            })
        })
        .collect();

    let mut outcomes = Vec::new();
    for handle in handles {
        outcomes.push(handle.await?);
    }

    // Either both succeed in sequence (open -> in_progress -> cancelled) or
    // the loser observes the winner's status.
    let stored = service
        .find_by_id(task.id())
        .await?
        .ok_or_else(|| eyre::eyre!("task disappeared"))?;
    for outcome in &outcomes {
        match outcome {
            Ok(status) => eyre::ensure!(
                matches!(status, TaskStatus::InProgress | TaskStatus::Cancelled),
                "unexpected status {status}"
            ),
            Err(kind) => eyre::ensure!(
                matches!(
                    kind,
                    FailureKind::ConcurrentUpdate | FailureKind::InvalidStatusTransition
                ),
                "unexpected failure {kind}"
            ),
        }
    }
    eyre::ensure!(
        outcomes.iter().any(Result::is_ok),
        "at least one transition must win"
    );
    eyre::ensure!(
        stored.status() != TaskStatus::Open,
        "task must have left the open status"
    );
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn stale_copy_cannot_overwrite_committed_revision() -> Result<(), eyre::Report> {
    let store = Arc::new(InMemoryTaskStore::new());
    let service = TaskLifecycleService::new(Arc::clone(&store), Arc::new(DefaultClock));
    let creator = organizer("org-1");
    let task = service
        .create_task(
            &creator,
            CreateTaskRequest::new("Sandbag the riverbank", Utc::now() + Duration::days(1), 4),
        )
        .await?;
    let mut revised = store
        .find_by_id(task.id())
        .await?
        .ok_or_else(|| eyre::eyre!("task disappeared"))?;
    let mut started = revised.clone();

    revised.revise(
        TaskDetails::new(TaskTitle::new("Sandbag the north bank")?),
        revised.scheduled_at(),
        &DefaultClock,
    )?;
    store.update(&revised, task.revision()).await?;
    started.transition_to(TaskStatus::InProgress, &DefaultClock)?;
    let result = store.update(&started, task.revision()).await;

    assert!(matches!(
        &result,
        Err(TaskRepositoryError::StaleRevision { expected, actual, .. })
            if *expected == task.revision() && *actual == revised.revision()
    ));
    assert_eq!(
        result.map_err(|err| err.kind()).err(),
        Some(FailureKind::ConcurrentUpdate)
    );
    let stored = store
        .find_by_id(task.id())
        .await?
        .ok_or_else(|| eyre::eyre!("task disappeared"))?;
    assert_eq!(stored.details().title().as_str(), "Sandbag the north bank");
    assert_eq!(stored.status(), TaskStatus::Open);
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn racing_revision_and_start_keep_every_committed_change(
    service: TestService,
) -> Result<(), eyre::Report> {
    let creator = organizer("org-1");
    let task = post_task(&service, &creator, 4).await?;
    let task_id = task.id();
    let scheduled_at = task.scheduled_at();
    let barrier = Arc::new(Barrier::new(2));

    let revise = {
        let service = service.clone();
        let barrier = Arc::clone(&barrier);
        let creator = creator.clone();
        tokio::spawn(async move {
            barrier.wait().await;
            service
                .update_details(
                    &creator,
                    UpdateTaskDetailsRequest::new(task_id, "Bring extra crates", scheduled_at),
                )
                .await
                .map(|_| ())
                .map_err(|err| err.kind())
        })
    };
    let start = {
        let service = service.clone();
        let barrier = Arc::clone(&barrier);
        let creator = creator.clone();
        tokio::spawn(async move {
            barrier.wait().await;
            service
                .transition(&creator, TransitionTaskRequest::new(task_id, "in_progress"))
                .await
                .map(|_| ())
                .map_err(|err| err.kind())
        })
    };
    let revised = revise.await?;
    let started = start.await?;

    let stored = service
        .find_by_id(task.id())
        .await?
        .ok_or_else(|| eyre::eyre!("task disappeared"))?;
    match revised {
        Ok(()) => assert_eq!(stored.details().title().as_str(), "Bring extra crates"),
        Err(kind) => assert!(matches!(
            kind,
            FailureKind::TaskNotOpen | FailureKind::ConcurrentUpdate
        )),
    }
    match started {
        Ok(()) => assert_eq!(stored.status(), TaskStatus::InProgress),
        Err(kind) => assert_eq!(kind, FailureKind::ConcurrentUpdate),
    }
    Ok(())
}
