//! `PostgreSQL` concurrency tests for admission and status changes.

use super::helpers::{context, post_task, principal};
use rstest::rstest;
use samaritan::error::FailureKind;
use samaritan::identity::domain::Role;
use samaritan::task::{
    ports::ParticipationRepository,
    services::{JoinTaskRequest, TransitionTaskRequest},
};
use std::sync::Arc;
use tokio::sync::Barrier;

#[rstest]
#[case(1, 10)]
#[case(4, 20)]
#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_joins_across_connections_respect_capacity(
    #[case] max_participants: u32,
    #[case] joiners: usize,
) -> Result<(), eyre::Report> {
    let Some(ctx) = context(8).await? else {
        return Ok(());
    };
    let task = post_task(&ctx.service, &principal("org", Role::Organizer), max_participants).await?;
    let service = Arc::new(ctx.service);
    let barrier = Arc::new(Barrier::new(joiners));

    let handles: Vec<_> = (0..joiners)
        .map(|_| {
            let service = Arc::clone(&service);
            let barrier = Arc::clone(&barrier);
            let task_id = task.id();
            let joiner = principal("vol", Role::Volunteer);
            tokio::spawn(async move {
                barrier.wait().await;
                service
                    .participation()
                    .join(&joiner, JoinTaskRequest::new(task_id))
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

    let expected = usize::try_from(max_participants)?;
    eyre::ensure!(admitted == expected, "admitted {admitted}, expected {expected}");
    let stored = ctx.store.count_active(task.id()).await?;
    eyre::ensure!(usize::try_from(stored)? == expected, "stored active count {stored}");
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn joins_racing_cancellation_never_land_after_it() -> Result<(), eyre::Report> {
    let Some(ctx) = context(8).await? else {
        return Ok(());
    };
    let creator = principal("org", Role::Organizer);
    let task = post_task(&ctx.service, &creator, 50).await?;
    let service = Arc::new(ctx.service);
    let barrier = Arc::new(Barrier::new(9));

    let mut joins = Vec::new();
    for _ in 0..8 {
        let service = Arc::clone(&service);
        let barrier = Arc::clone(&barrier);
        let task_id = task.id();
        let joiner = principal("vol", Role::Volunteer);
        joins.push(tokio::spawn(async move {
            barrier.wait().await;
            service
                .participation()
                .join(&joiner, JoinTaskRequest::new(task_id))
                .await
                .map(|participation| participation.joined_at())
                .map_err(|err| err.kind())
        }));
    }
    let cancel = {
        let service = Arc::clone(&service);
        let barrier = Arc::clone(&barrier);
        let task_id = task.id();
        tokio::spawn(async move {
            barrier.wait().await;
            service
                .transition(&creator, TransitionTaskRequest::new(task_id, "cancelled"))
                .await
        })
    };

    let cancelled = cancel.await??;
    let mut admitted = 0_u32;
    for join in joins {
        match join.await? {
            Ok(_) => admitted += 1,
            Err(kind) => eyre::ensure!(kind == FailureKind::TaskNotOpen, "unexpected {kind}"),
        }
    }

    let frozen = ctx.store.count_active(task.id()).await?;
    eyre::ensure!(frozen == admitted, "stored {frozen} active, {admitted} joins reported success");
    eyre::ensure!(cancelled.status().is_terminal(), "task not cancelled");
    Ok(())
}
