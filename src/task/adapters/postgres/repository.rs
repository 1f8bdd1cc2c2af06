//! `PostgreSQL` store implementation for tasks and participations.
//!
//! Admission, withdrawal and status updates each run in one transaction that
//! locks the task row, so they serialize per task while unrelated tasks
//! proceed in parallel.

use super::{
    models::{NewParticipationRow, NewTaskRow, ParticipationRow, TaskChangeset, TaskRow},
    schema::{participations, tasks},
};
use crate::config::DatabaseConfig;
use crate::identity::domain::PrincipalId;
use crate::task::{
    domain::{
        AdmissionPolicy, MaxParticipants, Participation, ParticipationId, ParticipationNote,
        ParticipationStatus, PersistedParticipationData, PersistedTaskData, RosterSnapshot, Task,
        TaskDetails, TaskDomainError, TaskId, TaskStatus, TaskTitle,
    },
    ports::{ParticipationRepository, TaskRepository, TaskRepositoryError, TaskRepositoryResult},
};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use diesel::pg::PgConnection;
use diesel::prelude::*;
use diesel::r2d2::{ConnectionManager, Pool};
use diesel::result::{DatabaseErrorInformation, DatabaseErrorKind, Error as DieselError};
use std::time::Duration;
use tracing::warn;

/// `PostgreSQL` connection pool type used by task adapters.
pub type TaskPgPool = Pool<ConnectionManager<PgConnection>>;

/// Partial unique index allowing one active participation per participant.
const ACTIVE_PARTICIPATION_INDEX: &str = "idx_participations_active_unique";

const DEFAULT_STATEMENT_TIMEOUT: Duration = Duration::from_secs(5);

/// Builds a connection pool from `config`.
///
/// # Errors
///
/// Returns [`TaskRepositoryError::Persistence`] when the pool cannot open its
/// initial connections.
pub fn build_pool(config: &DatabaseConfig) -> TaskRepositoryResult<TaskPgPool> {
    let manager = ConnectionManager::<PgConnection>::new(config.url.as_str());
    Pool::builder()
        .max_size(config.max_connections)
        .connection_timeout(config.connect_timeout())
        .build(manager)
        .map_err(TaskRepositoryError::persistence)
}

/// `PostgreSQL`-backed store implementing both task ports.
#[derive(Debug, Clone)]
pub struct PostgresTaskStore {
    pool: TaskPgPool,
    statement_timeout: Duration,
}

impl PostgresTaskStore {
    /// Creates a store from a `PostgreSQL` connection pool.
    #[must_use]
    pub const fn new(pool: TaskPgPool) -> Self {
        Self {
            pool,
            statement_timeout: DEFAULT_STATEMENT_TIMEOUT,
        }
    }

    /// Sets the timeout applied to every transactional unit of work.
    #[must_use]
    pub fn with_statement_timeout(mut self, timeout: Duration) -> Self {
        self.statement_timeout = timeout;
        self
    }

    /// Builds a pool from `config` and wraps it in a store.
    ///
    /// # Errors
    ///
    /// Returns [`TaskRepositoryError::Persistence`] when the pool cannot be
    /// built.
    pub fn connect(config: &DatabaseConfig) -> TaskRepositoryResult<Self> {
        let pool = build_pool(config)?;
        Ok(Self::new(pool).with_statement_timeout(config.statement_timeout()))
    }

    async fn run_blocking<F, T>(&self, f: F) -> TaskRepositoryResult<T>
    where
        F: FnOnce(&mut PgConnection) -> TaskRepositoryResult<T> + Send + 'static,
        T: Send + 'static,
    {
        let pool = self.pool.clone();
        tokio::task::spawn_blocking(move || {
            let mut connection = pool.get().map_err(TaskRepositoryError::persistence)?;
            f(&mut connection)
        })
        .await
        .map_err(TaskRepositoryError::persistence)?
    }

    async fn run_in_transaction<F, T>(&self, f: F) -> TaskRepositoryResult<T>
    where
        F: FnOnce(&mut PgConnection) -> TaskRepositoryResult<T> + Send + 'static,
        T: Send + 'static,
    {
        let timeout_ms = self.statement_timeout.as_millis();
        self.run_blocking(move |connection| {
            connection.transaction::<_, TaskRepositoryError, _>(|tx| {
                // SET does not accept bind parameters; the value is an integer.
                diesel::sql_query(format!("SET LOCAL statement_timeout = {timeout_ms}"))
                    .execute(tx)?;
                f(tx)
            })
        })
        .await
    }
}

impl From<DieselError> for TaskRepositoryError {
    fn from(err: DieselError) -> Self {
        Self::persistence(err)
    }
}

#[async_trait]
impl TaskRepository for PostgresTaskStore {
    async fn store(&self, task: &Task) -> TaskRepositoryResult<()> {
        let task_id = task.id();
        let new_row = to_new_task_row(task)?;

        self.run_blocking(move |connection| {
            diesel::insert_into(tasks::table)
                .values(&new_row)
                .execute(connection)
                .map_err(|err| match err {
                    DieselError::DatabaseError(DatabaseErrorKind::UniqueViolation, _) => {
                        TaskRepositoryError::DuplicateTask(task_id)
                    }
                    _ => TaskRepositoryError::persistence(err),
                })?;
            Ok(())
        })
        .await
    }

    async fn update(&self, task: &Task, expected_revision: u64) -> TaskRepositoryResult<()> {
        let task_id = task.id();
        let changeset = to_changeset(task)?;
        let expected = to_persisted_revision(expected_revision)?;

        self.run_in_transaction(move |tx| {
            let updated = diesel::update(
                tasks::table
                    .filter(tasks::id.eq(task_id.into_inner()))
                    .filter(tasks::revision.eq(expected)),
            )
            .set(&changeset)
            .execute(tx)?;
            if updated == 1 {
                return Ok(());
            }

            let current = tasks::table
                .filter(tasks::id.eq(task_id.into_inner()))
                .select(tasks::revision)
                .first::<i64>(tx)
                .optional()?;
            match current {
                None => Err(TaskRepositoryError::NotFound(task_id)),
                Some(raw) => Err(TaskRepositoryError::StaleRevision {
                    task_id,
                    expected: expected_revision,
                    actual: from_persisted_revision(raw)?,
                }),
            }
        })
        .await
    }

    async fn find_by_id(&self, id: TaskId) -> TaskRepositoryResult<Option<Task>> {
        self.run_blocking(move |connection| {
            let row = tasks::table
                .filter(tasks::id.eq(id.into_inner()))
                .select(TaskRow::as_select())
                .first::<TaskRow>(connection)
                .optional()?;
            row.map(row_to_task).transpose()
        })
        .await
    }

    async fn list_by_creator(&self, creator: &PrincipalId) -> TaskRepositoryResult<Vec<Task>> {
        let creator_id = creator.as_str().to_owned();
        self.run_blocking(move |connection| {
            let rows = tasks::table
                .filter(tasks::creator_id.eq(creator_id))
                .order((tasks::scheduled_at.asc(), tasks::created_at.asc()))
                .select(TaskRow::as_select())
                .load::<TaskRow>(connection)?;
            rows.into_iter().map(row_to_task).collect()
        })
        .await
    }

    async fn list_by_status(&self, status: TaskStatus) -> TaskRepositoryResult<Vec<Task>> {
        self.run_blocking(move |connection| {
            let rows = tasks::table
                .filter(tasks::status.eq(status.as_str()))
                .order((tasks::scheduled_at.asc(), tasks::created_at.asc()))
                .select(TaskRow::as_select())
                .load::<TaskRow>(connection)?;
            rows.into_iter().map(row_to_task).collect()
        })
        .await
    }
}

#[async_trait]
impl ParticipationRepository for PostgresTaskStore {
    async fn admit(&self, participation: &Participation) -> TaskRepositoryResult<()> {
        let task_id = participation.task_id();
        let participation_id = participation.id();
        let participant = participation.participant().clone();
        let new_row = to_new_participation_row(participation);

        self.run_in_transaction(move |tx| {
            let task = lock_task(tx, task_id)?;
            let roster = load_roster(tx, task_id, &participant)?;
            AdmissionPolicy::evaluate_join(&task, &participant, roster)
                .map_err(TaskRepositoryError::Rejected)?;

            diesel::insert_into(participations::table)
                .values(&new_row)
                .execute(tx)
                .map_err(|err| match err {
                    DieselError::DatabaseError(DatabaseErrorKind::UniqueViolation, ref info)
                        if is_active_participation_violation(info.as_ref()) =>
                    {
                        warn!(
                            %task_id,
                            %participant,
                            "active participation index rejected insert after admission check"
                        );
                        TaskRepositoryError::Rejected(TaskDomainError::AlreadyParticipating {
                            task_id,
                            participant: participant.clone(),
                        })
                    }
                    DieselError::DatabaseError(DatabaseErrorKind::UniqueViolation, _) => {
                        TaskRepositoryError::DuplicateParticipation(participation_id)
                    }
                    _ => TaskRepositoryError::persistence(err),
                })?;
            Ok(())
        })
        .await
    }

    async fn withdraw(
        &self,
        task_id: TaskId,
        participant: &PrincipalId,
        left_at: DateTime<Utc>,
    ) -> TaskRepositoryResult<Participation> {
        let participant = participant.clone();

        self.run_in_transaction(move |tx| {
            let task = lock_task(tx, task_id)?;
            let roster = load_roster(tx, task_id, &participant)?;
            AdmissionPolicy::evaluate_leave(&task, &participant, roster)
                .map_err(TaskRepositoryError::Rejected)?;

            let row = participations::table
                .filter(participations::task_id.eq(task_id.into_inner()))
                .filter(participations::participant_id.eq(participant.as_str()))
                .filter(participations::status.eq(ParticipationStatus::Active.as_str()))
                .select(ParticipationRow::as_select())
                .for_update()
                .first::<ParticipationRow>(tx)?;
            let mut participation = row_to_participation(row)?;
            participation
                .mark_left(left_at)
                .map_err(TaskRepositoryError::Rejected)?;

            diesel::update(
                participations::table
                    .filter(participations::id.eq(participation.id().into_inner())),
            )
            .set((
                participations::status.eq(participation.status().as_str()),
                participations::left_at.eq(participation.left_at()),
            ))
            .execute(tx)?;
            Ok(participation)
        })
        .await
    }

    async fn count_active(&self, task_id: TaskId) -> TaskRepositoryResult<u32> {
        self.run_blocking(move |connection| {
            let count: i64 = participations::table
                .filter(participations::task_id.eq(task_id.into_inner()))
                .filter(participations::status.eq(ParticipationStatus::Active.as_str()))
                .count()
                .get_result(connection)?;
            u32::try_from(count).map_err(TaskRepositoryError::invalid_persisted_data)
        })
        .await
    }

    async fn find_active(
        &self,
        task_id: TaskId,
        participant: &PrincipalId,
    ) -> TaskRepositoryResult<Option<Participation>> {
        let participant_id = participant.as_str().to_owned();
        self.run_blocking(move |connection| {
            let row = participations::table
                .filter(participations::task_id.eq(task_id.into_inner()))
                .filter(participations::participant_id.eq(participant_id))
                .filter(participations::status.eq(ParticipationStatus::Active.as_str()))
                .select(ParticipationRow::as_select())
                .first::<ParticipationRow>(connection)
                .optional()?;
            row.map(row_to_participation).transpose()
        })
        .await
    }

    async fn list_by_task(&self, task_id: TaskId) -> TaskRepositoryResult<Vec<Participation>> {
        self.run_blocking(move |connection| {
            let rows = participations::table
                .filter(participations::task_id.eq(task_id.into_inner()))
                .order(participations::joined_at.asc())
                .select(ParticipationRow::as_select())
                .load::<ParticipationRow>(connection)?;
            rows.into_iter().map(row_to_participation).collect()
        })
        .await
    }

    async fn list_by_participant(
        &self,
        participant: &PrincipalId,
    ) -> TaskRepositoryResult<Vec<Participation>> {
        let participant_id = participant.as_str().to_owned();
        self.run_blocking(move |connection| {
            let rows = participations::table
                .filter(participations::participant_id.eq(participant_id))
                .order(participations::joined_at.asc())
                .select(ParticipationRow::as_select())
                .load::<ParticipationRow>(connection)?;
            rows.into_iter().map(row_to_participation).collect()
        })
        .await
    }
}

/// Reads the task with a row lock held until the transaction ends.
fn lock_task(connection: &mut PgConnection, task_id: TaskId) -> TaskRepositoryResult<Task> {
    let row = tasks::table
        .filter(tasks::id.eq(task_id.into_inner()))
        .select(TaskRow::as_select())
        .for_update()
        .first::<TaskRow>(connection)
        .optional()?;
    row.map(row_to_task)
        .transpose()?
        .ok_or(TaskRepositoryError::NotFound(task_id))
}

fn load_roster(
    connection: &mut PgConnection,
    task_id: TaskId,
    participant: &PrincipalId,
) -> TaskRepositoryResult<RosterSnapshot> {
    let active_count: i64 = participations::table
        .filter(participations::task_id.eq(task_id.into_inner()))
        .filter(participations::status.eq(ParticipationStatus::Active.as_str()))
        .count()
        .get_result(connection)?;
    let candidate_active: bool = diesel::select(diesel::dsl::exists(
        participations::table
            .filter(participations::task_id.eq(task_id.into_inner()))
            .filter(participations::participant_id.eq(participant.as_str()))
            .filter(participations::status.eq(ParticipationStatus::Active.as_str())),
    ))
    .get_result(connection)?;

    Ok(RosterSnapshot {
        active_count: u32::try_from(active_count)
            .map_err(TaskRepositoryError::invalid_persisted_data)?,
        candidate_active,
    })
}

fn is_active_participation_violation(info: &dyn DatabaseErrorInformation) -> bool {
    info.constraint_name()
        .is_some_and(|name| name == ACTIVE_PARTICIPATION_INDEX)
}

fn to_new_task_row(task: &Task) -> TaskRepositoryResult<NewTaskRow> {
    let details = task.details();
    Ok(NewTaskRow {
        id: task.id().into_inner(),
        title: details.title().as_str().to_owned(),
        description: details.description().map(str::to_owned),
        location: details.location().map(str::to_owned),
        scheduled_at: task.scheduled_at(),
        max_participants: i32::try_from(task.max_participants().value())
            .map_err(TaskRepositoryError::persistence)?,
        status: task.status().as_str().to_owned(),
        creator_id: task.creator().as_str().to_owned(),
        created_at: task.created_at(),
        updated_at: task.updated_at(),
        revision: to_persisted_revision(task.revision())?,
    })
}

fn to_changeset(task: &Task) -> TaskRepositoryResult<TaskChangeset> {
    let details = task.details();
    Ok(TaskChangeset {
        title: details.title().as_str().to_owned(),
        description: details.description().map(str::to_owned),
        location: details.location().map(str::to_owned),
        scheduled_at: task.scheduled_at(),
        status: task.status().as_str().to_owned(),
        updated_at: task.updated_at(),
        revision: to_persisted_revision(task.revision())?,
    })
}

fn to_persisted_revision(revision: u64) -> TaskRepositoryResult<i64> {
    i64::try_from(revision).map_err(TaskRepositoryError::persistence)
}

fn from_persisted_revision(raw: i64) -> TaskRepositoryResult<u64> {
    u64::try_from(raw).map_err(TaskRepositoryError::invalid_persisted_data)
}

fn row_to_task(row: TaskRow) -> TaskRepositoryResult<Task> {
    let TaskRow {
        id,
        title: raw_title,
        description,
        location,
        scheduled_at,
        max_participants: persisted_limit,
        status: raw_status,
        creator_id,
        created_at,
        updated_at,
        revision,
    } = row;

    let title = TaskTitle::new(raw_title).map_err(TaskRepositoryError::invalid_persisted_data)?;
    let mut details = TaskDetails::new(title);
    if let Some(text) = description {
        details = details.with_description(text);
    }
    if let Some(place) = location {
        details = details
            .with_location(place)
            .map_err(TaskRepositoryError::invalid_persisted_data)?;
    }
    let limit =
        u32::try_from(persisted_limit).map_err(TaskRepositoryError::invalid_persisted_data)?;
    let max_participants =
        MaxParticipants::new(limit).map_err(TaskRepositoryError::invalid_persisted_data)?;
    let creator =
        PrincipalId::new(creator_id).map_err(TaskRepositoryError::invalid_persisted_data)?;

    Ok(Task::from_persisted(PersistedTaskData {
        id: TaskId::from_uuid(id),
        details,
        scheduled_at,
        max_participants,
        status: parse_task_status(&raw_status)?,
        creator,
        created_at,
        updated_at,
        revision: from_persisted_revision(revision)?,
    }))
}

fn parse_task_status(raw: &str) -> TaskRepositoryResult<TaskStatus> {
    TaskStatus::try_from(raw).map_err(TaskRepositoryError::invalid_persisted_data)
}

fn to_new_participation_row(participation: &Participation) -> NewParticipationRow {
    NewParticipationRow {
        id: participation.id().into_inner(),
        task_id: participation.task_id().into_inner(),
        participant_id: participation.participant().as_str().to_owned(),
        status: participation.status().as_str().to_owned(),
        note: participation.note().map(|note| note.as_str().to_owned()),
        joined_at: participation.joined_at(),
        left_at: participation.left_at(),
    }
}

fn row_to_participation(row: ParticipationRow) -> TaskRepositoryResult<Participation> {
    let ParticipationRow {
        id,
        task_id,
        participant_id,
        status: raw_status,
        note: raw_note,
        joined_at,
        left_at,
    } = row;

    let participant =
        PrincipalId::new(participant_id).map_err(TaskRepositoryError::invalid_persisted_data)?;
    let status = ParticipationStatus::try_from(raw_status.as_str())
        .map_err(TaskRepositoryError::invalid_persisted_data)?;
    let note = match raw_note {
        Some(text) => {
            ParticipationNote::new(text).map_err(TaskRepositoryError::invalid_persisted_data)?
        }
        None => None,
    };

    Ok(Participation::from_persisted(PersistedParticipationData {
        id: ParticipationId::from_uuid(id),
        task_id: TaskId::from_uuid(task_id),
        participant,
        status,
        note,
        joined_at,
        left_at,
    }))
}
