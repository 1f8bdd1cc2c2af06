//! Service layer for joining and leaving tasks.

use crate::error::FailureKind;
use crate::identity::domain::{Principal, PrincipalId};
use crate::task::{
    domain::{Capacity, Participation, ParticipationNote, Task, TaskDomainError, TaskId},
    ports::{TaskRepositoryError, TaskStore},
};
use mockable::Clock;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info, instrument};

/// Request payload for joining a task.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JoinTaskRequest {
    task_id: TaskId,
    note: Option<String>,
}

impl JoinTaskRequest {
    /// Creates a join request without a note.
    #[must_use]
    pub const fn new(task_id: TaskId) -> Self {
        Self {
            task_id,
            note: None,
        }
    }

    /// Attaches a note for the task creator.
    #[must_use]
    pub fn with_note(mut self, note: impl Into<String>) -> Self {
        self.note = Some(note.into());
        self
    }

    /// Returns the targeted task.
    #[must_use]
    pub const fn task_id(&self) -> TaskId {
        self.task_id
    }
}

/// Service-level errors for participation operations.
#[derive(Debug, Error)]
pub enum ParticipationError {
    /// A participation rule rejected the request.
    #[error(transparent)]
    Domain(#[from] TaskDomainError),
    /// The task does not exist.
    #[error("task not found: {0}")]
    TaskNotFound(TaskId),
    /// Repository operation failed.
    #[error(transparent)]
    Repository(TaskRepositoryError),
}

impl From<TaskRepositoryError> for ParticipationError {
    fn from(err: TaskRepositoryError) -> Self {
        match err {
            TaskRepositoryError::Rejected(domain) => Self::Domain(domain),
            TaskRepositoryError::NotFound(task_id) => Self::TaskNotFound(task_id),
            other => Self::Repository(other),
        }
    }
}

impl ParticipationError {
    /// Returns the failure kind reported to callers.
    #[must_use]
    pub const fn kind(&self) -> FailureKind {
        match self {
            Self::Domain(err) => err.kind(),
            Self::TaskNotFound(_) => FailureKind::TaskNotFound,
            Self::Repository(err) => err.kind(),
        }
    }
}

/// Result type for participation service operations.
pub type ParticipationResult<T> = Result<T, ParticipationError>;

/// Coordinates joins, leaves and participation reads.
///
/// Admission rules are evaluated by the store inside its unit of work; the
/// coordinator never pre-checks capacity itself.
pub struct ParticipationCoordinator<R, C>
where
    R: TaskStore,
    C: Clock + Send + Sync,
{
    repository: Arc<R>,
    clock: Arc<C>,
}

impl<R, C> Clone for ParticipationCoordinator<R, C>
where
    R: TaskStore,
    C: Clock + Send + Sync,
{
    fn clone(&self) -> Self {
        Self {
            repository: Arc::clone(&self.repository),
            clock: Arc::clone(&self.clock),
        }
    }
}

impl<R, C> ParticipationCoordinator<R, C>
where
    R: TaskStore,
    C: Clock + Send + Sync,
{
    /// Creates a new participation coordinator.
    #[must_use]
    pub const fn new(repository: Arc<R>, clock: Arc<C>) -> Self {
        Self { repository, clock }
    }

    /// Joins `principal` to the requested task.
    ///
    /// An unknown task is reported before an invalid note.
    ///
    /// # Errors
    ///
    /// Returns [`ParticipationError::TaskNotFound`] for unknown tasks, and
    /// [`ParticipationError::Domain`] carrying `TaskNotOpen`,
    /// `AlreadyParticipating`, `CannotParticipateOwnTask` or `TaskFull`, in
    /// that order of precedence, or `NoteTooLong` for an oversized note.
    #[instrument(skip_all, fields(task_id = %request.task_id, principal = %principal.id()))]
    pub async fn join(
        &self,
        principal: &Principal,
        request: JoinTaskRequest,
    ) -> ParticipationResult<Participation> {
        let task_id = request.task_id();
        let note = match request.note.map(ParticipationNote::new).transpose() {
            Ok(note) => note.flatten(),
            Err(err) => {
                self.require_task(task_id).await?;
                return Err(err.into());
            }
        };
        let participation =
            Participation::new_active(task_id, principal.id().clone(), note, &*self.clock);

        match self.repository.admit(&participation).await {
            Ok(()) => {
                info!(participation_id = %participation.id(), "participant joined task");
                Ok(participation)
            }
            Err(err) => {
                debug!(error = %err, "join rejected");
                Err(err.into())
            }
        }
    }

    /// Withdraws the active participation of `principal` on `task_id`.
    ///
    /// Returns the record marked as left.
    ///
    /// # Errors
    ///
    /// Returns [`ParticipationError::TaskNotFound`] for unknown tasks, and
    /// [`ParticipationError::Domain`] carrying `TaskNotOpen` for completed or
    /// cancelled tasks or `ParticipationNotFound` when no active
    /// participation exists.
    #[instrument(skip_all, fields(task_id = %task_id, principal = %principal.id()))]
    pub async fn leave(
        &self,
        principal: &Principal,
        task_id: TaskId,
    ) -> ParticipationResult<Participation> {
        let left_at = self.clock.utc();
        match self
            .repository
            .withdraw(task_id, principal.id(), left_at)
            .await
        {
            Ok(participation) => {
                info!(participation_id = %participation.id(), "participant left task");
                Ok(participation)
            }
            Err(err) => {
                debug!(error = %err, "leave rejected");
                Err(err.into())
            }
        }
    }

    /// Counts active participations on `task_id`.
    ///
    /// # Errors
    ///
    /// Returns [`ParticipationError::TaskNotFound`] for unknown tasks or
    /// [`ParticipationError::Repository`] when persistence fails.
    pub async fn participant_count(&self, task_id: TaskId) -> ParticipationResult<u32> {
        self.require_task(task_id).await?;
        Ok(self.repository.count_active(task_id).await?)
    }

    /// Returns the active participation of `participant` on `task_id`, if
    /// any.
    ///
    /// # Errors
    ///
    /// Returns [`ParticipationError::TaskNotFound`] for unknown tasks or
    /// [`ParticipationError::Repository`] when persistence fails.
    pub async fn active_participation(
        &self,
        task_id: TaskId,
        participant: &PrincipalId,
    ) -> ParticipationResult<Option<Participation>> {
        self.require_task(task_id).await?;
        Ok(self.repository.find_active(task_id, participant).await?)
    }

    /// Returns the capacity of `task` from its current active count.
    ///
    /// # Errors
    ///
    /// Returns [`ParticipationError::Repository`] when persistence fails.
    pub async fn capacity(&self, task: &Task) -> ParticipationResult<Capacity> {
        let active = self.repository.count_active(task.id()).await?;
        Ok(Capacity::new(task.max_participants(), active))
    }

    /// Returns every participation on `task_id`, active and left, ordered by
    /// join time.
    ///
    /// # Errors
    ///
    /// Returns [`ParticipationError::TaskNotFound`] for unknown tasks or
    /// [`ParticipationError::Repository`] when persistence fails.
    pub async fn participations_for_task(
        &self,
        task_id: TaskId,
    ) -> ParticipationResult<Vec<Participation>> {
        self.require_task(task_id).await?;
        Ok(self.repository.list_by_task(task_id).await?)
    }

    /// Returns every participation of `participant`, ordered by join time.
    ///
    /// # Errors
    ///
    /// Returns [`ParticipationError::Repository`] when persistence fails.
    pub async fn participations_for_participant(
        &self,
        participant: &PrincipalId,
    ) -> ParticipationResult<Vec<Participation>> {
        Ok(self.repository.list_by_participant(participant).await?)
    }

    async fn require_task(&self, task_id: TaskId) -> ParticipationResult<Task> {
        self.repository
            .find_by_id(task_id)
            .await?
            .ok_or(ParticipationError::TaskNotFound(task_id))
    }
}
