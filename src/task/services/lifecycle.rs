//! Service layer for task posting, status transitions and task reads.

use super::participation::{ParticipationCoordinator, ParticipationError};
use crate::error::FailureKind;
use crate::identity::domain::{Principal, PrincipalId};
use crate::task::{
    domain::{
        MaxParticipants, NewTask, ParseTaskStatusError, Task, TaskDetails, TaskDomainError, TaskId,
        TaskStatus, TaskTitle,
    },
    ports::{TaskRepositoryError, TaskStore},
};
use chrono::{DateTime, Utc};
use mockable::Clock;
use std::sync::Arc;
use thiserror::Error;
use tracing::{info, instrument, warn};

/// Request payload for posting a task.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateTaskRequest {
    title: String,
    description: Option<String>,
    location: Option<String>,
    scheduled_at: DateTime<Utc>,
    max_participants: u32,
}

impl CreateTaskRequest {
    /// Creates a request with the required fields.
    #[must_use]
    pub fn new(
        title: impl Into<String>,
        scheduled_at: DateTime<Utc>,
        max_participants: u32,
    ) -> Self {
        Self {
            title: title.into(),
            description: None,
            location: None,
            scheduled_at,
            max_participants,
        }
    }

    /// Sets the description.
    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Sets the location.
    #[must_use]
    pub fn with_location(mut self, location: impl Into<String>) -> Self {
        self.location = Some(location.into());
        self
    }
}

/// Request payload for moving a task to another status.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransitionTaskRequest {
    task_id: TaskId,
    target_status: String,
}

impl TransitionTaskRequest {
    /// Creates a transition request. `target_status` is parsed by the
    /// service.
    #[must_use]
    pub fn new(task_id: TaskId, target_status: impl Into<String>) -> Self {
        Self {
            task_id,
            target_status: target_status.into(),
        }
    }
}

/// Request payload for revising an open task.
///
/// Omitted description or location clears the stored value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpdateTaskDetailsRequest {
    task_id: TaskId,
    title: String,
    description: Option<String>,
    location: Option<String>,
    scheduled_at: DateTime<Utc>,
}

impl UpdateTaskDetailsRequest {
    /// Creates a revision request with the required fields.
    #[must_use]
    pub fn new(task_id: TaskId, title: impl Into<String>, scheduled_at: DateTime<Utc>) -> Self {
        Self {
            task_id,
            title: title.into(),
            description: None,
            location: None,
            scheduled_at,
        }
    }

    /// Sets the description.
    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Sets the location.
    #[must_use]
    pub fn with_location(mut self, location: impl Into<String>) -> Self {
        self.location = Some(location.into());
        self
    }
}

/// Task together with its live participation figures.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskOverview {
    /// The task.
    pub task: Task,
    /// Number of active participations.
    pub active_participants: u32,
    /// Free slots, clamped at zero.
    pub available_slots: u32,
    /// Whether the task is still open after its scheduled start.
    pub past_due: bool,
}

/// Service-level errors for task lifecycle operations.
#[derive(Debug, Error)]
pub enum TaskLifecycleError {
    /// Domain validation failed.
    #[error(transparent)]
    Domain(#[from] TaskDomainError),
    /// The requested status name is unknown.
    #[error(transparent)]
    InvalidStatus(#[from] ParseTaskStatusError),
    /// The task does not exist.
    #[error("task not found: {0}")]
    NotFound(TaskId),
    /// The principal may not perform the operation.
    #[error("{principal} is not allowed to {action}")]
    Unauthorized {
        /// Rejected principal.
        principal: PrincipalId,
        /// Attempted operation.
        action: &'static str,
    },
    /// A participation read failed.
    #[error(transparent)]
    Participation(#[from] ParticipationError),
    /// Repository operation failed.
    #[error(transparent)]
    Repository(TaskRepositoryError),
}

impl From<TaskRepositoryError> for TaskLifecycleError {
    fn from(err: TaskRepositoryError) -> Self {
        match err {
            TaskRepositoryError::Rejected(domain) => Self::Domain(domain),
            TaskRepositoryError::NotFound(task_id) => Self::NotFound(task_id),
            other => Self::Repository(other),
        }
    }
}

impl TaskLifecycleError {
    /// Returns the failure kind reported to callers.
    #[must_use]
    pub const fn kind(&self) -> FailureKind {
        match self {
            Self::Domain(err) => err.kind(),
            Self::InvalidStatus(_) => FailureKind::InvalidInput,
            Self::NotFound(_) => FailureKind::TaskNotFound,
            Self::Unauthorized { .. } => FailureKind::UnauthorizedAccess,
            Self::Participation(err) => err.kind(),
            Self::Repository(err) => err.kind(),
        }
    }
}

/// Result type for task lifecycle service operations.
pub type TaskLifecycleResult<T> = Result<T, TaskLifecycleError>;

/// Task lifecycle orchestration service.
pub struct TaskLifecycleService<R, C>
where
    R: TaskStore,
    C: Clock + Send + Sync,
{
    repository: Arc<R>,
    clock: Arc<C>,
    participation: ParticipationCoordinator<R, C>,
}

impl<R, C> Clone for TaskLifecycleService<R, C>
where
    R: TaskStore,
    C: Clock + Send + Sync,
{
    fn clone(&self) -> Self {
        Self {
            repository: Arc::clone(&self.repository),
            clock: Arc::clone(&self.clock),
            participation: self.participation.clone(),
        }
    }
}

impl<R, C> TaskLifecycleService<R, C>
where
    R: TaskStore,
    C: Clock + Send + Sync,
{
    /// Creates a new task lifecycle service.
    #[must_use]
    pub fn new(repository: Arc<R>, clock: Arc<C>) -> Self {
        let participation =
            ParticipationCoordinator::new(Arc::clone(&repository), Arc::clone(&clock));
        Self {
            repository,
            clock,
            participation,
        }
    }

    /// Returns the participation coordinator sharing this service's store.
    #[must_use]
    pub const fn participation(&self) -> &ParticipationCoordinator<R, C> {
        &self.participation
    }

    /// Posts a new `Open` task created by `principal`.
    ///
    /// # Errors
    ///
    /// Returns [`TaskLifecycleError::Unauthorized`] unless the principal is
    /// an organizer, affected person or administrator,
    /// [`TaskLifecycleError::Domain`] when input validation fails, or
    /// [`TaskLifecycleError::Repository`] when persistence fails.
    #[instrument(skip_all, fields(principal = %principal.id()))]
    pub async fn create_task(
        &self,
        principal: &Principal,
        request: CreateTaskRequest,
    ) -> TaskLifecycleResult<Task> {
        if !principal.can_post_tasks() {
            return Err(TaskLifecycleError::Unauthorized {
                principal: principal.id().clone(),
                action: "post tasks",
            });
        }

        let details = build_details(request.title, request.description, request.location)?;
        let max_participants = MaxParticipants::new(request.max_participants)?;
        let task = Task::new(
            NewTask {
                details,
                scheduled_at: request.scheduled_at,
                max_participants,
                creator: principal.id().clone(),
            },
            &*self.clock,
        );
        self.repository.store(&task).await?;
        info!(task_id = %task.id(), "task created");
        Ok(task)
    }

    /// Moves a task to the requested status.
    ///
    /// Cancelling freezes the task's participations as they are; the number
    /// of active participations left frozen is logged.
    ///
    /// # Errors
    ///
    /// Returns [`TaskLifecycleError::InvalidStatus`] for an unknown status
    /// name, [`TaskLifecycleError::NotFound`] for unknown tasks,
    /// [`TaskLifecycleError::Unauthorized`] unless the principal created the
    /// task or is an administrator, [`TaskLifecycleError::Domain`] for an
    /// illegal transition, or [`TaskLifecycleError::Repository`] when the
    /// task was written concurrently or persistence fails.
    #[instrument(skip_all, fields(task_id = %request.task_id, principal = %principal.id()))]
    pub async fn transition(
        &self,
        principal: &Principal,
        request: TransitionTaskRequest,
    ) -> TaskLifecycleResult<Task> {
        let target = TaskStatus::try_from(request.target_status.as_str())?;
        let mut task = self.require_task(request.task_id).await?;
        authorize_management(principal, &task, "change the task status")?;

        let previous = task.status();
        let read_revision = task.revision();
        task.transition_to(target, &*self.clock)?;
        self.repository.update(&task, read_revision).await?;
        info!(from = %previous, to = %target, "task status changed");

        if target == TaskStatus::Cancelled {
            match self.repository.count_active(task.id()).await {
                Ok(frozen) => info!(frozen_participations = frozen, "participations frozen"),
                Err(err) => warn!(error = %err, "could not count frozen participations"),
            }
        }
        Ok(task)
    }

    /// Revises the descriptive fields and scheduled start of an open task.
    ///
    /// The participant limit cannot be revised.
    ///
    /// # Errors
    ///
    /// Returns [`TaskLifecycleError::Domain`] for invalid input or a task
    /// that is no longer `Open`, [`TaskLifecycleError::NotFound`],
    /// [`TaskLifecycleError::Unauthorized`], or
    /// [`TaskLifecycleError::Repository`].
    #[instrument(skip_all, fields(task_id = %request.task_id, principal = %principal.id()))]
    pub async fn update_details(
        &self,
        principal: &Principal,
        request: UpdateTaskDetailsRequest,
    ) -> TaskLifecycleResult<Task> {
        let details = build_details(request.title, request.description, request.location)?;
        let mut task = self.require_task(request.task_id).await?;
        authorize_management(principal, &task, "revise the task")?;

        let read_revision = task.revision();
        task.revise(details, request.scheduled_at, &*self.clock)?;
        self.repository.update(&task, read_revision).await?;
        info!("task details revised");
        Ok(task)
    }

    /// Retrieves a task by identifier.
    ///
    /// Returns `Ok(None)` when the task does not exist.
    ///
    /// # Errors
    ///
    /// Returns [`TaskLifecycleError::Repository`] when persistence lookup
    /// fails.
    pub async fn find_by_id(&self, task_id: TaskId) -> TaskLifecycleResult<Option<Task>> {
        Ok(self.repository.find_by_id(task_id).await?)
    }

    /// Returns a task with its participant count, free slots and past-due
    /// flag.
    ///
    /// # Errors
    ///
    /// Returns [`TaskLifecycleError::NotFound`] for unknown tasks or a
    /// persistence error.
    pub async fn overview(&self, task_id: TaskId) -> TaskLifecycleResult<TaskOverview> {
        let task = self.require_task(task_id).await?;
        let capacity = self.participation.capacity(&task).await?;
        let past_due = task.is_past_due(&*self.clock);
        Ok(TaskOverview {
            task,
            active_participants: capacity.active(),
            available_slots: capacity.available_slots(),
            past_due,
        })
    }

    /// Returns the number of free slots of a task, clamped at zero.
    ///
    /// # Errors
    ///
    /// Returns [`TaskLifecycleError::NotFound`] for unknown tasks or a
    /// persistence error.
    pub async fn available_slots(&self, task_id: TaskId) -> TaskLifecycleResult<u32> {
        let task = self.require_task(task_id).await?;
        let capacity = self.participation.capacity(&task).await?;
        Ok(capacity.available_slots())
    }

    /// Returns every task posted by `creator`, ordered by scheduled start.
    ///
    /// # Errors
    ///
    /// Returns [`TaskLifecycleError::Repository`] when persistence fails.
    pub async fn list_by_creator(&self, creator: &PrincipalId) -> TaskLifecycleResult<Vec<Task>> {
        Ok(self.repository.list_by_creator(creator).await?)
    }

    /// Returns open tasks whose scheduled start has passed.
    ///
    /// Tasks are only reported; their status is left unchanged.
    ///
    /// # Errors
    ///
    /// Returns [`TaskLifecycleError::Repository`] when persistence fails.
    pub async fn list_past_due(&self) -> TaskLifecycleResult<Vec<Task>> {
        let open = self.repository.list_by_status(TaskStatus::Open).await?;
        Ok(open
            .into_iter()
            .filter(|task| task.is_past_due(&*self.clock))
            .collect())
    }

    async fn require_task(&self, task_id: TaskId) -> TaskLifecycleResult<Task> {
        self.repository
            .find_by_id(task_id)
            .await?
            .ok_or(TaskLifecycleError::NotFound(task_id))
    }
}

fn authorize_management(
    principal: &Principal,
    task: &Task,
    action: &'static str,
) -> TaskLifecycleResult<()> {
    if task.is_managed_by(principal) {
        return Ok(());
    }
    warn!(
        task_id = %task.id(),
        principal = %principal.id(),
        action,
        "unauthorized task change"
    );
    Err(TaskLifecycleError::Unauthorized {
        principal: principal.id().clone(),
        action,
    })
}

fn build_details(
    title: String,
    description: Option<String>,
    location: Option<String>,
) -> Result<TaskDetails, TaskDomainError> {
    let mut details = TaskDetails::new(TaskTitle::new(title)?);
    if let Some(text) = description {
        details = details.with_description(text);
    }
    if let Some(place) = location {
        details = details.with_location(place)?;
    }
    Ok(details)
}
