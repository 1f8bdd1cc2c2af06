//! Repository port for task persistence and lookup.

use crate::error::FailureKind;
use crate::identity::domain::PrincipalId;
use crate::task::domain::{ParticipationId, Task, TaskDomainError, TaskId, TaskStatus};
use async_trait::async_trait;
use std::sync::Arc;
use thiserror::Error;

/// Result type for task store operations.
pub type TaskRepositoryResult<T> = Result<T, TaskRepositoryError>;

/// Task persistence contract.
#[async_trait]
pub trait TaskRepository: Send + Sync {
    /// Stores a new task.
    ///
    /// # Errors
    ///
    /// Returns [`TaskRepositoryError::DuplicateTask`] when the task ID already
    /// exists.
    async fn store(&self, task: &Task) -> TaskRepositoryResult<()>;

    /// Persists changes to an existing task if its stored revision still
    /// equals `expected_revision`, the revision the caller read.
    ///
    /// # Errors
    ///
    /// Returns [`TaskRepositoryError::NotFound`] when the task does not exist
    /// and [`TaskRepositoryError::StaleRevision`] when another write has
    /// landed since the task was read.
    async fn update(&self, task: &Task, expected_revision: u64) -> TaskRepositoryResult<()>;

    /// Finds a task by identifier.
    ///
    /// Returns `None` when the task does not exist.
    async fn find_by_id(&self, id: TaskId) -> TaskRepositoryResult<Option<Task>>;

    /// Returns every task posted by `creator`, ordered by scheduled start.
    async fn list_by_creator(&self, creator: &PrincipalId) -> TaskRepositoryResult<Vec<Task>>;

    /// Returns every task with `status`, ordered by scheduled start.
    async fn list_by_status(&self, status: TaskStatus) -> TaskRepositoryResult<Vec<Task>>;
}

/// Errors returned by task store implementations.
#[derive(Debug, Clone, Error)]
pub enum TaskRepositoryError {
    /// A task with the same identifier already exists.
    #[error("duplicate task identifier: {0}")]
    DuplicateTask(TaskId),

    /// A participation with the same identifier already exists.
    #[error("duplicate participation identifier: {0}")]
    DuplicateParticipation(ParticipationId),

    /// The task was not found.
    #[error("task not found: {0}")]
    NotFound(TaskId),

    /// A domain rule rejected the change inside the unit of work.
    #[error(transparent)]
    Rejected(TaskDomainError),

    /// The task was written concurrently after the caller read it.
    #[error("task {task_id} changed concurrently: expected revision {expected}, found {actual}")]
    StaleRevision {
        /// Task identifier.
        task_id: TaskId,
        /// Revision the caller read.
        expected: u64,
        /// Revision currently stored.
        actual: u64,
    },

    /// Persisted data could not be reconstructed into domain types.
    #[error("invalid persisted data: {0}")]
    InvalidPersistedData(Arc<dyn std::error::Error + Send + Sync>),

    /// Persistence-layer failure.
    #[error("persistence error: {0}")]
    Persistence(Arc<dyn std::error::Error + Send + Sync>),
}

impl TaskRepositoryError {
    /// Wraps a data-quality or deserialization error from persisted rows.
    pub fn invalid_persisted_data(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::InvalidPersistedData(Arc::new(err))
    }

    /// Wraps a persistence error.
    pub fn persistence(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::Persistence(Arc::new(err))
    }

    /// Returns the failure kind reported to callers.
    #[must_use]
    pub const fn kind(&self) -> FailureKind {
        match self {
            Self::NotFound(_) => FailureKind::TaskNotFound,
            Self::Rejected(err) => err.kind(),
            Self::StaleRevision { .. } => FailureKind::ConcurrentUpdate,
            Self::DuplicateTask(_)
            | Self::DuplicateParticipation(_)
            | Self::InvalidPersistedData(_)
            | Self::Persistence(_) => FailureKind::Persistence,
        }
    }
}
