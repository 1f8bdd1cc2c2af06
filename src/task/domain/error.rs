//! Error types for task domain validation, lifecycle rules and parsing.

use super::{TaskId, TaskStatus};
use crate::error::FailureKind;
use crate::identity::domain::PrincipalId;
use thiserror::Error;

/// Errors returned by task and participation domain rules.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum TaskDomainError {
    /// The task title is empty after trimming.
    #[error("task title must not be empty")]
    EmptyTitle,

    /// The task title exceeds the storage limit.
    #[error("task title exceeds {max} characters (got {actual})")]
    TitleTooLong {
        /// Maximum accepted length in characters.
        max: usize,
        /// Length of the rejected title.
        actual: usize,
    },

    /// The task location exceeds the storage limit.
    #[error("task location exceeds {max} characters (got {actual})")]
    LocationTooLong {
        /// Maximum accepted length in characters.
        max: usize,
        /// Length of the rejected location.
        actual: usize,
    },

    /// The participant limit is zero or too large to persist.
    #[error("invalid max participant count {0}, expected 1..=2147483647")]
    InvalidMaxParticipants(u32),

    /// A stored participation note is blank.
    #[error("participation note must not be blank")]
    EmptyNote,

    /// The participation note exceeds the storage limit.
    #[error("participation note exceeds {max} characters (got {actual})")]
    NoteTooLong {
        /// Maximum accepted length in characters.
        max: usize,
        /// Length of the rejected note.
        actual: usize,
    },

    /// The requested status transition is not permitted.
    #[error("invalid status transition for task {task_id}: {from} -> {to}")]
    InvalidStatusTransition {
        /// Task identifier.
        task_id: TaskId,
        /// Current status.
        from: TaskStatus,
        /// Requested status.
        to: TaskStatus,
    },

    /// The task does not accept the change in its current status.
    #[error("task {task_id} is not open (current status: {status})")]
    TaskNotOpen {
        /// Task identifier.
        task_id: TaskId,
        /// Current status.
        status: TaskStatus,
    },

    /// Every participant slot of the task is taken.
    #[error("task {task_id} is full ({max_participants} participants)")]
    TaskFull {
        /// Task identifier.
        task_id: TaskId,
        /// Configured participant limit.
        max_participants: u32,
    },

    /// The principal already holds an active participation on the task.
    #[error("{participant} already participates in task {task_id}")]
    AlreadyParticipating {
        /// Task identifier.
        task_id: TaskId,
        /// Participating principal.
        participant: PrincipalId,
    },

    /// The principal created the task.
    #[error("{participant} created task {task_id} and cannot participate in it")]
    CannotParticipateOwnTask {
        /// Task identifier.
        task_id: TaskId,
        /// Creator attempting to join.
        participant: PrincipalId,
    },

    /// No active participation exists for the principal.
    #[error("{participant} has no active participation in task {task_id}")]
    ParticipationNotFound {
        /// Task identifier.
        task_id: TaskId,
        /// Principal without an active participation.
        participant: PrincipalId,
    },
}

impl TaskDomainError {
    /// Returns the failure kind reported to callers.
    #[must_use]
    pub const fn kind(&self) -> FailureKind {
        match self {
            Self::EmptyTitle
            | Self::TitleTooLong { .. }
            | Self::LocationTooLong { .. }
            | Self::InvalidMaxParticipants(_)
            | Self::EmptyNote
            | Self::NoteTooLong { .. } => FailureKind::InvalidInput,
            Self::InvalidStatusTransition { .. } => FailureKind::InvalidStatusTransition,
            Self::TaskNotOpen { .. } => FailureKind::TaskNotOpen,
            Self::TaskFull { .. } => FailureKind::TaskFull,
            Self::AlreadyParticipating { .. } => FailureKind::AlreadyParticipating,
            Self::CannotParticipateOwnTask { .. } => FailureKind::CannotParticipateOwnTask,
            Self::ParticipationNotFound { .. } => FailureKind::ParticipationNotFound,
        }
    }
}

/// Error returned while parsing task statuses from persistence or requests.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("unknown task status: {0}")]
pub struct ParseTaskStatusError(pub String);

/// Error returned while parsing participation statuses from persistence.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("unknown participation status: {0}")]
pub struct ParseParticipationStatusError(pub String);
