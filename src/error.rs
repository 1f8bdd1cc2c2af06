//! Failure taxonomy shared by every service in the crate.
//!
//! Each domain, port and service error reports a [`FailureKind`]. Callers that
//! expose the core over a protocol (HTTP, RPC) translate kinds through
//! [`FailureKind::category`] instead of matching on concrete error types.

use std::fmt;

/// Kind of failure reported by the participation core.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FailureKind {
    /// The referenced task does not exist.
    TaskNotFound,
    /// No active participation exists for the task and principal.
    ParticipationNotFound,
    /// The task does not accept participation changes in its current status.
    TaskNotOpen,
    /// The task has no free participant slots.
    TaskFull,
    /// The principal already holds an active participation on the task.
    AlreadyParticipating,
    /// The principal created the task and cannot participate in it.
    CannotParticipateOwnTask,
    /// The requested status transition is not permitted.
    InvalidStatusTransition,
    /// The principal may not perform the operation.
    UnauthorizedAccess,
    /// The verified claims do not identify a principal.
    InvalidIdentity,
    /// Caller-supplied input failed validation.
    InvalidInput,
    /// The task was written concurrently with the operation.
    ConcurrentUpdate,
    /// The persistence collaborator failed.
    Persistence,
}

/// Protocol-neutral grouping of failure kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FailureCategory {
    /// A referenced record does not exist.
    NotFound,
    /// The request conflicts with the current state.
    Conflict,
    /// The principal lacks the rights for the operation.
    Forbidden,
    /// The request must be treated as unauthenticated.
    Unauthenticated,
    /// The request is malformed.
    InvalidInput,
    /// Infrastructure failure; the request may be retried by the transport.
    Unavailable,
}

impl FailureKind {
    /// Returns the category used to report this kind to callers.
    #[must_use]
    pub const fn category(self) -> FailureCategory {
        match self {
            Self::TaskNotFound | Self::ParticipationNotFound => FailureCategory::NotFound,
            Self::TaskNotOpen
            | Self::TaskFull
            | Self::AlreadyParticipating
            | Self::CannotParticipateOwnTask
            | Self::InvalidStatusTransition
            | Self::ConcurrentUpdate => FailureCategory::Conflict,
            Self::UnauthorizedAccess => FailureCategory::Forbidden,
            Self::InvalidIdentity => FailureCategory::Unauthenticated,
            Self::InvalidInput => FailureCategory::InvalidInput,
            Self::Persistence => FailureCategory::Unavailable,
        }
    }

    /// Returns the canonical identifier for logs and error payloads.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::TaskNotFound => "task_not_found",
            Self::ParticipationNotFound => "participation_not_found",
            Self::TaskNotOpen => "task_not_open",
            Self::TaskFull => "task_full",
            Self::AlreadyParticipating => "already_participating",
            Self::CannotParticipateOwnTask => "cannot_participate_own_task",
            Self::InvalidStatusTransition => "invalid_status_transition",
            Self::UnauthorizedAccess => "unauthorized_access",
            Self::InvalidIdentity => "invalid_identity",
            Self::InvalidInput => "invalid_input",
            Self::ConcurrentUpdate => "concurrent_update",
            Self::Persistence => "persistence",
        }
    }
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FailureCategory {
    /// Returns the HTTP status code equivalent of the category.
    #[must_use]
    pub const fn status_code(self) -> u16 {
        match self {
            Self::NotFound => 404,
            Self::Conflict => 409,
            Self::Forbidden => 403,
            Self::Unauthenticated => 401,
            Self::InvalidInput => 400,
            Self::Unavailable => 503,
        }
    }
}
