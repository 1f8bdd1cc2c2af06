//! Admission and withdrawal rules for task participation.
//!
//! Persistence adapters evaluate these rules against state read inside the
//! same unit of work that writes the participation record, which keeps the
//! capacity check and the insert atomic.

use super::{CapacityGate, Task, TaskDomainError};
use crate::identity::domain::PrincipalId;

/// Participation state of a task observed inside a unit of work.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RosterSnapshot {
    /// Number of active participations on the task.
    pub active_count: u32,
    /// Whether the candidate already holds an active participation.
    pub candidate_active: bool,
}

/// Join and leave preconditions.
#[derive(Debug, Clone, Copy, Default)]
pub struct AdmissionPolicy;

impl AdmissionPolicy {
    /// Checks whether `participant` may join `task`.
    ///
    /// Checks run in a fixed order so each rejection is deterministic: task
    /// status, duplicate participation, self-participation, capacity.
    ///
    /// # Errors
    ///
    /// Returns [`TaskDomainError::TaskNotOpen`],
    /// [`TaskDomainError::AlreadyParticipating`],
    /// [`TaskDomainError::CannotParticipateOwnTask`] or
    /// [`TaskDomainError::TaskFull`].
    pub fn evaluate_join(
        task: &Task,
        participant: &PrincipalId,
        roster: RosterSnapshot,
    ) -> Result<(), TaskDomainError> {
        task.ensure_open()?;
        if roster.candidate_active {
            return Err(TaskDomainError::AlreadyParticipating {
                task_id: task.id(),
                participant: participant.clone(),
            });
        }
        if task.is_created_by(participant) {
            return Err(TaskDomainError::CannotParticipateOwnTask {
                task_id: task.id(),
                participant: participant.clone(),
            });
        }
        if !CapacityGate::can_join(task, roster.active_count) {
            return Err(TaskDomainError::TaskFull {
                task_id: task.id(),
                max_participants: task.max_participants().value(),
            });
        }
        Ok(())
    }

    /// Checks whether `participant` may leave `task`.
    ///
    /// Leaving is allowed while the task is `Open` or `InProgress`.
    ///
    /// # Errors
    ///
    /// Returns [`TaskDomainError::TaskNotOpen`] for terminal tasks and
    /// [`TaskDomainError::ParticipationNotFound`] when the participant holds
    /// no active participation.
    pub fn evaluate_leave(
        task: &Task,
        participant: &PrincipalId,
        roster: RosterSnapshot,
    ) -> Result<(), TaskDomainError> {
        task.ensure_not_frozen()?;
        if !roster.candidate_active {
            return Err(TaskDomainError::ParticipationNotFound {
                task_id: task.id(),
                participant: participant.clone(),
            });
        }
        Ok(())
    }
}
