//! Task aggregate root.

use super::{MaxParticipants, TaskDetails, TaskDomainError, TaskId, TaskStatus};
use crate::identity::domain::{Principal, PrincipalId};
use chrono::{DateTime, Utc};
use mockable::Clock;
use serde::{Deserialize, Serialize};

/// Task aggregate root.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    id: TaskId,
    details: TaskDetails,
    scheduled_at: DateTime<Utc>,
    max_participants: MaxParticipants,
    status: TaskStatus,
    creator: PrincipalId,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    revision: u64,
}

/// Revision of a freshly created task.
const INITIAL_REVISION: u64 = 1;

/// Parameter object for creating a new task.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewTask {
    /// Descriptive fields.
    pub details: TaskDetails,
    /// Scheduled start of the work.
    pub scheduled_at: DateTime<Utc>,
    /// Participant limit.
    pub max_participants: MaxParticipants,
    /// Principal posting the task.
    pub creator: PrincipalId,
}

/// Parameter object for reconstructing a persisted task aggregate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PersistedTaskData {
    /// Persisted task identifier.
    pub id: TaskId,
    /// Persisted descriptive fields.
    pub details: TaskDetails,
    /// Persisted scheduled start.
    pub scheduled_at: DateTime<Utc>,
    /// Persisted participant limit.
    pub max_participants: MaxParticipants,
    /// Persisted lifecycle status.
    pub status: TaskStatus,
    /// Persisted creator reference.
    pub creator: PrincipalId,
    /// Persisted creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Persisted latest update timestamp.
    pub updated_at: DateTime<Utc>,
    /// Persisted revision counter.
    pub revision: u64,
}

impl Task {
    /// Creates a new `Open` task.
    #[must_use]
    pub fn new(new_task: NewTask, clock: &impl Clock) -> Self {
        let timestamp = clock.utc();
        Self {
            id: TaskId::new(),
            details: new_task.details,
            scheduled_at: new_task.scheduled_at,
            max_participants: new_task.max_participants,
            status: TaskStatus::Open,
            creator: new_task.creator,
            created_at: timestamp,
            updated_at: timestamp,
            revision: INITIAL_REVISION,
        }
    }

    /// Reconstructs a task from persisted storage.
    #[must_use]
    pub fn from_persisted(data: PersistedTaskData) -> Self {
        Self {
            id: data.id,
            details: data.details,
            scheduled_at: data.scheduled_at,
            max_participants: data.max_participants,
            status: data.status,
            creator: data.creator,
            created_at: data.created_at,
            updated_at: data.updated_at,
            revision: data.revision,
        }
    }

    /// Returns the task identifier.
    #[must_use]
    pub const fn id(&self) -> TaskId {
        self.id
    }

    /// Returns the descriptive fields.
    #[must_use]
    pub const fn details(&self) -> &TaskDetails {
        &self.details
    }

    /// Returns the scheduled start.
    #[must_use]
    pub const fn scheduled_at(&self) -> DateTime<Utc> {
        self.scheduled_at
    }

    /// Returns the participant limit.
    #[must_use]
    pub const fn max_participants(&self) -> MaxParticipants {
        self.max_participants
    }

    /// Returns the lifecycle status.
    #[must_use]
    pub const fn status(&self) -> TaskStatus {
        self.status
    }

    /// Returns the creator reference.
    #[must_use]
    pub const fn creator(&self) -> &PrincipalId {
        &self.creator
    }

    /// Returns the creation timestamp.
    #[must_use]
    pub const fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Returns the latest update timestamp.
    #[must_use]
    pub const fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    /// Returns the revision counter.
    ///
    /// Every status change or detail revision increments it; stores use it
    /// to reject writes based on a stale copy.
    #[must_use]
    pub const fn revision(&self) -> u64 {
        self.revision
    }

    /// Returns `true` when `principal_id` created this task.
    #[must_use]
    pub fn is_created_by(&self, principal_id: &PrincipalId) -> bool {
        &self.creator == principal_id
    }

    /// Returns `true` when `principal` may change this task's status or
    /// details: its creator or an administrator.
    #[must_use]
    pub fn is_managed_by(&self, principal: &Principal) -> bool {
        self.is_created_by(principal.id()) || principal.is_admin()
    }

    /// Returns `true` when the scheduled start has passed while the task is
    /// still `Open`.
    ///
    /// Past-due tasks are only flagged; no transition happens automatically.
    #[must_use]
    pub fn is_past_due(&self, clock: &impl Clock) -> bool {
        self.status == TaskStatus::Open && clock.utc() > self.scheduled_at
    }

    /// Moves the task to `target`.
    ///
    /// # Errors
    ///
    /// Returns [`TaskDomainError::InvalidStatusTransition`] when the state
    /// machine does not permit the move. The task is left unchanged.
    pub fn transition_to(
        &mut self,
        target: TaskStatus,
        clock: &impl Clock,
    ) -> Result<(), TaskDomainError> {
        if !self.status.can_transition_to(target) {
            return Err(TaskDomainError::InvalidStatusTransition {
                task_id: self.id,
                from: self.status,
                to: target,
            });
        }
        self.status = target;
        self.touch(clock);
        Ok(())
    }

    /// Replaces the descriptive fields and scheduled start.
    ///
    /// # Errors
    ///
    /// Returns [`TaskDomainError::TaskNotOpen`] unless the task is `Open`.
    pub fn revise(
        &mut self,
        details: TaskDetails,
        scheduled_at: DateTime<Utc>,
        clock: &impl Clock,
    ) -> Result<(), TaskDomainError> {
        self.ensure_open()?;
        self.details = details;
        self.scheduled_at = scheduled_at;
        self.touch(clock);
        Ok(())
    }

    /// Fails unless the task accepts new participants.
    ///
    /// # Errors
    ///
    /// Returns [`TaskDomainError::TaskNotOpen`] unless the task is `Open`.
    pub fn ensure_open(&self) -> Result<(), TaskDomainError> {
        if self.status.accepts_participants() {
            return Ok(());
        }
        Err(TaskDomainError::TaskNotOpen {
            task_id: self.id,
            status: self.status,
        })
    }

    /// Fails when the task is in a terminal status, which freezes its
    /// participation records.
    ///
    /// # Errors
    ///
    /// Returns [`TaskDomainError::TaskNotOpen`] for `Completed` and
    /// `Cancelled` tasks.
    pub fn ensure_not_frozen(&self) -> Result<(), TaskDomainError> {
        if !self.status.is_terminal() {
            return Ok(());
        }
        Err(TaskDomainError::TaskNotOpen {
            task_id: self.id,
            status: self.status,
        })
    }

    /// Stamps the current clock time and advances the revision.
    fn touch(&mut self, clock: &impl Clock) {
        self.updated_at = clock.utc();
        self.revision = self.revision.saturating_add(1);
    }
}
