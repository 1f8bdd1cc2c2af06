//! Participation record linking a principal to a task.

use super::{
    ParseParticipationStatusError, ParticipationId, ParticipationNote, TaskDomainError, TaskId,
};
use crate::identity::domain::PrincipalId;
use chrono::{DateTime, Utc};
use mockable::Clock;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Participation status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ParticipationStatus {
    /// Counts toward the task's capacity.
    Active,
    /// Withdrawn; kept for history.
    Left,
}

impl ParticipationStatus {
    /// Returns the canonical storage representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Left => "left",
        }
    }
}

impl fmt::Display for ParticipationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<&str> for ParticipationStatus {
    type Error = ParseParticipationStatusError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        let normalized = value.trim().to_ascii_lowercase();
        match normalized.as_str() {
            "active" => Ok(Self::Active),
            "left" => Ok(Self::Left),
            _ => Err(ParseParticipationStatusError(value.to_owned())),
        }
    }
}

/// Participation aggregate.
///
/// Records are never deleted: leaving marks them [`ParticipationStatus::Left`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Participation {
    id: ParticipationId,
    task_id: TaskId,
    participant: PrincipalId,
    status: ParticipationStatus,
    note: Option<ParticipationNote>,
    joined_at: DateTime<Utc>,
    left_at: Option<DateTime<Utc>>,
}

/// Parameter object for reconstructing a persisted participation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PersistedParticipationData {
    /// Persisted participation identifier.
    pub id: ParticipationId,
    /// Persisted task reference.
    pub task_id: TaskId,
    /// Persisted participant reference.
    pub participant: PrincipalId,
    /// Persisted status.
    pub status: ParticipationStatus,
    /// Persisted note, if any.
    pub note: Option<ParticipationNote>,
    /// Persisted join timestamp.
    pub joined_at: DateTime<Utc>,
    /// Persisted leave timestamp, if any.
    pub left_at: Option<DateTime<Utc>>,
}

impl Participation {
    /// Creates an active participation joined now.
    #[must_use]
    pub fn new_active(
        task_id: TaskId,
        participant: PrincipalId,
        note: Option<ParticipationNote>,
        clock: &impl Clock,
    ) -> Self {
        Self {
            id: ParticipationId::new(),
            task_id,
            participant,
            status: ParticipationStatus::Active,
            note,
            joined_at: clock.utc(),
            left_at: None,
        }
    }

    /// Reconstructs a participation from persisted storage.
    #[must_use]
    pub fn from_persisted(data: PersistedParticipationData) -> Self {
        Self {
            id: data.id,
            task_id: data.task_id,
            participant: data.participant,
            status: data.status,
            note: data.note,
            joined_at: data.joined_at,
            left_at: data.left_at,
        }
    }

    /// Returns the participation identifier.
    #[must_use]
    pub const fn id(&self) -> ParticipationId {
        self.id
    }

    /// Returns the task reference.
    #[must_use]
    pub const fn task_id(&self) -> TaskId {
        self.task_id
    }

    /// Returns the participant reference.
    #[must_use]
    pub const fn participant(&self) -> &PrincipalId {
        &self.participant
    }

    /// Returns the status.
    #[must_use]
    pub const fn status(&self) -> ParticipationStatus {
        self.status
    }

    /// Returns `true` while the participation counts toward capacity.
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.status == ParticipationStatus::Active
    }

    /// Returns the note, if any.
    #[must_use]
    pub const fn note(&self) -> Option<&ParticipationNote> {
        self.note.as_ref()
    }

    /// Returns the join timestamp.
    #[must_use]
    pub const fn joined_at(&self) -> DateTime<Utc> {
        self.joined_at
    }

    /// Returns the leave timestamp, if the participation was withdrawn.
    #[must_use]
    pub const fn left_at(&self) -> Option<DateTime<Utc>> {
        self.left_at
    }

    /// Marks the participation as left at `left_at`.
    ///
    /// Adapters call this inside their withdrawal unit of work, so the
    /// timestamp is supplied rather than read from a clock.
    ///
    /// # Errors
    ///
    /// Returns [`TaskDomainError::ParticipationNotFound`] when the
    /// participation is no longer active.
    pub fn mark_left(&mut self, left_at: DateTime<Utc>) -> Result<(), TaskDomainError> {
        if !self.is_active() {
            return Err(TaskDomainError::ParticipationNotFound {
                task_id: self.task_id,
                participant: self.participant.clone(),
            });
        }
        self.status = ParticipationStatus::Left;
        self.left_at = Some(left_at);
        Ok(())
    }
}
