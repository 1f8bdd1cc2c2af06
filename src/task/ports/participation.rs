//! Repository port for participation records.
//!
//! Admission and withdrawal are units of work: implementations read the task
//! and its roster, evaluate [`AdmissionPolicy`](crate::task::domain::AdmissionPolicy)
//! and write the record atomically, so concurrent joins can never push the
//! active count past the task's limit.

use super::TaskRepositoryResult;
use crate::identity::domain::PrincipalId;
use crate::task::domain::{Participation, TaskId};
use async_trait::async_trait;
use chrono::{DateTime, Utc};

/// Participation persistence contract.
#[async_trait]
pub trait ParticipationRepository: Send + Sync {
    /// Stores `participation` as active if the admission rules still hold.
    ///
    /// # Errors
    ///
    /// Returns [`super::TaskRepositoryError::NotFound`] when the task does not
    /// exist, [`super::TaskRepositoryError::Rejected`] carrying the domain
    /// error when admission fails, or
    /// [`super::TaskRepositoryError::DuplicateParticipation`] when the record
    /// ID already exists.
    async fn admit(&self, participation: &Participation) -> TaskRepositoryResult<()>;

    /// Marks the active participation of `participant` on `task_id` as left.
    ///
    /// Returns the updated record.
    ///
    /// # Errors
    ///
    /// Returns [`super::TaskRepositoryError::NotFound`] when the task does not
    /// exist or [`super::TaskRepositoryError::Rejected`] when the task is
    /// frozen or no active participation exists.
    async fn withdraw(
        &self,
        task_id: TaskId,
        participant: &PrincipalId,
        left_at: DateTime<Utc>,
    ) -> TaskRepositoryResult<Participation>;

    /// Counts active participations on `task_id`.
    async fn count_active(&self, task_id: TaskId) -> TaskRepositoryResult<u32>;

    /// Finds the active participation of `participant` on `task_id`.
    async fn find_active(
        &self,
        task_id: TaskId,
        participant: &PrincipalId,
    ) -> TaskRepositoryResult<Option<Participation>>;

    /// Returns every participation on `task_id`, ordered by join time.
    async fn list_by_task(&self, task_id: TaskId) -> TaskRepositoryResult<Vec<Participation>>;

    /// Returns every participation of `participant`, ordered by join time.
    async fn list_by_participant(
        &self,
        participant: &PrincipalId,
    ) -> TaskRepositoryResult<Vec<Participation>>;
}
