//! Diesel row models for task and participation persistence.

use super::schema::{participations, tasks};
use chrono::{DateTime, Utc};
use diesel::prelude::*;

/// Query result row for task records.
#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = tasks)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct TaskRow {
    /// Task identifier.
    pub id: uuid::Uuid,
    /// Task title.
    pub title: String,
    /// Optional description.
    pub description: Option<String>,
    /// Optional location.
    pub location: Option<String>,
    /// Scheduled start.
    pub scheduled_at: DateTime<Utc>,
    /// Participant limit.
    pub max_participants: i32,
    /// Lifecycle status.
    pub status: String,
    /// Creator reference.
    pub creator_id: String,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Last update timestamp.
    pub updated_at: DateTime<Utc>,
    /// Revision counter.
    pub revision: i64,
}

/// Insert model for task records.
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = tasks)]
pub struct NewTaskRow {
    /// Task identifier.
    pub id: uuid::Uuid,
    /// Task title.
    pub title: String,
    /// Optional description.
    pub description: Option<String>,
    /// Optional location.
    pub location: Option<String>,
    /// Scheduled start.
    pub scheduled_at: DateTime<Utc>,
    /// Participant limit.
    pub max_participants: i32,
    /// Lifecycle status.
    pub status: String,
    /// Creator reference.
    pub creator_id: String,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Last update timestamp.
    pub updated_at: DateTime<Utc>,
    /// Revision counter.
    pub revision: i64,
}

/// Mutable task columns written by status and detail updates.
///
/// `created_at`, `creator_id` and `max_participants` never change.
#[derive(Debug, Clone, AsChangeset)]
#[diesel(table_name = tasks)]
#[diesel(treat_none_as_null = true)]
pub struct TaskChangeset {
    /// Task title.
    pub title: String,
    /// Optional description.
    pub description: Option<String>,
    /// Optional location.
    pub location: Option<String>,
    /// Scheduled start.
    pub scheduled_at: DateTime<Utc>,
    /// Lifecycle status.
    pub status: String,
    /// Last update timestamp.
    pub updated_at: DateTime<Utc>,
    /// Revision counter.
    pub revision: i64,
}

/// Query result row for participation records.
#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = participations)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct ParticipationRow {
    /// Participation identifier.
    pub id: uuid::Uuid,
    /// Task reference.
    pub task_id: uuid::Uuid,
    /// Participant reference.
    pub participant_id: String,
    /// Participation status.
    pub status: String,
    /// Optional note.
    pub note: Option<String>,
    /// Join timestamp.
    pub joined_at: DateTime<Utc>,
    /// Leave timestamp.
    pub left_at: Option<DateTime<Utc>>,
}

/// Insert model for participation records.
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = participations)]
pub struct NewParticipationRow {
    /// Participation identifier.
    pub id: uuid::Uuid,
    /// Task reference.
    pub task_id: uuid::Uuid,
    /// Participant reference.
    pub participant_id: String,
    /// Participation status.
    pub status: String,
    /// Optional note.
    pub note: Option<String>,
    /// Join timestamp.
    pub joined_at: DateTime<Utc>,
    /// Leave timestamp.
    pub left_at: Option<DateTime<Utc>>,
}
