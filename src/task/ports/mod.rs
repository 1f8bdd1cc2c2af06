//! Port contracts for task lifecycle management.
//!
//! Ports define infrastructure-agnostic interfaces used by task services.

pub mod participation;
pub mod repository;

pub use participation::ParticipationRepository;
pub use repository::{TaskRepository, TaskRepositoryError, TaskRepositoryResult};

/// Persistence collaborator providing both task and participation records.
///
/// Implemented automatically for any type implementing both ports.
pub trait TaskStore: TaskRepository + ParticipationRepository {}

impl<T> TaskStore for T where T: TaskRepository + ParticipationRepository {}
