//! Domain model for task and participation lifecycle management.
//!
//! The task domain models task posting, the status state machine, capacity
//! accounting and the admission rules for participants while keeping all
//! infrastructure concerns outside of the domain boundary.

mod admission;
mod capacity;
mod details;
mod error;
mod ids;
mod participation;
mod status;
mod task;

pub use admission::{AdmissionPolicy, RosterSnapshot};
pub use capacity::{Capacity, CapacityGate};
pub use details::{MaxParticipants, ParticipationNote, TaskDetails, TaskTitle};
pub use error::{ParseParticipationStatusError, ParseTaskStatusError, TaskDomainError};
pub use ids::{ParticipationId, TaskId};
pub use participation::{Participation, ParticipationStatus, PersistedParticipationData};
pub use status::TaskStatus;
pub use task::{NewTask, PersistedTaskData, Task};
