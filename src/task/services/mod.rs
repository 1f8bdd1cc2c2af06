//! Application services for task lifecycle and participation orchestration.

mod lifecycle;
mod participation;

pub use lifecycle::{
    CreateTaskRequest, TaskLifecycleError, TaskLifecycleResult, TaskLifecycleService,
    TaskOverview, TransitionTaskRequest, UpdateTaskDetailsRequest,
};
pub use participation::{
    JoinTaskRequest, ParticipationCoordinator, ParticipationError, ParticipationResult,
};
