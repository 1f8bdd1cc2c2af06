//! Participant capacity accounting.

use super::{MaxParticipants, Task, TaskStatus};

/// Participant limit together with the current number of active
/// participations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Capacity {
    max_participants: MaxParticipants,
    active: u32,
}

impl Capacity {
    /// Creates a capacity snapshot.
    #[must_use]
    pub const fn new(max_participants: MaxParticipants, active: u32) -> Self {
        Self {
            max_participants,
            active,
        }
    }

    /// Returns the number of active participations.
    #[must_use]
    pub const fn active(self) -> u32 {
        self.active
    }

    /// Returns `max - active`, clamped at zero.
    #[must_use]
    pub const fn available_slots(self) -> u32 {
        self.max_participants.value().saturating_sub(self.active)
    }

    /// Returns `true` when no slot is free.
    #[must_use]
    pub const fn is_exhausted(self) -> bool {
        self.available_slots() == 0
    }
}

/// Join guard combining task status and free capacity.
///
/// Evaluated against counts read inside the admission unit of work; the
/// result must not be cached across units.
#[derive(Debug, Clone, Copy, Default)]
pub struct CapacityGate;

impl CapacityGate {
    /// Returns `true` when `task` is `Open` and has a free slot given `active`
    /// participations.
    #[must_use]
    pub fn can_join(task: &Task, active: u32) -> bool {
        task.status() == TaskStatus::Open
            && !Capacity::new(task.max_participants(), active).is_exhausted()
    }
}
