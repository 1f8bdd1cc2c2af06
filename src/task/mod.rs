//! Task lifecycle and participation management.
//!
//! Organizers and affected people post tasks; volunteers join and leave
//! them while the task is open. Status changes follow a fixed state machine,
//! and the number of active participations never exceeds a task's limit,
//! including under concurrent joins. The module follows hexagonal
//! architecture:
//!
//! - Domain types in [`domain`]
//! - Port contracts in [`ports`]
//! - Adapter implementations in [`adapters`]
//! - Orchestration services in [`services`]

pub mod adapters;
pub mod domain;
pub mod ports;
pub mod services;
