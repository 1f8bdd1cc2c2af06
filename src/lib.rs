//! Samaritan: volunteer task and participation lifecycle core.
//!
//! People affected by a crisis, and the organizers helping them, post tasks
//! that volunteers join and leave. This crate resolves verified identity
//! claims into principals, enforces the task status state machine and keeps
//! the number of active participants within each task's limit under
//! concurrent joins.
//!
//! # Architecture
//!
//! Samaritan follows hexagonal architecture principles:
//!
//! - **Domain**: Pure business logic with no infrastructure dependencies
//! - **Ports**: Abstract trait interfaces for persistence
//! - **Adapters**: In-memory and `PostgreSQL` implementations of the ports
//!
//! # Modules
//!
//! - [`identity`]: Claims resolution into principals and roles
//! - [`task`]: Task lifecycle, capacity and participation
//! - [`error`]: Failure kinds shared by every layer
//! - [`config`]: Layered application configuration
//! - [`telemetry`]: Tracing subscriber setup

pub mod config;
pub mod error;
pub mod identity;
pub mod task;
pub mod telemetry;
