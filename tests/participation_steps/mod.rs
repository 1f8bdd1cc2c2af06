//! Step definitions for participation behaviour scenarios.

mod given;
mod then;
mod when;
pub mod world;
