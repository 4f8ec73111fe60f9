//! Step definitions for task lifecycle behaviour scenarios.

pub mod given;
pub mod when;
pub mod world;
