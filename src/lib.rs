//! Caseflow: case task tracking with rule-driven configuration.
//!
//! The crate manages work items attached to cases. Tasks are configured from
//! externally evaluated rules, assigned to case workers according to their
//! role assignments, and periodically reconfigured in bulk when the rules or
//! case data change.
//!
//! # Architecture
//!
//! Caseflow follows hexagonal architecture principles:
//!
//! - **Domain**: Pure business logic with no infrastructure dependencies
//! - **Ports**: Abstract trait interfaces for external interactions
//! - **Adapters**: Concrete implementations of ports (database, in-memory)
//!
//! # Modules
//!
//! - [`task`]: Task aggregate, lifecycle operations and persistence
//! - [`access`]: Role assignments, permission evaluation and auto-assignment
//! - [`reconfiguration`]: Two-phase bulk reconfiguration batches

pub mod access;
pub mod reconfiguration;
pub mod task;

#[cfg(test)]
mod test_support;
