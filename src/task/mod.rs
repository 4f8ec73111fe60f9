//! Case task management.
//!
//! Tasks are work items tied to a case. They are initiated from workflow
//! events, configured from decision-table output (attributes, calculated
//! dates and per-role permission grants), auto-assigned, and then moved
//! through their lifecycle by caseworkers. The module follows hexagonal
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

#[cfg(test)]
mod tests;
