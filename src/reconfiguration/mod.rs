//! Bulk reconfiguration of case tasks.
//!
//! A batch runs one of three operations over a filtered set of tasks:
//! marking them dirty, re-deriving the attributes and assignment of dirty
//! tasks, or listing dirty tasks that keep failing. Every task is processed
//! in its own lock scope, so a failure or conflict on one task never affects
//! its siblings.

pub mod domain;
pub mod services;

#[cfg(test)]
mod tests;
