//! Application services for reconfiguration batches.

mod orchestrator;

pub use orchestrator::{ReconfigurationError, ReconfigurationOrchestrator};
