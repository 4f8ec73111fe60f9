//! Batch request model, outcomes and settings for reconfiguration runs.

mod error;
mod outcome;
mod request;
mod settings;

pub use error::{ReconfigurationRequestError, SettingsError};
pub use outcome::{BatchCounts, BatchOutcome, BatchStatus, ReconfigurationFailure};
pub use request::{
    BatchControls, FilterRequest, ReconfigurationBatch, ReconfigurationOperation, RunId,
    TaskFilter, TriggerRequest,
};
pub use settings::{LockRetryPolicy, ReconfigurationSettings};
