//! Aggregated results of a reconfiguration batch.

use super::{ReconfigurationOperation, RunId};
use crate::task::domain::{CaseId, Task, TaskId, TaskState};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fmt;

/// Overall status of a batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BatchStatus {
    /// Every eligible task was handled or deliberately left for a later run.
    Completed,
    /// At least one eligible task could not be locked while marking.
    Conflict,
}

impl BatchStatus {
    /// Returns the canonical status name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Completed => "COMPLETED",
            Self::Conflict => "CONFLICT",
        }
    }
}

impl fmt::Display for BatchStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Per-batch tallies.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct BatchCounts {
    /// Tasks matched by the filters.
    pub selected: usize,
    /// Tasks marked or reconfigured.
    pub succeeded: usize,
    /// Tasks already in the requested condition.
    pub unchanged: usize,
    /// Tasks outside the eligible states, or gone.
    pub skipped: usize,
    /// Tasks whose unit of work was rolled back.
    pub failed: usize,
    /// Tasks left to a later run because another writer held them.
    pub deferred: usize,
    /// Tasks never attempted because the time budget ran out.
    pub unscheduled: usize,
}

/// A dirty task that keeps failing to reconfigure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReconfigurationFailure {
    /// Task identifier.
    pub task_id: TaskId,
    /// Case the task belongs to.
    pub case_id: CaseId,
    /// Task type.
    pub task_type: String,
    /// Current state.
    pub state: TaskState,
    /// When the pending request was made.
    pub reconfigure_request_time: DateTime<Utc>,
}

impl ReconfigurationFailure {
    /// Describes a dirty task; clean tasks yield `None`.
    #[must_use]
    pub fn from_task(task: &Task) -> Option<Self> {
        let reconfigure_request_time = task.reconfigure_request_time()?;
        Some(Self {
            task_id: task.id(),
            case_id: task.case().case_id().clone(),
            task_type: task.task_type().to_owned(),
            state: task.state(),
            reconfigure_request_time,
        })
    }
}

/// Result of running one batch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BatchOutcome {
    /// Run identifier.
    pub run_id: RunId,
    /// Operation performed.
    pub operation: ReconfigurationOperation,
    /// Overall status.
    pub status: BatchStatus,
    /// Tallies.
    pub counts: BatchCounts,
    /// Failing tasks; only filled by the failure listing.
    pub failures: Vec<ReconfigurationFailure>,
}
