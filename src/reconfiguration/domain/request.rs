//! Trigger requests and the validated batches built from them.

use super::{ReconfigurationRequestError, ReconfigurationSettings};
use crate::task::domain::CaseId;
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

const CASE_ID_KEY: &str = "case_id";
const REQUEST_TIME_KEY: &str = "reconfigure_request_time";

/// Operation a reconfiguration batch performs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ReconfigurationOperation {
    /// Flag eligible tasks as needing reconfiguration.
    MarkToReconfigure,
    /// Re-derive attributes and assignment of flagged tasks.
    ExecuteReconfigure,
    /// List flagged tasks that are still failing.
    ExecuteReconfigureFailures,
}

impl ReconfigurationOperation {
    /// Every operation in declaration order.
    pub const ALL: [Self; 3] = [
        Self::MarkToReconfigure,
        Self::ExecuteReconfigure,
        Self::ExecuteReconfigureFailures,
    ];

    /// Returns the canonical operation name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::MarkToReconfigure => "MARK_TO_RECONFIGURE",
            Self::ExecuteReconfigure => "EXECUTE_RECONFIGURE",
            Self::ExecuteReconfigureFailures => "EXECUTE_RECONFIGURE_FAILURES",
        }
    }
}

impl TryFrom<&str> for ReconfigurationOperation {
    type Error = ReconfigurationRequestError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        let normalized = value.trim().to_ascii_uppercase();
        Self::ALL
            .into_iter()
            .find(|operation| operation.as_str() == normalized)
            .ok_or_else(|| ReconfigurationRequestError::UnknownOperation(value.to_owned()))
    }
}

impl fmt::Display for ReconfigurationOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Raw `(key, operator, values)` filter as received from the trigger.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterRequest {
    /// Task attribute the filter applies to.
    pub key: String,
    /// Comparison operator.
    pub operator: String,
    /// Operand values.
    #[serde(default)]
    pub values: Vec<String>,
}

impl FilterRequest {
    /// Creates a filter request.
    #[must_use]
    pub fn new<I, V>(key: impl Into<String>, operator: impl Into<String>, values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<String>,
    {
        Self {
            key: key.into(),
            operator: operator.into(),
            values: values.into_iter().map(Into::into).collect(),
        }
    }
}

/// Raw trigger payload for a reconfiguration batch.
///
/// Unset controls fall back to [`ReconfigurationSettings`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TriggerRequest {
    /// Operation name, such as `MARK_TO_RECONFIGURE`.
    pub operation: String,
    /// Task filters, combined with AND.
    #[serde(default)]
    pub filters: Vec<FilterRequest>,
    /// Time budget for the whole batch.
    #[serde(default)]
    pub max_time_limit_seconds: Option<u64>,
    /// How far back a reconfiguration request stays eligible for execution.
    #[serde(default)]
    pub retry_window_hours: Option<u32>,
    /// Correlation identifier for logs and audit.
    #[serde(default)]
    pub run_id: Option<String>,
}

impl TriggerRequest {
    /// Creates a request for `operation` without filters or overrides.
    #[must_use]
    pub fn new(operation: impl Into<String>) -> Self {
        Self {
            operation: operation.into(),
            ..Self::default()
        }
    }

    /// Appends a filter.
    #[must_use]
    pub fn with_filter(mut self, filter: FilterRequest) -> Self {
        self.filters.push(filter);
        self
    }

    /// Overrides the batch time budget.
    #[must_use]
    pub const fn with_max_time_limit_seconds(mut self, seconds: u64) -> Self {
        self.max_time_limit_seconds = Some(seconds);
        self
    }

    /// Overrides the retry window.
    #[must_use]
    pub const fn with_retry_window_hours(mut self, hours: u32) -> Self {
        self.retry_window_hours = Some(hours);
        self
    }

    /// Sets the run identifier.
    #[must_use]
    pub fn with_run_id(mut self, run_id: impl Into<String>) -> Self {
        self.run_id = Some(run_id.into());
        self
    }
}

/// Validated task filter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TaskFilter {
    /// `case_id IN [...]`.
    CaseIdIn(Vec<CaseId>),
    /// `reconfigure_request_time AFTER <instant>`.
    ReconfigureRequestTimeAfter(DateTime<Utc>),
}

impl TaskFilter {
    fn key(&self) -> &'static str {
        match self {
            Self::CaseIdIn(_) => CASE_ID_KEY,
            Self::ReconfigureRequestTimeAfter(_) => REQUEST_TIME_KEY,
        }
    }
}

impl TryFrom<&FilterRequest> for TaskFilter {
    type Error = ReconfigurationRequestError;

    fn try_from(request: &FilterRequest) -> Result<Self, Self::Error> {
        let key = request.key.trim();
        let operator = request.operator.trim().to_ascii_uppercase();
        let invalid = |value: &str| ReconfigurationRequestError::InvalidFilterValue {
            key: key.to_owned(),
            value: value.to_owned(),
        };
        if request.values.is_empty() {
            return Err(ReconfigurationRequestError::EmptyFilter(key.to_owned()));
        }
        match (key, operator.as_str()) {
            (CASE_ID_KEY, "IN") => request
                .values
                .iter()
                .map(|value| CaseId::new(value.as_str()).map_err(|_| invalid(value)))
                .collect::<Result<Vec<_>, _>>()
                .map(Self::CaseIdIn),
            (REQUEST_TIME_KEY, "AFTER") => match request.values.as_slice() {
                [value] => DateTime::parse_from_rfc3339(value.trim())
                    .map(|instant| Self::ReconfigureRequestTimeAfter(instant.with_timezone(&Utc)))
                    .map_err(|_| invalid(value)),
                _ => Err(invalid(&request.values.join(","))),
            },
            _ => Err(ReconfigurationRequestError::UnsupportedFilter {
                key: key.to_owned(),
                operator,
            }),
        }
    }
}

/// Correlation identifier of one batch run.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RunId(String);

impl RunId {
    /// Creates a run identifier from a caller-supplied value.
    ///
    /// # Errors
    ///
    /// Returns [`ReconfigurationRequestError::InvalidControl`] when the value
    /// is blank.
    pub fn new(value: impl Into<String>) -> Result<Self, ReconfigurationRequestError> {
        let raw = value.into();
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(ReconfigurationRequestError::InvalidControl {
                name: "run_id",
                value: raw,
            });
        }
        Ok(Self(trimmed.to_owned()))
    }

    /// Generates a fresh random run identifier.
    #[must_use]
    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    /// Returns the identifier as `str`.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RunId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Time budget, retry window and correlation id of a batch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchControls {
    max_time_limit: Duration,
    retry_window: Duration,
    failure_report_delay: Duration,
    run_id: RunId,
}

impl BatchControls {
    /// Builds controls from the configured defaults with a generated run id.
    ///
    /// # Errors
    ///
    /// Returns [`ReconfigurationRequestError::InvalidControl`] when a
    /// setting is zero or too large to represent.
    pub fn from_settings(
        settings: &ReconfigurationSettings,
    ) -> Result<Self, ReconfigurationRequestError> {
        Self::build(
            settings.max_time_limit_seconds,
            settings.retry_window_hours,
            settings.failure_report_delay_seconds,
            RunId::generate(),
        )
    }

    fn build(
        max_time_limit_seconds: u64,
        retry_window_hours: u32,
        failure_report_delay_seconds: u64,
        run_id: RunId,
    ) -> Result<Self, ReconfigurationRequestError> {
        if max_time_limit_seconds == 0 {
            return Err(invalid_control("max_time_limit_seconds", max_time_limit_seconds));
        }
        if retry_window_hours == 0 {
            return Err(invalid_control("retry_window_hours", retry_window_hours));
        }
        Ok(Self {
            max_time_limit: seconds("max_time_limit_seconds", max_time_limit_seconds)?,
            retry_window: Duration::try_hours(i64::from(retry_window_hours))
                .ok_or_else(|| invalid_control("retry_window_hours", retry_window_hours))?,
            failure_report_delay: seconds(
                "failure_report_delay_seconds",
                failure_report_delay_seconds,
            )?,
            run_id,
        })
    }

    /// Replaces the run identifier.
    #[must_use]
    pub fn with_run_id(mut self, run_id: RunId) -> Self {
        self.run_id = run_id;
        self
    }

    /// Returns the time budget of the batch.
    #[must_use]
    pub const fn max_time_limit(&self) -> Duration {
        self.max_time_limit
    }

    /// Returns how long a reconfiguration request stays executable.
    #[must_use]
    pub const fn retry_window(&self) -> Duration {
        self.retry_window
    }

    /// Returns how old a pending request must be before it is reported.
    #[must_use]
    pub const fn failure_report_delay(&self) -> Duration {
        self.failure_report_delay
    }

    /// Returns the run identifier.
    #[must_use]
    pub const fn run_id(&self) -> &RunId {
        &self.run_id
    }
}

fn seconds(name: &'static str, value: u64) -> Result<Duration, ReconfigurationRequestError> {
    i64::try_from(value)
        .ok()
        .and_then(Duration::try_seconds)
        .ok_or_else(|| invalid_control(name, value))
}

fn invalid_control(name: &'static str, value: impl ToString) -> ReconfigurationRequestError {
    ReconfigurationRequestError::InvalidControl {
        name,
        value: value.to_string(),
    }
}

/// Validated reconfiguration batch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReconfigurationBatch {
    operation: ReconfigurationOperation,
    filters: Vec<TaskFilter>,
    controls: BatchControls,
}

impl ReconfigurationBatch {
    /// Creates a batch from already validated parts.
    ///
    /// # Errors
    ///
    /// Returns [`ReconfigurationRequestError::DuplicateFilter`] when a filter
    /// kind repeats, [`ReconfigurationRequestError::EmptyFilter`] for a case
    /// filter without cases, or [`ReconfigurationRequestError::MissingCaseFilter`]
    /// when marking without a case filter.
    pub fn new(
        operation: ReconfigurationOperation,
        filters: Vec<TaskFilter>,
        controls: BatchControls,
    ) -> Result<Self, ReconfigurationRequestError> {
        for (index, filter) in filters.iter().enumerate() {
            if matches!(filter, TaskFilter::CaseIdIn(case_ids) if case_ids.is_empty()) {
                return Err(ReconfigurationRequestError::EmptyFilter(
                    filter.key().to_owned(),
                ));
            }
            let repeated = filters
                .iter()
                .skip(index + 1)
                .any(|other| other.key() == filter.key());
            if repeated {
                return Err(ReconfigurationRequestError::DuplicateFilter(
                    filter.key().to_owned(),
                ));
            }
        }
        let batch = Self {
            operation,
            filters,
            controls,
        };
        if operation == ReconfigurationOperation::MarkToReconfigure && batch.case_ids().is_none() {
            return Err(ReconfigurationRequestError::MissingCaseFilter(operation));
        }
        Ok(batch)
    }

    /// Validates a trigger request, filling unset controls from `settings`.
    ///
    /// # Errors
    ///
    /// Returns [`ReconfigurationRequestError`] for an unknown operation, a
    /// malformed filter or an out-of-range control.
    pub fn from_request(
        request: TriggerRequest,
        settings: &ReconfigurationSettings,
    ) -> Result<Self, ReconfigurationRequestError> {
        let operation = ReconfigurationOperation::try_from(request.operation.as_str())?;
        let filters = request
            .filters
            .iter()
            .map(TaskFilter::try_from)
            .collect::<Result<Vec<_>, _>>()?;
        let run_id = request
            .run_id
            .map_or_else(|| Ok(RunId::generate()), RunId::new)?;
        let controls = BatchControls::build(
            request
                .max_time_limit_seconds
                .unwrap_or(settings.max_time_limit_seconds),
            request
                .retry_window_hours
                .unwrap_or(settings.retry_window_hours),
            settings.failure_report_delay_seconds,
            run_id,
        )?;
        Self::new(operation, filters, controls)
    }

    /// Returns the operation.
    #[must_use]
    pub const fn operation(&self) -> ReconfigurationOperation {
        self.operation
    }

    /// Returns the filters.
    #[must_use]
    pub fn filters(&self) -> &[TaskFilter] {
        &self.filters
    }

    /// Returns the batch controls.
    #[must_use]
    pub const fn controls(&self) -> &BatchControls {
        &self.controls
    }

    /// Returns the run identifier.
    #[must_use]
    pub const fn run_id(&self) -> &RunId {
        self.controls.run_id()
    }

    /// Returns the case filter, if any.
    #[must_use]
    pub fn case_ids(&self) -> Option<&[CaseId]> {
        self.filters.iter().find_map(|filter| match filter {
            TaskFilter::CaseIdIn(case_ids) => Some(case_ids.as_slice()),
            TaskFilter::ReconfigureRequestTimeAfter(_) => None,
        })
    }

    /// Returns the explicit lower bound on the request time, if any.
    #[must_use]
    pub fn requested_after(&self) -> Option<DateTime<Utc>> {
        self.filters.iter().find_map(|filter| match filter {
            TaskFilter::ReconfigureRequestTimeAfter(after) => Some(*after),
            TaskFilter::CaseIdIn(_) => None,
        })
    }
}
