//! Identifier and validated scalar types for the task domain.

use super::TaskDomainError;
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Unique identifier for an internal task record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TaskId(Uuid);

impl TaskId {
    /// Creates a new random task identifier.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Creates a task identifier from an existing UUID.
    #[must_use]
    pub const fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// Returns the wrapped UUID.
    #[must_use]
    pub const fn into_inner(self) -> Uuid {
        self.0
    }
}

impl Default for TaskId {
    fn default() -> Self {
        Self::new()
    }
}

impl AsRef<Uuid> for TaskId {
    fn as_ref(&self) -> &Uuid {
        &self.0
    }
}

impl fmt::Display for TaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Reference of the case record a task belongs to.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CaseId(String);

impl CaseId {
    /// Creates a validated case identifier.
    ///
    /// # Errors
    ///
    /// Returns [`TaskDomainError::InvalidCaseId`] when the value is empty or
    /// contains whitespace.
    pub fn new(value: impl Into<String>) -> Result<Self, TaskDomainError> {
        let raw = value.into();
        let normalized = raw.trim();
        if normalized.is_empty() || normalized.chars().any(char::is_whitespace) {
            return Err(TaskDomainError::InvalidCaseId(raw));
        }
        Ok(Self(normalized.to_owned()))
    }

    /// Returns the case identifier as `str`.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl AsRef<str> for CaseId {
    fn as_ref(&self) -> &str {
        self.as_str()
    }
}

impl fmt::Display for CaseId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

const SYSTEM_ACTOR: &str = "caseflow-system";

/// Identifier of a user or system actor.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ActorId(String);

impl ActorId {
    /// Creates a validated actor identifier.
    ///
    /// # Errors
    ///
    /// Returns [`TaskDomainError::EmptyActorId`] when the value is empty
    /// after trimming.
    pub fn new(value: impl Into<String>) -> Result<Self, TaskDomainError> {
        let raw = value.into();
        let normalized = raw.trim();
        if normalized.is_empty() {
            return Err(TaskDomainError::EmptyActorId);
        }
        Ok(Self(normalized.to_owned()))
    }

    /// Returns the identifier the platform records on its own mutations.
    #[must_use]
    pub fn system() -> Self {
        Self(SYSTEM_ACTOR.to_owned())
    }

    /// Returns the actor identifier as `str`.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl AsRef<str> for ActorId {
    fn as_ref(&self) -> &str {
        self.as_str()
    }
}

impl fmt::Display for ActorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Jurisdiction, case type and case id a task is classified under.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CaseScope {
    jurisdiction: String,
    case_type: String,
    case_id: CaseId,
}

impl CaseScope {
    /// Creates a case scope from validated components.
    ///
    /// # Errors
    ///
    /// Returns [`TaskDomainError::EmptyJurisdiction`] or
    /// [`TaskDomainError::EmptyCaseType`] when either value is blank.
    pub fn new(
        jurisdiction: impl Into<String>,
        case_type: impl Into<String>,
        case_id: CaseId,
    ) -> Result<Self, TaskDomainError> {
        let jurisdiction = normalized(jurisdiction.into(), TaskDomainError::EmptyJurisdiction)?;
        let case_type = normalized(case_type.into(), TaskDomainError::EmptyCaseType)?;
        Ok(Self {
            jurisdiction,
            case_type,
            case_id,
        })
    }

    /// Creates a case scope from raw external values.
    ///
    /// # Errors
    ///
    /// Returns a [`TaskDomainError`] when any component is invalid.
    pub fn from_parts(
        jurisdiction: &str,
        case_type: &str,
        case_id: &str,
    ) -> Result<Self, TaskDomainError> {
        Self::new(jurisdiction, case_type, CaseId::new(case_id)?)
    }

    /// Returns the jurisdiction.
    #[must_use]
    pub fn jurisdiction(&self) -> &str {
        &self.jurisdiction
    }

    /// Returns the case type.
    #[must_use]
    pub fn case_type(&self) -> &str {
        &self.case_type
    }

    /// Returns the case identifier.
    #[must_use]
    pub const fn case_id(&self) -> &CaseId {
        &self.case_id
    }
}

impl fmt::Display for CaseScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}/{}", self.jurisdiction, self.case_type, self.case_id)
    }
}

fn normalized(value: String, empty_error: TaskDomainError) -> Result<String, TaskDomainError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(empty_error);
    }
    Ok(trimmed.to_owned())
}
