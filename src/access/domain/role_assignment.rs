//! Role assignments held by actors, as supplied by the role assignment store.

use super::AccessDomainError;
use crate::task::domain::{ActorId, CaseId, CaseScope, RoleCategory, SecurityClassification};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

/// How the scope attributes of an assignment must match a task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum GrantType {
    /// Broad grant matched on jurisdiction and case type.
    Standard,
    /// Grant for a single case.
    Specific,
    /// Challenged access requiring a shared authorisation tag.
    Challenged,
    /// Exclusion that revokes every other grant on a match.
    Excluded,
    /// Organisational grant matched on jurisdiction and case type.
    Organisation,
}

impl GrantType {
    /// Returns the canonical storage representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Standard => "STANDARD",
            Self::Specific => "SPECIFIC",
            Self::Challenged => "CHALLENGED",
            Self::Excluded => "EXCLUDED",
            Self::Organisation => "ORGANISATION",
        }
    }
}

impl TryFrom<&str> for GrantType {
    type Error = AccessDomainError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value.trim().to_ascii_uppercase().as_str() {
            "STANDARD" => Ok(Self::Standard),
            "SPECIFIC" => Ok(Self::Specific),
            "CHALLENGED" => Ok(Self::Challenged),
            "EXCLUDED" => Ok(Self::Excluded),
            "ORGANISATION" => Ok(Self::Organisation),
            _ => Err(AccessDomainError::UnknownGrantType(value.to_owned())),
        }
    }
}

impl fmt::Display for GrantType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Whether an assignment is organisational or tied to a case.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RoleType {
    /// Organisational role.
    Organisation,
    /// Case role.
    Case,
}

impl TryFrom<&str> for RoleType {
    type Error = AccessDomainError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value.trim().to_ascii_uppercase().as_str() {
            "ORGANISATION" => Ok(Self::Organisation),
            "CASE" => Ok(Self::Case),
            _ => Err(AccessDomainError::UnknownRoleType(value.to_owned())),
        }
    }
}

/// Scope attributes of an assignment. Absent attributes are unrestricted.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoleScope {
    /// Jurisdiction restriction.
    pub jurisdiction: Option<String>,
    /// Case type restriction.
    pub case_type: Option<String>,
    /// Case restriction.
    pub case_id: Option<CaseId>,
    /// Region restriction.
    pub region: Option<String>,
}

impl RoleScope {
    /// Returns a scope covering exactly one case.
    #[must_use]
    pub fn for_case(case: &CaseScope) -> Self {
        Self {
            jurisdiction: Some(case.jurisdiction().to_owned()),
            case_type: Some(case.case_type().to_owned()),
            case_id: Some(case.case_id().clone()),
            region: None,
        }
    }

    /// Returns a scope covering every case of a jurisdiction and case type.
    #[must_use]
    pub fn for_case_type(jurisdiction: &str, case_type: &str) -> Self {
        Self {
            jurisdiction: Some(jurisdiction.to_owned()),
            case_type: Some(case_type.to_owned()),
            case_id: None,
            region: None,
        }
    }
}

/// A role held by an actor, read from the role assignment store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoleAssignment {
    actor_id: ActorId,
    role_name: String,
    role_category: Option<RoleCategory>,
    grant_type: GrantType,
    role_type: RoleType,
    classification: SecurityClassification,
    scope: RoleScope,
    authorisations: BTreeSet<String>,
    begin_time: Option<DateTime<Utc>>,
    end_time: Option<DateTime<Utc>>,
}

impl RoleAssignment {
    /// Creates an unbounded, public assignment with the given scope.
    ///
    /// # Errors
    ///
    /// Returns [`AccessDomainError::EmptyRoleName`] when the role name is
    /// blank.
    pub fn new(
        actor_id: ActorId,
        role_name: impl Into<String>,
        grant_type: GrantType,
        role_type: RoleType,
        scope: RoleScope,
    ) -> Result<Self, AccessDomainError> {
        let raw = role_name.into();
        let role_name = raw.trim();
        if role_name.is_empty() {
            return Err(AccessDomainError::EmptyRoleName);
        }
        Ok(Self {
            actor_id,
            role_name: role_name.to_owned(),
            role_category: None,
            grant_type,
            role_type,
            classification: SecurityClassification::Public,
            scope,
            authorisations: BTreeSet::new(),
            begin_time: None,
            end_time: None,
        })
    }

    /// Sets the role category.
    #[must_use]
    pub const fn with_role_category(mut self, role_category: RoleCategory) -> Self {
        self.role_category = Some(role_category);
        self
    }

    /// Sets the security classification the holder is cleared for.
    #[must_use]
    pub const fn with_classification(mut self, classification: SecurityClassification) -> Self {
        self.classification = classification;
        self
    }

    /// Sets the authorisation tags.
    #[must_use]
    pub fn with_authorisations(mut self, authorisations: impl IntoIterator<Item = String>) -> Self {
        self.authorisations = authorisations.into_iter().collect();
        self
    }

    /// Restricts the assignment to a region.
    #[must_use]
    pub fn with_region(mut self, region: impl Into<String>) -> Self {
        self.scope.region = Some(region.into());
        self
    }

    /// Sets the validity window. Either bound may be open.
    ///
    /// # Errors
    ///
    /// Returns [`AccessDomainError::InvertedValidity`] when `end` precedes
    /// `begin`.
    pub fn with_validity(
        mut self,
        begin: Option<DateTime<Utc>>,
        end: Option<DateTime<Utc>>,
    ) -> Result<Self, AccessDomainError> {
        if let (Some(from), Some(until)) = (begin, end) {
            if until < from {
                return Err(AccessDomainError::InvertedValidity);
            }
        }
        self.begin_time = begin;
        self.end_time = end;
        Ok(self)
    }

    /// Returns the actor holding the assignment.
    #[must_use]
    pub const fn actor_id(&self) -> &ActorId {
        &self.actor_id
    }

    /// Returns the role name.
    #[must_use]
    pub fn role_name(&self) -> &str {
        &self.role_name
    }

    /// Returns the role category, if any.
    #[must_use]
    pub const fn role_category(&self) -> Option<RoleCategory> {
        self.role_category
    }

    /// Returns the grant type.
    #[must_use]
    pub const fn grant_type(&self) -> GrantType {
        self.grant_type
    }

    /// Returns the role type.
    #[must_use]
    pub const fn role_type(&self) -> RoleType {
        self.role_type
    }

    /// Returns the security classification.
    #[must_use]
    pub const fn classification(&self) -> SecurityClassification {
        self.classification
    }

    /// Returns the scope attributes.
    #[must_use]
    pub const fn scope(&self) -> &RoleScope {
        &self.scope
    }

    /// Returns the authorisation tags.
    #[must_use]
    pub const fn authorisations(&self) -> &BTreeSet<String> {
        &self.authorisations
    }

    /// Returns whether `now` falls inside the validity window.
    #[must_use]
    pub fn is_valid_at(&self, now: DateTime<Utc>) -> bool {
        self.begin_time.is_none_or(|begin| begin <= now)
            && self.end_time.is_none_or(|end| now <= end)
    }
}
