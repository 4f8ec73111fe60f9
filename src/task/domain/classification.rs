//! Security classification and role category value types.

use super::ParseTaskValueError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Security classification of a case, ordered from least to most sensitive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SecurityClassification {
    /// Publicly visible case data.
    Public,
    /// Restricted to parties and staff.
    Private,
    /// Highly restricted case data.
    Restricted,
}

impl SecurityClassification {
    /// Returns the canonical storage representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Public => "PUBLIC",
            Self::Private => "PRIVATE",
            Self::Restricted => "RESTRICTED",
        }
    }

    /// Returns whether a holder cleared at `self` may see data classified at
    /// `required`.
    #[must_use]
    pub fn covers(self, required: Self) -> bool {
        self >= required
    }
}

impl TryFrom<&str> for SecurityClassification {
    type Error = ParseTaskValueError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value.trim().to_ascii_uppercase().as_str() {
            "PUBLIC" => Ok(Self::Public),
            "PRIVATE" => Ok(Self::Private),
            "RESTRICTED" => Ok(Self::Restricted),
            _ => Err(ParseTaskValueError::new("security classification", value)),
        }
    }
}

impl fmt::Display for SecurityClassification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Organisational category of a role.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RoleCategory {
    /// Judges and tribunal members.
    Judicial,
    /// Legal officers and caseworkers.
    LegalOperations,
    /// Administrative staff.
    Admin,
    /// Courts and tribunals service centre staff.
    Ctsc,
}

impl RoleCategory {
    /// Returns the canonical storage representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Judicial => "JUDICIAL",
            Self::LegalOperations => "LEGAL_OPERATIONS",
            Self::Admin => "ADMIN",
            Self::Ctsc => "CTSC",
        }
    }
}

impl TryFrom<&str> for RoleCategory {
    type Error = ParseTaskValueError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value.trim().to_ascii_uppercase().as_str() {
            "JUDICIAL" => Ok(Self::Judicial),
            "LEGAL_OPERATIONS" => Ok(Self::LegalOperations),
            "ADMIN" => Ok(Self::Admin),
            "CTSC" => Ok(Self::Ctsc),
            _ => Err(ParseTaskValueError::new("role category", value)),
        }
    }
}

impl fmt::Display for RoleCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
