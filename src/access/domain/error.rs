//! Error types for access domain parsing and validation.

use thiserror::Error;

/// Errors returned while constructing role assignment values.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum AccessDomainError {
    /// The role name is empty after trimming.
    #[error("role name must not be empty")]
    EmptyRoleName,

    /// The grant type value is unsupported.
    #[error("unknown grant type: {0}")]
    UnknownGrantType(String),

    /// The role type value is unsupported.
    #[error("unknown role type: {0}")]
    UnknownRoleType(String),

    /// The validity window ends before it begins.
    #[error("role assignment validity ends before it begins")]
    InvertedValidity,
}
