//! Error types for principal resolution and role mapping.

use super::Role;
use crate::error::FailureKind;
use thiserror::Error;

/// Errors returned while resolving a principal from verified claims.
///
/// Callers treat every variant as an unauthenticated request.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum IdentityError {
    /// The subject claim is absent from the claim set.
    #[error("subject claim '{claim}' is missing")]
    MissingSubject {
        /// Name of the configured subject claim.
        claim: String,
    },

    /// The subject claim is present but is not a non-blank string.
    #[error("subject claim '{claim}' must be a non-blank string")]
    InvalidSubject {
        /// Name of the configured subject claim.
        claim: String,
    },

    /// A principal identifier was built from a blank string.
    #[error("principal identifier must not be blank")]
    BlankPrincipalId,

    /// A principal identifier exceeds the storage limit.
    #[error("principal identifier exceeds {max} characters (got {actual})")]
    PrincipalIdTooLong {
        /// Maximum accepted length in characters.
        max: usize,
        /// Length of the rejected identifier.
        actual: usize,
    },
}

impl IdentityError {
    /// Returns the failure kind reported to callers.
    #[must_use]
    pub const fn kind(&self) -> FailureKind {
        FailureKind::InvalidIdentity
    }
}

/// Errors returned while validating the claims configuration at startup.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum RoleMappingError {
    /// A mapping entry has a blank external role name.
    #[error("role mapping contains a blank external role name")]
    BlankExternalRole,

    /// Two external role names normalize to the same key with different roles.
    #[error("external role '{external}' maps to both {first} and {second}")]
    ConflictingMapping {
        /// Normalized external role name.
        external: String,
        /// Role from the first entry.
        first: Role,
        /// Role from the conflicting entry.
        second: Role,
    },

    /// No claim paths are configured for role extraction.
    #[error("at least one role claim path must be configured")]
    NoRoleClaimPaths,

    /// A role claim path is blank or contains an empty segment.
    #[error("invalid role claim path '{0}'")]
    InvalidClaimPath(String),

    /// The subject claim name is blank.
    #[error("subject claim name must not be blank")]
    BlankSubjectClaim,
}

/// Error returned while parsing a role from its canonical string.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("unknown role: {0}")]
pub struct ParseRoleError(pub String);
