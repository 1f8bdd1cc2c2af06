//! Authenticated principal and its external identifier.

use super::{IdentityError, Role};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

/// Maximum identifier length, matching the `VARCHAR(255)` reference columns.
const MAX_PRINCIPAL_ID_LENGTH: usize = 255;

/// Stable external identifier issued by the identity provider.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct PrincipalId(String);

impl PrincipalId {
    /// Creates a validated principal identifier.
    ///
    /// Surrounding whitespace is removed.
    ///
    /// # Errors
    ///
    /// Returns [`IdentityError::BlankPrincipalId`] when the value is blank or
    /// [`IdentityError::PrincipalIdTooLong`] when it exceeds 255 characters.
    pub fn new(value: impl Into<String>) -> Result<Self, IdentityError> {
        let raw = value.into();
        let normalized = raw.trim();
        if normalized.is_empty() {
            return Err(IdentityError::BlankPrincipalId);
        }
        let length = normalized.chars().count();
        if length > MAX_PRINCIPAL_ID_LENGTH {
            return Err(IdentityError::PrincipalIdTooLong {
                max: MAX_PRINCIPAL_ID_LENGTH,
                actual: length,
            });
        }
        Ok(Self(normalized.to_owned()))
    }

    /// Returns the identifier as `str`.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for PrincipalId {
    type Error = IdentityError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<PrincipalId> for String {
    fn from(id: PrincipalId) -> Self {
        id.0
    }
}

impl AsRef<str> for PrincipalId {
    fn as_ref(&self) -> &str {
        self.as_str()
    }
}

impl fmt::Display for PrincipalId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Normalized identity and role set of an authenticated caller.
///
/// The role set is never empty: a principal built without roles holds
/// [`Role::Volunteer`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "PrincipalRecord")]
pub struct Principal {
    id: PrincipalId,
    roles: BTreeSet<Role>,
}

/// Wire form of a principal, normalized through [`Principal::new`].
#[derive(Deserialize)]
struct PrincipalRecord {
    id: PrincipalId,
    #[serde(default)]
    roles: BTreeSet<Role>,
}

impl From<PrincipalRecord> for Principal {
    fn from(record: PrincipalRecord) -> Self {
        Self::new(record.id, record.roles)
    }
}

impl Principal {
    /// Creates a principal, falling back to the default role when `roles` is
    /// empty.
    #[must_use]
    pub fn new(id: PrincipalId, roles: impl IntoIterator<Item = Role>) -> Self {
        let mut role_set: BTreeSet<Role> = roles.into_iter().collect();
        if role_set.is_empty() {
            role_set.insert(Role::default());
        }
        Self {
            id,
            roles: role_set,
        }
    }

    /// Returns the external identifier.
    #[must_use]
    pub const fn id(&self) -> &PrincipalId {
        &self.id
    }

    /// Returns the normalized role set.
    #[must_use]
    pub const fn roles(&self) -> &BTreeSet<Role> {
        &self.roles
    }

    /// Returns `true` when the principal holds `role`.
    #[must_use]
    pub fn has_role(&self, role: Role) -> bool {
        self.roles.contains(&role)
    }

    /// Returns `true` when the principal holds [`Role::Admin`].
    #[must_use]
    pub fn is_admin(&self) -> bool {
        self.has_role(Role::Admin)
    }

    /// Returns `true` when any held role allows posting tasks.
    #[must_use]
    pub fn can_post_tasks(&self) -> bool {
        self.roles.iter().any(|role| role.can_post_tasks())
    }
}
