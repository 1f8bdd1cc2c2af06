//! Application role vocabulary.

use super::ParseRoleError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Internal role held by a principal.
///
/// The ordering is only used to keep role sets deterministic.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    /// Offers help by joining tasks. Assigned when no other role is claimed.
    #[default]
    Volunteer,
    /// Posts and coordinates tasks.
    Organizer,
    /// Posts tasks for help they need themselves.
    AffectedPerson,
    /// Operator with rights over every task.
    Admin,
}

impl Role {
    /// All roles in declaration order.
    pub const ALL: [Self; 4] = [
        Self::Volunteer,
        Self::Organizer,
        Self::AffectedPerson,
        Self::Admin,
    ];

    /// Returns the canonical representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Volunteer => "volunteer",
            Self::Organizer => "organizer",
            Self::AffectedPerson => "affected_person",
            Self::Admin => "admin",
        }
    }

    /// Returns `true` when the role allows posting new tasks.
    #[must_use]
    pub const fn can_post_tasks(self) -> bool {
        matches!(self, Self::Organizer | Self::AffectedPerson | Self::Admin)
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<&str> for Role {
    type Error = ParseRoleError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        let normalized = value.trim().to_ascii_lowercase();
        match normalized.as_str() {
            "volunteer" => Ok(Self::Volunteer),
            "organizer" => Ok(Self::Organizer),
            "affected_person" => Ok(Self::AffectedPerson),
            "admin" => Ok(Self::Admin),
            _ => Err(ParseRoleError(value.to_owned())),
        }
    }
}
