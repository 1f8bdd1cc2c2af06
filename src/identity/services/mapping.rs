//! Declarative mapping from external role strings to internal roles.

use crate::identity::domain::{Role, RoleMappingError};
use std::collections::{BTreeMap, HashMap};

/// External role names understood without configuration.
const BUILT_IN_ROLES: [(&str, Role); 7] = [
    ("user", Role::Volunteer),
    ("volunteer", Role::Volunteer),
    ("organizer", Role::Organizer),
    ("organiser", Role::Organizer),
    ("affected_person", Role::AffectedPerson),
    ("admin", Role::Admin),
    ("administrator", Role::Admin),
];

/// Validated lookup table from normalized external role names to [`Role`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoleMapping {
    prefix: String,
    entries: HashMap<String, Role>,
}

impl RoleMapping {
    /// Builds the table from the built-in names plus configured entries.
    ///
    /// Configured entries override built-in names with the same normalized
    /// key. Keys are normalized with [`normalize_role_name`] using `prefix`.
    ///
    /// # Errors
    ///
    /// Returns [`RoleMappingError::BlankExternalRole`] when a configured key
    /// normalizes to an empty string, or
    /// [`RoleMappingError::ConflictingMapping`] when two configured keys
    /// normalize to the same name but map to different roles.
    pub fn new(prefix: &str, configured: &BTreeMap<String, Role>) -> Result<Self, RoleMappingError> {
        let normalized_prefix = normalize_token(prefix);
        let mut entries: HashMap<String, Role> = BUILT_IN_ROLES
            .iter()
            .map(|&(name, role)| (name.to_owned(), role))
            .collect();

        let mut seen: HashMap<String, Role> = HashMap::new();
        for (external, &role) in configured {
            let key = normalize_role_name(external, &normalized_prefix);
            if key.is_empty() {
                return Err(RoleMappingError::BlankExternalRole);
            }
            if let Some(&first) = seen.get(&key) {
                if first != role {
                    return Err(RoleMappingError::ConflictingMapping {
                        external: key,
                        first,
                        second: role,
                    });
                }
            }
            seen.insert(key.clone(), role);
            entries.insert(key, role);
        }

        Ok(Self {
            prefix: normalized_prefix,
            entries,
        })
    }

    /// Resolves a raw external role string.
    ///
    /// Returns `None` for names absent from the table.
    #[must_use]
    pub fn lookup(&self, raw: &str) -> Option<Role> {
        let key = normalize_role_name(raw, &self.prefix);
        self.entries.get(&key).copied()
    }

    /// Returns the number of distinct external names in the table.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` when the table has no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Normalizes an external role string for lookup.
///
/// The value is trimmed and lowercased, `-` and whitespace become `_`, and a
/// leading `prefix` (already normalized) is removed.
#[must_use]
pub fn normalize_role_name(raw: &str, prefix: &str) -> String {
    let token = normalize_token(raw);
    if prefix.is_empty() {
        return token;
    }
    match token.strip_prefix(prefix) {
        Some(stripped) => stripped.to_owned(),
        None => token,
    }
}

fn normalize_token(raw: &str) -> String {
    raw.trim()
        .chars()
        .map(|c| {
            if c == '-' || c.is_whitespace() {
                '_'
            } else {
                c.to_ascii_lowercase()
            }
        })
        .collect()
}
