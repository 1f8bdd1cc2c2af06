//! Resolution of verified token claims into a [`Principal`].

use super::mapping::RoleMapping;
use crate::identity::domain::{IdentityError, Principal, PrincipalId, Role, RoleMappingError};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use tracing::debug;

/// Claim layout of the identity provider.
///
/// Deserialized from the `identity` section of the application
/// configuration; every field has a default matching a Keycloak-style token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClaimsConfig {
    /// Claim holding the stable subject identifier.
    pub subject_claim: String,
    /// Dotted paths to claims holding role names, read in order.
    pub role_claim_paths: Vec<String>,
    /// Prefix stripped from role names before lookup (for example `ROLE_`).
    pub role_prefix: String,
    /// Additional external role names and the internal role they grant.
    pub role_mapping: BTreeMap<String, Role>,
}

impl Default for ClaimsConfig {
    fn default() -> Self {
        Self {
            subject_claim: "sub".to_owned(),
            role_claim_paths: vec!["realm_access.roles".to_owned(), "roles".to_owned()],
            role_prefix: "role_".to_owned(),
            role_mapping: BTreeMap::new(),
        }
    }
}

/// Stateless resolver turning verified claims into principals.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClaimsResolver {
    subject_claim: String,
    role_claim_paths: Vec<Vec<String>>,
    mapping: RoleMapping,
}

impl ClaimsResolver {
    /// Validates `config` and builds a resolver.
    ///
    /// # Errors
    ///
    /// Returns [`RoleMappingError`] when the subject claim is blank, no role
    /// claim path is configured, a path has an empty segment, or the role
    /// mapping table is inconsistent.
    pub fn new(config: &ClaimsConfig) -> Result<Self, RoleMappingError> {
        let subject_claim = config.subject_claim.trim();
        if subject_claim.is_empty() {
            return Err(RoleMappingError::BlankSubjectClaim);
        }
        if config.role_claim_paths.is_empty() {
            return Err(RoleMappingError::NoRoleClaimPaths);
        }

        let role_claim_paths = config
            .role_claim_paths
            .iter()
            .map(|path| parse_claim_path(path))
            .collect::<Result<Vec<_>, _>>()?;
        let mapping = RoleMapping::new(&config.role_prefix, &config.role_mapping)?;

        Ok(Self {
            subject_claim: subject_claim.to_owned(),
            role_claim_paths,
            mapping,
        })
    }

    /// Resolves a principal from a verified claim set.
    ///
    /// Unmapped role names are ignored. A claim set without any mapped role
    /// yields a principal holding only the default role.
    ///
    /// # Errors
    ///
    /// Returns [`IdentityError::MissingSubject`] when the subject claim is
    /// absent and [`IdentityError::InvalidSubject`] when it is not a
    /// non-blank string.
    pub fn resolve(&self, claims: &Map<String, Value>) -> Result<Principal, IdentityError> {
        let id = self.subject(claims)?;
        let mut roles = Vec::new();
        for raw in self.raw_roles(claims) {
            match self.mapping.lookup(raw) {
                Some(role) => roles.push(role),
                None => debug!(subject = %id, role = raw, "ignoring unmapped role claim"),
            }
        }

        if roles.is_empty() {
            debug!(subject = %id, "no mapped roles in claims, assigning default role");
        }
        Ok(Principal::new(id, roles))
    }

    /// Resolves a principal from a claim set held as a JSON value.
    ///
    /// # Errors
    ///
    /// Returns [`IdentityError::MissingSubject`] when `claims` is not a JSON
    /// object, otherwise the errors of [`Self::resolve`].
    pub fn resolve_value(&self, claims: &Value) -> Result<Principal, IdentityError> {
        match claims {
            Value::Object(map) => self.resolve(map),
            _ => Err(IdentityError::MissingSubject {
                claim: self.subject_claim.clone(),
            }),
        }
    }

    fn subject(&self, claims: &Map<String, Value>) -> Result<PrincipalId, IdentityError> {
        let invalid = || IdentityError::InvalidSubject {
            claim: self.subject_claim.clone(),
        };
        match claims.get(&self.subject_claim) {
            None | Some(Value::Null) => Err(IdentityError::MissingSubject {
                claim: self.subject_claim.clone(),
            }),
            Some(Value::String(subject)) => PrincipalId::new(subject.as_str()).map_err(|_| invalid()),
            Some(_) => Err(invalid()),
        }
    }

    fn raw_roles<'a>(&self, claims: &'a Map<String, Value>) -> Vec<&'a str> {
        self.role_claim_paths
            .iter()
            .filter_map(|path| lookup_path(claims, path))
            .flat_map(|value| match value {
                Value::Array(items) => items.iter().filter_map(Value::as_str).collect(),
                Value::String(single) => vec![single.as_str()],
                _ => Vec::new(),
            })
            .collect()
    }
}

fn parse_claim_path(path: &str) -> Result<Vec<String>, RoleMappingError> {
    let segments: Vec<String> = path.trim().split('.').map(str::to_owned).collect();
    if segments.iter().any(String::is_empty) {
        return Err(RoleMappingError::InvalidClaimPath(path.to_owned()));
    }
    Ok(segments)
}

fn lookup_path<'a>(claims: &'a Map<String, Value>, path: &[String]) -> Option<&'a Value> {
    let (first, rest) = path.split_first()?;
    rest.iter()
        .try_fold(claims.get(first)?, |value, segment| value.get(segment.as_str()))
}
