//! Principal resolution from verified identity-provider claims.
//!
//! Token signature, expiry and issuer checks happen upstream. This module
//! trusts its input and only normalizes the subject and role claims into a
//! [`domain::Principal`] used by the task services for authorization.
//!
//! - Domain types in [`domain`]
//! - Claims resolution and role mapping in [`services`]

pub mod domain;
pub mod services;

#[cfg(test)]
mod tests;
