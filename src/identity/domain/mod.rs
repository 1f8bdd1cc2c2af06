//! Domain model for authenticated principals.

mod error;
mod principal;
mod role;

pub use error::{IdentityError, ParseRoleError, RoleMappingError};
pub use principal::{Principal, PrincipalId};
pub use role::Role;
