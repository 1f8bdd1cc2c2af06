//! Claims resolution services.

mod mapping;
mod resolver;

pub use mapping::{RoleMapping, normalize_role_name};
pub use resolver::{ClaimsConfig, ClaimsResolver};
