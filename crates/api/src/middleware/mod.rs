//! Authentication and authorization middleware extractors.
//!
//! - [`auth::AuthUser`] -- Extracts the authenticated tenant member from a JWT Bearer token.
//! - [`rbac::RequirePrivileged`] -- Requires the `owner` or `admin` role.

pub mod auth;
pub mod rbac;
