//! Authentication primitives.
//!
//! - [`jwt`] -- HS256 access-token generation and validation. Tokens are
//!   issued by the auth provider with the shared secret and carry the tenant.

pub mod jwt;
