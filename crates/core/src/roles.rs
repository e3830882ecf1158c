//! Well-known tenant member role constants.
//!
//! These must match the `CHECK` constraint on `tenant_members.role`.

pub const ROLE_OWNER: &str = "owner";
pub const ROLE_ADMIN: &str = "admin";
pub const ROLE_MEMBER: &str = "member";

/// All valid role names.
pub const VALID_ROLES: &[&str] = &[ROLE_OWNER, ROLE_ADMIN, ROLE_MEMBER];

/// Whether the role may perform privileged actions (cancellation, refunds,
/// administrative jobs, exports).
pub fn is_privileged(role: &str) -> bool {
    role == ROLE_OWNER || role == ROLE_ADMIN
}
