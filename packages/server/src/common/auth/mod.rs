// Authorization primitives shared by middleware and route handlers

pub mod errors;

pub use errors::AuthError;

use crate::domains::users::models::UserRole;

/// Fail with `InsufficientPermissions` unless `role` is one of `allowed`.
pub fn require_role(role: UserRole, allowed: &[UserRole]) -> Result<(), AuthError> {
    if allowed.contains(&role) {
        Ok(())
    } else {
        Err(AuthError::InsufficientPermissions)
    }
}
