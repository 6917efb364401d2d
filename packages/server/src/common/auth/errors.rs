use thiserror::Error;

/// Authorization errors for the dashboard API
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthError {
    #[error("No token provided")]
    MissingToken,

    #[error("Invalid token")]
    InvalidToken,

    #[error("Token expired")]
    TokenExpired,

    #[error("User not found")]
    UserNotFound,

    #[error("User is inactive")]
    InactiveUser,

    #[error("Insufficient permissions")]
    InsufficientPermissions,
}

impl AuthError {
    /// Inactive accounts and role failures are 403; everything else is 401.
    pub fn is_forbidden(&self) -> bool {
        matches!(self, AuthError::InactiveUser | AuthError::InsufficientPermissions)
    }
}
