//! Auth domain - dashboard authentication
//!
//! Responsibilities:
//! - Login against the shared admin password
//! - First-run admin bootstrap
//! - JWT token management

pub mod actions;
pub mod jwt;

pub use actions::{login, setup_admin, LoginResult, SetupAdminResult};
pub use jwt::{Claims, JwtService};
