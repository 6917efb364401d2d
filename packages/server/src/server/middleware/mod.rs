// HTTP middleware
pub mod jwt_auth;
pub mod rate_limit;

pub use jwt_auth::*;
pub use rate_limit::*;
