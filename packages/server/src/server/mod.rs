// HTTP server setup (Axum)
pub mod app;
pub mod error;
pub mod middleware;
pub mod response;
pub mod routes;

pub use app::*;
pub use error::{ApiError, ApiResult};
pub use response::ApiResponse;
