// HTTP routes
pub mod auth;
pub mod dashboard;
pub mod health;
pub mod media;
pub mod reports;
pub mod users;
pub mod webhook;

pub use auth::*;
pub use dashboard::*;
pub use health::*;
pub use media::*;
pub use reports::*;
pub use users::*;
pub use webhook::*;
