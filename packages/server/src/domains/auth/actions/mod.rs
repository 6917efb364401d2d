//! Auth domain actions - dashboard login and first-run admin setup.

mod login;
mod setup_admin;

pub use login::{login, password_accepted, LoginResult};
pub use setup_admin::{setup_admin, SetupAdminResult};
