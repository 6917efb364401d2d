//! Users domain - reporters and dashboard accounts.
//!
//! Every WhatsApp sender becomes a `PUBLIC` user on first contact; admins
//! promote them to volunteers or raise their trust level, which gates
//! auto-verification of their reports.

pub mod models;

pub use models::{NewUser, User, UserChanges, UserRole, UserSummary, UserWithReportCount};
