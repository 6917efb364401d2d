//! Audit domain - who changed what, recorded alongside the change itself.

pub mod models;

pub use models::{AuditAction, AuditLog, AuditLogWithUser, NewAuditLog};
