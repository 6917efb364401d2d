//! Typed ID definitions for all domain entities.

pub use super::id::Id;

// ============================================================================
// Entity marker types
// ============================================================================

pub struct User;
pub struct Report;
pub struct ReportPerson;
pub struct ReportNeed;
pub struct ReportAction;
pub struct ReportMedia;
pub struct AuditLog;

// ============================================================================
// Type aliases - the primary API
// ============================================================================

pub type UserId = Id<User>;
pub type ReportId = Id<Report>;
pub type PersonId = Id<ReportPerson>;
pub type NeedId = Id<ReportNeed>;
pub type ActionId = Id<ReportAction>;
pub type MediaId = Id<ReportMedia>;
pub type AuditLogId = Id<AuditLog>;
