//! Media domain - photos, voice notes and documents attached to reports.

pub mod models;
pub mod pending;
pub mod storage;

pub use models::{MediaType, NewReportMedia, ReportMedia};
pub use pending::{store_pending_media, PendingMedia};
pub use storage::{format_bytes, MediaStorage, StorageStats, StoredFile};
