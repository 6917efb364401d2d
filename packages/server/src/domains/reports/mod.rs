//! Reports domain - victim (KORBAN) and needs (KEBUTUHAN) incident records.

pub mod actions;
pub mod export;
pub mod models;
pub mod report_number;

pub use models::{
    ExportFilter, Report, ReportFilter, ReportStatus, ReportType, SortField, SortOrder, Urgency,
};
