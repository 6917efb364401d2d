pub mod create_report;
pub mod queries;
pub mod update_status;

pub use create_report::{create_report, initial_status, CreatedReport, ReportSource, DEFAULT_LOCATION};
pub use queries::{
    dashboard_stats, get_report_detail, list_reports, with_relations, DashboardStats,
    ReportDetail, ReportListItem,
};
pub use update_status::{update_report_status, StatusUpdate, StatusUpdated};
