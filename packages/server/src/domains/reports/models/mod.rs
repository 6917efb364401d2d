pub mod action;
pub mod enums;
pub mod need;
pub mod person;
pub mod report;

pub use action::ReportAction;
pub use enums::*;
pub use need::ReportNeed;
pub use person::ReportPerson;
pub use report::{
    count_by_type, count_unresolved_by_urgency, ExportFilter, NewReport, Report, ReportFilter,
    SortField, SortOrder, StatsSummary, StatusChanges,
};
