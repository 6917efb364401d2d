//! Intake domain - turns inbound WhatsApp messages and web form
//! submissions into reports.

pub mod processor;
pub mod web_form;

pub use processor::{process_message, IntakeOutcome};
pub use web_form::{submit_web_report, WebReportForm, WebReportResult};
