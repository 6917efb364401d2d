//! Extraction domain - free text to structured report data.
//!
//! A single prompt-and-parse call against the LLM, with keyword matching as
//! the fallback path.

pub mod fallback;
pub mod follow_up;
pub mod parse;
pub mod prompt;
pub mod service;
pub mod types;

pub use fallback::rule_based_extract;
pub use follow_up::follow_up_question;
pub use service::{ExtractionUnavailable, LlmHealth, ReportExtractor};
pub use types::{ExtractedNeed, ExtractedPerson, ExtractedReport, Intent};
