//! Chat state domain - multi-turn report collection.
//!
//! A sender has at most one open conversation. It exists only while a
//! critical field is missing and expires after an hour of silence.

pub mod models;

pub use models::{is_critical, ChatState, ConversationState, CRITICAL_FIELDS, STATE_TTL_MINUTES};
