// Emergency Disaster Response - report intake API core
//
// Turns WhatsApp messages and web form submissions into structured disaster
// reports, alerts operators over Telegram, and serves the coordination
// dashboard API.

pub mod common;
pub mod config;
pub mod domains;
pub mod kernel;
pub mod server;

pub use config::*;
