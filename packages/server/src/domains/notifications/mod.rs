//! Notifications domain - Telegram operator alerts and WhatsApp replies.

pub mod dispatch;
pub mod telegram;
pub mod whatsapp;

pub use dispatch::{notify_processing_error, notify_status_change, send_report_notifications};
pub use whatsapp::ErrorMessage;
