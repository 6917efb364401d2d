// Trait definitions for dependency injection
//
// These are INFRASTRUCTURE traits only - no business logic.
// Business logic (like "extract a report") lives in domain functions that use these traits.
//
// Naming convention: Base* for trait names (e.g., BaseLlm, BaseWhatsAppService)

use anyhow::Result;
use async_trait::async_trait;

// =============================================================================
// LLM Trait (Infrastructure - text completion)
// =============================================================================

#[async_trait]
pub trait BaseLlm: Send + Sync {
    /// Complete a prompt (returns raw text response)
    async fn generate(&self, prompt: &str) -> Result<String>;

    /// Reachability check. `Ok(true)` when the configured model is installed.
    async fn health(&self) -> Result<bool>;
}

// =============================================================================
// WhatsApp Trait (Infrastructure - outbound messaging and media)
// =============================================================================

/// Media bytes fetched from WhatsApp along with what the API reported about them
#[derive(Debug, Clone)]
pub struct DownloadedMedia {
    pub bytes: Vec<u8>,
    pub mime_type: String,
    /// Hex digest as reported by the media lookup, if any
    pub sha256: Option<String>,
}

#[async_trait]
pub trait BaseWhatsAppService: Send + Sync {
    /// Send a plain text message. Returns the provider message id when known.
    async fn send_text(&self, to: &str, body: &str) -> Result<Option<String>>;

    async fn mark_as_read(&self, message_id: &str) -> Result<()>;

    /// Resolve a media id and download its content, refusing anything
    /// larger than `max_bytes`.
    async fn fetch_media(&self, media_id: &str, max_bytes: u64) -> Result<DownloadedMedia>;

    /// Returns the sender's display phone number.
    async fn health_check(&self) -> Result<String>;
}

// =============================================================================
// Telegram Trait (Infrastructure - operator alerts)
// =============================================================================

#[async_trait]
pub trait BaseTelegramService: Send + Sync {
    /// Send an HTML-formatted alert to the operator chat.
    async fn send_alert(&self, html: &str) -> Result<()>;

    /// Returns the bot's username.
    async fn health_check(&self) -> Result<String>;
}
