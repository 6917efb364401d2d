//! Server dependencies for the intake pipeline and API (using traits for testability)
//!
//! This module provides the central dependency container used by all domain actions.
//! All external services use trait abstractions to enable testing.

use anyhow::{Context, Result};
use async_trait::async_trait;
use ollama_client::{GenerateRequest, OllamaClient};
use sqlx::PgPool;
use std::sync::Arc;
use telegram::{ParseMode, TelegramService};
use tracing::warn;
use whatsapp::WhatsAppService;

use crate::domains::auth::JwtService;
use crate::domains::extraction::ReportExtractor;
use crate::domains::media::MediaStorage;
use crate::kernel::{BaseLlm, BaseTelegramService, BaseWhatsAppService, DownloadedMedia};

// =============================================================================
// OllamaClient Adapter (implements BaseLlm trait)
// =============================================================================

pub struct OllamaAdapter {
    client: OllamaClient,
    model: String,
}

impl OllamaAdapter {
    pub fn new(client: OllamaClient, model: impl Into<String>) -> Self {
        Self {
            client,
            model: model.into(),
        }
    }
}

#[async_trait]
impl BaseLlm for OllamaAdapter {
    async fn generate(&self, prompt: &str) -> Result<String> {
        let response = self
            .client
            .generate(GenerateRequest::new(&self.model, prompt))
            .await
            .map_err(|e| anyhow::anyhow!("{}", e))?;
        Ok(response.response)
    }

    async fn health(&self) -> Result<bool> {
        let tags = self
            .client
            .list_models()
            .await
            .map_err(|e| anyhow::anyhow!("{}", e))?;
        Ok(tags.has_model_family(&self.model))
    }
}

// =============================================================================
// WhatsAppService Adapter (implements BaseWhatsAppService trait)
// =============================================================================

/// Primary Cloud API sender with an optional second number that takes over
/// outbound text when the primary fails. Read receipts and media always go
/// through the primary, which received the message.
pub struct WhatsAppAdapter {
    primary: Arc<WhatsAppService>,
    fallback: Option<Arc<WhatsAppService>>,
}

impl WhatsAppAdapter {
    pub fn new(primary: Arc<WhatsAppService>, fallback: Option<Arc<WhatsAppService>>) -> Self {
        Self { primary, fallback }
    }
}

#[async_trait]
impl BaseWhatsAppService for WhatsAppAdapter {
    async fn send_text(&self, to: &str, body: &str) -> Result<Option<String>> {
        let primary_error = match self.primary.send_text(to, body).await {
            Ok(response) => return Ok(response.message_id().map(str::to_string)),
            Err(e) => e,
        };

        let Some(fallback) = &self.fallback else {
            return Err(anyhow::anyhow!("{}", primary_error));
        };

        warn!(phone = %to, error = %primary_error, "Primary WhatsApp sender failed, using fallback");
        fallback
            .send_text(to, body)
            .await
            .map(|response| response.message_id().map(str::to_string))
            .map_err(|e| anyhow::anyhow!("{}", e))
    }

    async fn mark_as_read(&self, message_id: &str) -> Result<()> {
        self.primary
            .mark_as_read(message_id)
            .await
            .map_err(|e| anyhow::anyhow!("{}", e))
    }

    async fn fetch_media(&self, media_id: &str, max_bytes: u64) -> Result<DownloadedMedia> {
        let info = self
            .primary
            .get_media(media_id)
            .await
            .map_err(|e| anyhow::anyhow!("{}", e))
            .context("Failed to look up media")?;
        if let Some(size) = info.file_size.filter(|size| *size > max_bytes) {
            anyhow::bail!(
                "Media {} is {} bytes, limit is {} bytes",
                media_id,
                size,
                max_bytes
            );
        }
        let bytes = self
            .primary
            .download_media(&info.url, max_bytes)
            .await
            .map_err(|e| anyhow::anyhow!("{}", e))
            .context("Failed to download media")?;

        Ok(DownloadedMedia {
            bytes: bytes.to_vec(),
            mime_type: info.mime_type,
            sha256: info.sha256,
        })
    }

    async fn health_check(&self) -> Result<String> {
        let info = self
            .primary
            .phone_number_info()
            .await
            .map_err(|e| anyhow::anyhow!("{}", e))?;
        Ok(info
            .display_phone_number
            .unwrap_or_else(|| self.primary.phone_number_id().to_string()))
    }
}

// =============================================================================
// TelegramService Adapter (implements BaseTelegramService trait)
// =============================================================================

pub struct TelegramAdapter {
    service: Arc<TelegramService>,
    admin_chat_id: String,
}

impl TelegramAdapter {
    pub fn new(service: Arc<TelegramService>, admin_chat_id: impl Into<String>) -> Self {
        Self {
            service,
            admin_chat_id: admin_chat_id.into(),
        }
    }
}

#[async_trait]
impl BaseTelegramService for TelegramAdapter {
    async fn send_alert(&self, html: &str) -> Result<()> {
        self.service
            .send_message(&self.admin_chat_id, html, Some(ParseMode::Html))
            .await
            .map(|_| ())
            .map_err(|e| anyhow::anyhow!("{}", e))
    }

    async fn health_check(&self) -> Result<String> {
        let bot = self
            .service
            .get_me()
            .await
            .map_err(|e| anyhow::anyhow!("{}", e))?;
        Ok(bot.username.unwrap_or_default())
    }
}

// =============================================================================
// ServerDeps
// =============================================================================

/// Report-creation policy knobs
#[derive(Debug, Clone, Default)]
pub struct IntakeSettings {
    /// Reporters at or above this trust level are auto-verified
    pub auto_verify_trust_level: i32,
    /// Phone number that critical reports are assigned to on creation
    pub auto_assign_critical_to: Option<String>,
}

/// Dashboard login policy
#[derive(Debug, Clone, Default)]
pub struct AuthSettings {
    pub admin_password: Option<String>,
    /// Admins may log in without a password (development only)
    pub allow_passwordless_admin: bool,
}

/// Server dependencies accessible to actions and routes (using traits for testability)
#[derive(Clone)]
pub struct ServerDeps {
    pub db_pool: PgPool,
    pub extractor: Arc<ReportExtractor>,
    pub whatsapp: Arc<dyn BaseWhatsAppService>,
    pub telegram: Arc<dyn BaseTelegramService>,
    pub media_storage: Arc<MediaStorage>,
    /// JWT service for token creation
    pub jwt_service: Arc<JwtService>,
    pub intake: IntakeSettings,
    pub auth: AuthSettings,
}

impl ServerDeps {
    /// Create new ServerDeps with the given dependencies
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        db_pool: PgPool,
        extractor: Arc<ReportExtractor>,
        whatsapp: Arc<dyn BaseWhatsAppService>,
        telegram: Arc<dyn BaseTelegramService>,
        media_storage: Arc<MediaStorage>,
        jwt_service: Arc<JwtService>,
        intake: IntakeSettings,
        auth: AuthSettings,
    ) -> Self {
        Self {
            db_pool,
            extractor,
            whatsapp,
            telegram,
            media_storage,
            jwt_service,
            intake,
            auth,
        }
    }
}
