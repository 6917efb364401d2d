// TestDependencies - mock implementations for testing
//
// Provides mock services that can be injected into ServerDeps for tests.

use anyhow::Result;
use async_trait::async_trait;
use sqlx::PgPool;
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use super::{
    AuthSettings, BaseLlm, BaseTelegramService, BaseWhatsAppService, DownloadedMedia,
    IntakeSettings, ServerDeps,
};
use crate::domains::auth::JwtService;
use crate::domains::extraction::ReportExtractor;
use crate::domains::media::MediaStorage;

pub const TEST_JWT_SECRET: &str = "test_secret_key_that_is_at_least_32_chars";
pub const TEST_JWT_ISSUER: &str = "disaster-intake-test";

// =============================================================================
// Mock LLM
// =============================================================================

#[derive(Clone)]
pub struct MockLlm {
    responses: Arc<Mutex<Vec<String>>>,
    prompts: Arc<Mutex<Vec<String>>>,
    failure: Option<String>,
}

impl MockLlm {
    pub fn new() -> Self {
        Self {
            responses: Arc::new(Mutex::new(Vec::new())),
            prompts: Arc::new(Mutex::new(Vec::new())),
            failure: None,
        }
    }

    /// Add a raw completion to the queue
    pub fn with_response(self, response: impl Into<String>) -> Self {
        self.push_response(response);
        self
    }

    /// Queue a completion on a mock that is already wired into deps
    pub fn push_response(&self, response: impl Into<String>) {
        self.responses.lock().unwrap().push(response.into());
    }

    /// Every call (including health) fails with this message
    pub fn failing(mut self, message: impl Into<String>) -> Self {
        self.failure = Some(message.into());
        self
    }

    /// Get all prompts that were sent to the LLM
    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().unwrap().clone()
    }
}

impl Default for MockLlm {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl BaseLlm for MockLlm {
    async fn generate(&self, prompt: &str) -> Result<String> {
        self.prompts.lock().unwrap().push(prompt.to_string());

        if let Some(message) = &self.failure {
            anyhow::bail!("{}", message);
        }

        let mut responses = self.responses.lock().unwrap();
        if !responses.is_empty() {
            Ok(responses.remove(0))
        } else {
            // Unknown intent keeps unscripted tests from creating reports
            Ok(r#"{"intent":"unknown","urgency":"medium","missingFields":[]}"#.to_string())
        }
    }

    async fn health(&self) -> Result<bool> {
        match &self.failure {
            Some(message) => anyhow::bail!("{}", message),
            None => Ok(true),
        }
    }
}

// =============================================================================
// Mock WhatsApp
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SentMessage {
    pub to: String,
    pub body: String,
}

#[derive(Clone)]
pub struct MockWhatsApp {
    sent: Arc<Mutex<Vec<SentMessage>>>,
    read: Arc<Mutex<Vec<String>>>,
    media: Arc<Mutex<HashMap<String, DownloadedMedia>>>,
    fail_sends: bool,
}

impl MockWhatsApp {
    pub fn new() -> Self {
        Self {
            sent: Arc::new(Mutex::new(Vec::new())),
            read: Arc::new(Mutex::new(Vec::new())),
            media: Arc::new(Mutex::new(HashMap::new())),
            fail_sends: false,
        }
    }

    /// Serve `bytes` for `media_id` (digest left for the caller to supply)
    pub fn with_media(self, media_id: &str, mime_type: &str, bytes: &[u8]) -> Self {
        self.media.lock().unwrap().insert(
            media_id.to_string(),
            DownloadedMedia {
                bytes: bytes.to_vec(),
                mime_type: mime_type.to_string(),
                sha256: None,
            },
        );
        self
    }

    /// Every send fails
    pub fn failing_sends(mut self) -> Self {
        self.fail_sends = true;
        self
    }

    pub fn sent(&self) -> Vec<SentMessage> {
        self.sent.lock().unwrap().clone()
    }

    /// Bodies sent to one recipient, in order
    pub fn sent_to(&self, phone: &str) -> Vec<String> {
        self.sent
            .lock()
            .unwrap()
            .iter()
            .filter(|m| m.to == phone)
            .map(|m| m.body.clone())
            .collect()
    }

    pub fn read_receipts(&self) -> Vec<String> {
        self.read.lock().unwrap().clone()
    }
}

impl Default for MockWhatsApp {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl BaseWhatsAppService for MockWhatsApp {
    async fn send_text(&self, to: &str, body: &str) -> Result<Option<String>> {
        if self.fail_sends {
            anyhow::bail!("WhatsApp send failed");
        }
        let mut sent = self.sent.lock().unwrap();
        sent.push(SentMessage {
            to: to.to_string(),
            body: body.to_string(),
        });
        Ok(Some(format!("wamid.mock.{}", sent.len())))
    }

    async fn mark_as_read(&self, message_id: &str) -> Result<()> {
        self.read.lock().unwrap().push(message_id.to_string());
        Ok(())
    }

    async fn fetch_media(&self, media_id: &str, max_bytes: u64) -> Result<DownloadedMedia> {
        let media = self
            .media
            .lock()
            .unwrap()
            .get(media_id)
            .cloned()
            .ok_or_else(|| anyhow::anyhow!("Unknown media id {}", media_id))?;
        if media.bytes.len() as u64 > max_bytes {
            anyhow::bail!("Media {} exceeds {} bytes", media_id, max_bytes);
        }
        Ok(media)
    }

    async fn health_check(&self) -> Result<String> {
        Ok("+62 811-0000-0000".to_string())
    }
}

// =============================================================================
// Mock Telegram
// =============================================================================

#[derive(Clone)]
pub struct MockTelegram {
    alerts: Arc<Mutex<Vec<String>>>,
}

impl MockTelegram {
    pub fn new() -> Self {
        Self {
            alerts: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn alerts(&self) -> Vec<String> {
        self.alerts.lock().unwrap().clone()
    }

    /// Check if an alert containing the given text was sent
    pub fn was_alerted_with(&self, text: &str) -> bool {
        self.alerts.lock().unwrap().iter().any(|a| a.contains(text))
    }
}

impl Default for MockTelegram {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl BaseTelegramService for MockTelegram {
    async fn send_alert(&self, html: &str) -> Result<()> {
        self.alerts.lock().unwrap().push(html.to_string());
        Ok(())
    }

    async fn health_check(&self) -> Result<String> {
        Ok("posko_test_bot".to_string())
    }
}

// =============================================================================
// TestDependencies
// =============================================================================

/// Container for all mock dependencies
pub struct TestDependencies {
    /// `None` runs extraction rule-based only
    pub llm: Option<MockLlm>,
    /// Fall back to keyword matching when the LLM fails
    pub rule_fallback: bool,
    pub whatsapp: MockWhatsApp,
    pub telegram: MockTelegram,
    pub intake: IntakeSettings,
    pub auth: AuthSettings,
}

impl TestDependencies {
    pub fn new() -> Self {
        Self {
            llm: None,
            rule_fallback: true,
            whatsapp: MockWhatsApp::new(),
            telegram: MockTelegram::new(),
            intake: IntakeSettings {
                auto_verify_trust_level: 3,
                auto_assign_critical_to: None,
            },
            auth: AuthSettings {
                admin_password: Some("test-admin-password".to_string()),
                allow_passwordless_admin: false,
            },
        }
    }

    /// Set a mock LLM
    pub fn mock_llm(mut self, llm: MockLlm) -> Self {
        self.llm = Some(llm);
        self
    }

    /// LLM failures surface as errors instead of falling back
    pub fn without_rule_fallback(mut self) -> Self {
        self.rule_fallback = false;
        self
    }

    /// Set a mock WhatsApp sender
    pub fn mock_whatsapp(mut self, whatsapp: MockWhatsApp) -> Self {
        self.whatsapp = whatsapp;
        self
    }

    pub fn auto_assign_critical_to(mut self, phone: &str) -> Self {
        self.intake.auto_assign_critical_to = Some(phone.to_string());
        self
    }

    pub fn passwordless_admin(mut self) -> Self {
        self.auth.allow_passwordless_admin = true;
        self
    }

    /// Convert into ServerDeps for testing. Clones of the mocks stay with
    /// the caller for assertions.
    pub fn into_server_deps(self, db_pool: PgPool, media_root: impl Into<PathBuf>) -> ServerDeps {
        let llm = self.llm.map(|llm| Arc::new(llm) as Arc<dyn BaseLlm>);
        ServerDeps::new(
            db_pool,
            Arc::new(ReportExtractor::new(llm, self.rule_fallback, "qwen2.5:7b")),
            Arc::new(self.whatsapp),
            Arc::new(self.telegram),
            Arc::new(MediaStorage::new(media_root)),
            Arc::new(JwtService::new(
                TEST_JWT_SECRET,
                TEST_JWT_ISSUER.to_string(),
                Duration::from_secs(3600),
            )),
            self.intake,
            self.auth,
        )
    }
}

impl Default for TestDependencies {
    fn default() -> Self {
        Self::new()
    }
}
