use anyhow::{Context, Result};
use serde::Serialize;
use std::sync::Arc;
use thiserror::Error;
use tracing::{info, warn};

use super::fallback::rule_based_extract;
use super::parse::parse_llm_response;
use super::prompt::build_prompt;
use super::types::ExtractedReport;
use crate::kernel::BaseLlm;

/// LLM availability as reported by `/health`
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum LlmHealth {
    /// No LLM configured; extraction is rule-based only
    Disabled,
    #[serde(rename_all = "camelCase")]
    Healthy { model: String, model_available: bool },
    Unhealthy { error: String },
}

impl LlmHealth {
    /// Disabled is an intentional deployment mode, not a fault.
    pub fn is_ok(&self) -> bool {
        !matches!(self, LlmHealth::Unhealthy { .. })
    }
}

/// The LLM gave no usable extraction and keyword matching is switched off.
#[derive(Debug, Error)]
#[error("LLM extraction unavailable: {0}")]
pub struct ExtractionUnavailable(pub String);

/// Turns a free-text report into structured data.
///
/// With no LLM configured every message goes through keyword matching. With
/// one configured, LLM failures fall back to keyword matching only when
/// `fallback_enabled` is set.
pub struct ReportExtractor {
    llm: Option<Arc<dyn BaseLlm>>,
    fallback_enabled: bool,
    model: String,
}

impl ReportExtractor {
    pub fn new(llm: Option<Arc<dyn BaseLlm>>, fallback_enabled: bool, model: impl Into<String>) -> Self {
        let extractor = Self {
            llm,
            fallback_enabled,
            model: model.into(),
        };
        if extractor.llm.is_none() {
            warn!("LLM disabled, using rule-based extraction only");
        }
        extractor
    }

    /// Keyword matching only.
    pub fn rule_based() -> Self {
        Self::new(None, true, "")
    }

    pub fn is_enabled(&self) -> bool {
        self.llm.is_some()
    }

    pub async fn extract(&self, message: &str, previous_report: Option<&str>) -> Result<ExtractedReport> {
        let Some(llm) = &self.llm else {
            info!("Using rule-based extraction");
            return Ok(rule_based_extract(message));
        };

        let prompt = build_prompt(message, previous_report);
        let outcome = match llm.generate(&prompt).await {
            Ok(response) => parse_llm_response(&response),
            Err(e) => Err(e).context("LLM generation failed"),
        };

        match outcome {
            Ok(report) => Ok(report),
            Err(e) if self.fallback_enabled => {
                warn!(error = %e, "LLM extraction failed, using rule-based fallback");
                Ok(rule_based_extract(message))
            }
            Err(e) => Err(ExtractionUnavailable(format!("{:#}", e)).into()),
        }
    }

    pub async fn health(&self) -> LlmHealth {
        let Some(llm) = &self.llm else {
            return LlmHealth::Disabled;
        };
        match llm.health().await {
            Ok(model_available) => LlmHealth::Healthy {
                model: self.model.clone(),
                model_available,
            },
            Err(e) => LlmHealth::Unhealthy {
                error: e.to_string(),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domains::extraction::Intent;
    use crate::kernel::test_dependencies::MockLlm;

    #[tokio::test]
    async fn test_uses_llm_output() {
        let llm = MockLlm::new().with_response(
            r#"{"intent":"kebutuhan","urgency":"low","location":"Posko Balai Desa","summary":"Butuh tenda","needs":[{"category":"shelter","description":"Tenda 5 unit","quantity":5}],"missingFields":[]}"#,
        );
        let extractor = ReportExtractor::new(Some(Arc::new(llm.clone())), true, "qwen2.5:7b");

        let report = extractor.extract("Butuh tenda di Posko Balai Desa", None).await.unwrap();

        assert_eq!(report.intent, Intent::Kebutuhan);
        assert_eq!(report.location, "Posko Balai Desa");
        assert!(!report.fallback);
        assert_eq!(llm.prompts().len(), 1);
    }

    #[tokio::test]
    async fn test_falls_back_on_garbage() {
        let llm = MockLlm::new().with_response("bukan json");
        let extractor = ReportExtractor::new(Some(Arc::new(llm)), true, "qwen2.5:7b");

        let report = extractor
            .extract("2 orang hilang di Kampung Baru", None)
            .await
            .unwrap();

        assert!(report.fallback);
        assert_eq!(report.intent, Intent::Korban);
        assert_eq!(report.location, "Kampung Baru");
    }

    #[tokio::test]
    async fn test_error_without_fallback() {
        let llm = MockLlm::new().failing("connection refused");
        let extractor = ReportExtractor::new(Some(Arc::new(llm)), false, "qwen2.5:7b");

        let err = extractor.extract("tolong", None).await.unwrap_err();
        assert!(err.downcast_ref::<ExtractionUnavailable>().is_some());
        assert!(err.to_string().contains("connection refused"));
    }

    #[tokio::test]
    async fn test_health_states() {
        assert_eq!(ReportExtractor::rule_based().health().await, LlmHealth::Disabled);
        assert!(LlmHealth::Disabled.is_ok());

        let down = ReportExtractor::new(
            Some(Arc::new(MockLlm::new().failing("timeout"))),
            true,
            "qwen2.5:7b",
        );
        let health = down.health().await;
        assert!(!health.is_ok());

        let up = ReportExtractor::new(Some(Arc::new(MockLlm::new())), true, "qwen2.5:7b");
        assert_eq!(
            up.health().await,
            LlmHealth::Healthy {
                model: "qwen2.5:7b".into(),
                model_available: true
            }
        );
    }
}
