//! Pure Ollama REST API client
//!
//! A minimal client for a local Ollama server with no domain-specific logic.
//! Supports non-streaming generation and model listing.
//!
//! # Example
//!
//! ```rust,ignore
//! use ollama_client::{GenerateRequest, OllamaClient};
//! use std::time::Duration;
//!
//! let client = OllamaClient::new("http://localhost:11434", Duration::from_secs(30))?;
//! let response = client
//!     .generate(GenerateRequest::new("qwen2.5:7b", "Halo"))
//!     .await?;
//! ```

pub mod error;
pub mod types;

pub use error::{OllamaError, Result};
pub use types::*;

use std::time::Duration;

use reqwest::Client;
use tracing::{debug, warn};

const HEALTH_TIMEOUT: Duration = Duration::from_secs(5);

/// Pure Ollama API client.
#[derive(Clone)]
pub struct OllamaClient {
    http_client: Client,
    base_url: String,
}

impl OllamaClient {
    /// Create a client whose requests time out after `timeout`.
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self> {
        let base_url = base_url.into();
        if base_url.trim().is_empty() {
            return Err(OllamaError::Config("base URL is empty".into()));
        }

        let http_client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| OllamaError::Config(e.to_string()))?;

        Ok(Self {
            http_client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    /// Get the base URL.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Run a single non-streaming completion.
    pub async fn generate(&self, request: GenerateRequest) -> Result<GenerateResponse> {
        let start = std::time::Instant::now();

        debug!(
            model = %request.model,
            prompt_length = request.prompt.len(),
            "Ollama generate"
        );

        let response = self
            .http_client
            .post(format!("{}/api/generate", self.base_url))
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                warn!(error = %e, "Ollama request failed");
                OllamaError::Network(e.to_string())
            })?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            warn!(status = %status, error = %error_text, "Ollama API error");
            return Err(OllamaError::Api(format!("Ollama API error: {}", error_text)));
        }

        let generated: GenerateResponse = response
            .json()
            .await
            .map_err(|e| OllamaError::Parse(e.to_string()))?;

        debug!(
            model = %request.model,
            duration_ms = start.elapsed().as_millis(),
            "Ollama response generated"
        );

        Ok(generated)
    }

    /// List installed models (`/api/tags`).
    pub async fn list_models(&self) -> Result<TagsResponse> {
        let response = self
            .http_client
            .get(format!("{}/api/tags", self.base_url))
            .timeout(HEALTH_TIMEOUT)
            .send()
            .await
            .map_err(|e| OllamaError::Network(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(OllamaError::Api(format!("Ollama API error: {}", error_text)));
        }

        response
            .json()
            .await
            .map_err(|e| OllamaError::Parse(e.to_string()))
    }
}
