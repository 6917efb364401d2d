use axum::{extract::Extension, Json};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::time::Duration;

use crate::domains::extraction::LlmHealth;
use crate::server::app::AppState;
use crate::server::error::ApiError;

const CHECK_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Serialize)]
pub struct HealthResponse {
    success: bool,
    status: &'static str,
    services: ServicesHealth,
    timestamp: DateTime<Utc>,
}

#[derive(Serialize)]
pub struct ServicesHealth {
    ollama: LlmHealth,
    whatsapp: ServiceHealth,
    telegram: ServiceHealth,
    database: ServiceHealth,
}

#[derive(Serialize)]
pub struct ServiceHealth {
    status: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    detail: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

impl ServiceHealth {
    fn from_check(result: Result<anyhow::Result<String>, tokio::time::error::Elapsed>) -> Self {
        match result {
            Ok(Ok(detail)) => ServiceHealth {
                status: "healthy",
                detail: Some(detail).filter(|d| !d.is_empty()),
                error: None,
            },
            Ok(Err(e)) => ServiceHealth {
                status: "unhealthy",
                detail: None,
                error: Some(e.to_string()),
            },
            Err(_) => ServiceHealth {
                status: "unhealthy",
                detail: None,
                error: Some(format!("Check timed out (>{}s)", CHECK_TIMEOUT.as_secs())),
            },
        }
    }

    fn is_healthy(&self) -> bool {
        self.status == "healthy"
    }
}

/// Health check endpoint
///
/// Checks the database, the LLM, and both messaging APIs concurrently.
/// Always answers 200; `status` is `healthy` when everything is up (a
/// disabled LLM counts as up) and `degraded` otherwise.
pub async fn health_handler(Extension(state): Extension<AppState>) -> Json<HealthResponse> {
    let deps = &state.deps;

    let database = tokio::time::timeout(CHECK_TIMEOUT, async {
        sqlx::query("SELECT 1").execute(&deps.db_pool).await?;
        let size = deps.db_pool.size();
        let idle = deps.db_pool.num_idle();
        Ok::<_, anyhow::Error>(format!("{} connections, {} idle", size, idle))
    });
    let ollama = deps.extractor.health();
    let whatsapp = tokio::time::timeout(CHECK_TIMEOUT, deps.whatsapp.health_check());
    let telegram = tokio::time::timeout(CHECK_TIMEOUT, deps.telegram.health_check());

    let (database, ollama, whatsapp, telegram) = tokio::join!(database, ollama, whatsapp, telegram);

    let services = ServicesHealth {
        ollama,
        whatsapp: ServiceHealth::from_check(whatsapp),
        telegram: ServiceHealth::from_check(telegram),
        database: ServiceHealth::from_check(database),
    };

    let is_healthy = services.ollama.is_ok()
        && services.whatsapp.is_healthy()
        && services.telegram.is_healthy()
        && services.database.is_healthy();

    if !is_healthy {
        tracing::warn!("Health check degraded");
    }

    Json(HealthResponse {
        success: true,
        status: if is_healthy { "healthy" } else { "degraded" },
        services,
        timestamp: Utc::now(),
    })
}

#[derive(Serialize)]
pub struct RootResponse {
    success: bool,
    service: &'static str,
    version: &'static str,
    status: &'static str,
    timestamp: DateTime<Utc>,
}

/// GET /
pub async fn root_handler() -> Json<RootResponse> {
    Json(RootResponse {
        success: true,
        service: "Emergency Disaster Response Chatbot API",
        version: env!("CARGO_PKG_VERSION"),
        status: "running",
        timestamp: Utc::now(),
    })
}

/// Fallback for unknown routes
pub async fn not_found_handler() -> ApiError {
    ApiError::not_found("Endpoint not found")
}
