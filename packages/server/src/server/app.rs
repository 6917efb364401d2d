//! Application setup and server configuration.

use std::sync::Arc;

use anyhow::{Context, Result};
use axum::{
    extract::{DefaultBodyLimit, Extension},
    http::{
        header::{AUTHORIZATION, CONTENT_TYPE},
        HeaderValue, Method,
    },
    middleware,
    routing::{get, patch, post},
    Router,
};
use ollama_client::OllamaClient;
use sqlx::PgPool;
use telegram::{TelegramOptions, TelegramService};
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::trace::TraceLayer;
use whatsapp::{WhatsAppOptions, WhatsAppService};

use crate::config::Config;
use crate::domains::auth::JwtService;
use crate::domains::extraction::ReportExtractor;
use crate::domains::media::MediaStorage;
use crate::kernel::{
    AuthSettings, BaseLlm, IntakeSettings, OllamaAdapter, ServerDeps, TelegramAdapter,
    WhatsAppAdapter,
};
use crate::server::middleware::{jwt_auth_middleware, with_rate_limit};
use crate::server::routes::*;

const MAX_BODY_BYTES: usize = 10 * 1024 * 1024;

/// Shared application state, handed to handlers as an `Extension`
#[derive(Clone)]
pub struct AppState {
    pub deps: ServerDeps,
    /// Token Meta echoes back during webhook subscription
    pub webhook_verify_token: String,
}

/// Router options that differ between deployments
#[derive(Debug, Clone, Default)]
pub struct AppOptions {
    /// `None` allows any origin
    pub cors_origin: Option<HeaderValue>,
    /// Per-IP limit on `/api/*`; `0` disables it
    pub rate_limit_per_minute: u32,
}

impl AppOptions {
    pub fn from_config(config: &Config) -> Result<Self> {
        let cors_origin = if config.is_development() {
            None
        } else {
            Some(
                HeaderValue::from_str(config.api_base_url.trim_end_matches('/'))
                    .context("API_BASE_URL is not a valid origin")?,
            )
        };
        Ok(Self {
            cors_origin,
            rate_limit_per_minute: config.rate_limit_per_minute,
        })
    }
}

/// Wire the real LLM, WhatsApp, Telegram and storage backends.
pub async fn build_deps(config: &Config, pool: PgPool) -> Result<ServerDeps> {
    let llm: Option<Arc<dyn BaseLlm>> = if config.ollama_enabled() {
        let client = OllamaClient::new(&config.ollama_base_url, config.ollama_timeout)
            .map_err(|e| anyhow::anyhow!("{}", e))
            .context("Failed to create Ollama client")?;
        tracing::info!(model = %config.ollama_model, url = %config.ollama_base_url, "LLM extraction enabled");
        Some(Arc::new(OllamaAdapter::new(client, &config.ollama_model)))
    } else {
        None
    };
    let extractor = Arc::new(ReportExtractor::new(
        llm,
        config.ollama_fallback_enabled,
        &config.ollama_model,
    ));

    let whatsapp_for = |phone_number_id: &str| {
        Arc::new(WhatsAppService::new(WhatsAppOptions {
            phone_number_id: phone_number_id.to_string(),
            access_token: config.whatsapp_access_token.clone(),
            api_version: config.whatsapp_api_version.clone(),
            base_url: None,
        }))
    };
    let fallback = config.whatsapp_fallback_phone_number_id.as_deref().map(whatsapp_for);
    if fallback.is_some() {
        tracing::info!("Fallback WhatsApp sender configured");
    }
    let whatsapp = Arc::new(WhatsAppAdapter::new(
        whatsapp_for(&config.whatsapp_phone_number_id),
        fallback,
    ));

    let telegram = Arc::new(TelegramAdapter::new(
        Arc::new(TelegramService::new(TelegramOptions {
            bot_token: config.telegram_bot_token.clone(),
            base_url: None,
        })),
        config.telegram_admin_chat_id.clone(),
    ));

    let media_storage = Arc::new(MediaStorage::new(config.media_storage_path.clone()));
    media_storage.init().await?;

    let jwt_service = Arc::new(JwtService::new(
        &config.jwt_secret,
        config.jwt_issuer.clone(),
        config.jwt_expires_in,
    ));

    Ok(ServerDeps::new(
        pool,
        extractor,
        whatsapp,
        telegram,
        media_storage,
        jwt_service,
        IntakeSettings {
            auto_verify_trust_level: config.auto_verify_trust_level,
            auto_assign_critical_to: config.auto_assign_critical_to.clone(),
        },
        AuthSettings {
            admin_password: config.admin_password.clone(),
            allow_passwordless_admin: config.is_development(),
        },
    ))
}

fn api_routes() -> Router {
    Router::new()
        .route("/reports", post(create_report_handler).get(list_reports_handler))
        .route("/reports/export", get(export_reports_handler))
        .route("/reports/:id", get(get_report_handler))
        .route("/reports/:id/status", patch(update_status_handler))
        .route("/reports/:id/media", get(report_media_handler))
        .route("/dashboard/stats", get(dashboard_stats_handler))
        .route("/users", get(list_users_handler).post(create_user_handler))
        .route(
            "/users/:id",
            get(get_user_handler)
                .patch(update_user_handler)
                .delete(delete_user_handler),
        )
        .route("/media/stats/storage", get(storage_stats_handler))
        .route("/media/:id", get(serve_media_handler).delete(delete_media_handler))
}

/// Build the Axum application router
pub fn build_app(state: AppState, options: AppOptions) -> Router {
    let jwt_service = state.deps.jwt_service.clone();

    let cors = CorsLayer::new()
        .allow_origin(match options.cors_origin {
            Some(origin) => AllowOrigin::exact(origin),
            None => AllowOrigin::any(),
        })
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PATCH,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([AUTHORIZATION, CONTENT_TYPE]);

    Router::new()
        .route("/", get(root_handler))
        .route("/health", get(health_handler))
        .route(
            "/webhook",
            get(verify_webhook_handler).post(receive_webhook_handler),
        )
        .route("/auth/login", post(login_handler))
        .route("/auth/setup-admin", post(setup_admin_handler))
        .route("/auth/me", get(me_handler))
        .nest("/api", with_rate_limit(api_routes(), options.rate_limit_per_minute))
        .fallback(not_found_handler)
        // Middleware layers (applied in reverse order - last added runs first)
        .layer(middleware::from_fn(move |req, next| {
            jwt_auth_middleware(jwt_service.clone(), req, next)
        }))
        .layer(Extension(state))
        .layer(DefaultBodyLimit::max(MAX_BODY_BYTES))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
}
