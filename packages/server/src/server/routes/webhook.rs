//! WhatsApp Cloud API webhook
//!
//! Meta retries any delivery that is not acknowledged quickly, so the POST
//! handler answers `200 OK` before doing any work.

use axum::body::Bytes;
use axum::extract::{Extension, Query};
use axum::http::StatusCode;
use serde::Deserialize;
use tracing::{debug, info, warn};

use crate::domains::intake::{process_message, IntakeOutcome};
use crate::server::app::AppState;

#[derive(Debug, Deserialize)]
pub struct VerifyParams {
    #[serde(rename = "hub.mode")]
    mode: Option<String>,
    #[serde(rename = "hub.verify_token")]
    verify_token: Option<String>,
    #[serde(rename = "hub.challenge")]
    challenge: Option<String>,
}

/// GET /webhook - subscription handshake
pub async fn verify_webhook_handler(
    Extension(state): Extension<AppState>,
    Query(params): Query<VerifyParams>,
) -> (StatusCode, String) {
    match whatsapp::verify_subscription(
        params.mode.as_deref(),
        params.verify_token.as_deref(),
        params.challenge.as_deref(),
        &state.webhook_verify_token,
    ) {
        Some(challenge) => {
            info!("Webhook verified");
            (StatusCode::OK, challenge.to_string())
        }
        None => {
            warn!(mode = ?params.mode, "Webhook verification rejected");
            (StatusCode::FORBIDDEN, "Forbidden".to_string())
        }
    }
}

/// POST /webhook - inbound messages and status callbacks
pub async fn receive_webhook_handler(
    Extension(state): Extension<AppState>,
    body: Bytes,
) -> (StatusCode, &'static str) {
    tokio::spawn(async move {
        let payload: serde_json::Value = match serde_json::from_slice(&body) {
            Ok(payload) => payload,
            Err(e) => {
                warn!(error = %e, "Dropping unparseable webhook payload");
                return;
            }
        };

        let Some(message) = whatsapp::parse_incoming(&payload) else {
            debug!("Webhook payload carries no supported message");
            return;
        };

        info!(
            phone = %message.from,
            message_id = %message.message_id,
            has_media = message.media.is_some(),
            "Inbound WhatsApp message"
        );

        match process_message(&message, &state.deps).await {
            Ok(IntakeOutcome::ReportCreated { report_number, .. }) => {
                info!(report_number = %report_number, "Message produced a report")
            }
            Ok(outcome) => debug!(outcome = ?outcome, "Message processed"),
            // Already reported to the sender and operators
            Err(e) => warn!(phone = %message.from, error = %e, "Message processing failed"),
        }
    });

    (StatusCode::OK, "OK")
}
