//! Media that arrived with a message but has no report yet.

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use tracing::{info, warn};

use super::models::{MediaType, NewReportMedia, ReportMedia};
use crate::common::ReportId;
use crate::kernel::ServerDeps;

/// WhatsApp media reference kept until its report is created
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PendingMedia {
    pub media_type: MediaType,
    pub media_id: String,
    #[serde(default)]
    pub mime_type: Option<String>,
    #[serde(default)]
    pub sha256: Option<String>,
    #[serde(default)]
    pub caption: Option<String>,
}

impl PendingMedia {
    pub fn from_incoming(media: &whatsapp::IncomingMedia, caption: &str) -> Self {
        Self {
            media_type: media.kind.into(),
            media_id: media.id.clone(),
            mime_type: media.mime_type.clone(),
            sha256: media.sha256.clone(),
            caption: Some(caption.trim().to_string()).filter(|c| !c.is_empty()),
        }
    }
}

/// Hex-encoded SHA-256 of `bytes`.
pub fn sha256_hex(bytes: &[u8]) -> String {
    hex::encode(Sha256::digest(bytes))
}

/// Compare a reported digest against the content. Digests that are not
/// 64-char hex cannot be checked and are accepted.
pub fn verify_digest(expected: Option<&str>, actual_hex: &str) -> Result<()> {
    let Some(expected) = expected.map(str::trim) else {
        return Ok(());
    };
    let is_hex = expected.len() == 64 && expected.chars().all(|c| c.is_ascii_hexdigit());
    if is_hex && !expected.eq_ignore_ascii_case(actual_hex) {
        bail!("SHA-256 mismatch: expected {}, got {}", expected, actual_hex);
    }
    Ok(())
}

async fn store_one(report_id: ReportId, pending: &PendingMedia, deps: &ServerDeps) -> Result<ReportMedia> {
    let downloaded = deps
        .whatsapp
        .fetch_media(&pending.media_id, pending.media_type.max_size())
        .await
        .context("Failed to download WhatsApp media")?;

    let digest = sha256_hex(&downloaded.bytes);
    let expected = pending.sha256.as_deref().or(downloaded.sha256.as_deref());
    verify_digest(expected, &digest)?;

    let mime_type = if downloaded.mime_type.is_empty() {
        pending
            .mime_type
            .clone()
            .unwrap_or_else(|| "application/octet-stream".to_string())
    } else {
        downloaded.mime_type.clone()
    };

    let stored = deps
        .media_storage
        .save(pending.media_type, &mime_type, &downloaded.bytes)
        .await?;

    let media = ReportMedia::insert(
        &NewReportMedia {
            report_id,
            media_type: pending.media_type,
            file_name: stored.file_name,
            file_path: stored.relative_path,
            file_size: stored.size as i64,
            mime_type,
            whatsapp_media_id: Some(pending.media_id.clone()),
            sha256: Some(digest),
            caption: pending.caption.clone(),
        },
        &deps.db_pool,
    )
    .await?;

    info!(report_id = %report_id, media_id = %media.id, "Media attached to report");
    Ok(media)
}

/// Download, verify and store each pending item. Failures are logged and
/// skipped so one bad file never blocks the rest.
pub async fn store_pending_media(
    report_id: ReportId,
    pending: &[PendingMedia],
    deps: &ServerDeps,
) -> Vec<ReportMedia> {
    let mut stored = Vec::with_capacity(pending.len());
    for item in pending {
        match store_one(report_id, item, deps).await {
            Ok(media) => stored.push(media),
            Err(e) => warn!(
                report_id = %report_id,
                media_id = %item.media_id,
                error = %e,
                "Failed to store report media"
            ),
        }
    }
    stored
}
