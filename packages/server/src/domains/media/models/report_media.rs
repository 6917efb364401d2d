use anyhow::Result;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{PgExecutor, PgPool};

use crate::common::{MediaId, ReportId};

const MIB: u64 = 1024 * 1024;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "media_type", rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MediaType {
    Image,
    Video,
    Audio,
    Document,
}

impl MediaType {
    pub fn from_mime(mime_type: &str) -> Self {
        if mime_type.starts_with("image/") {
            MediaType::Image
        } else if mime_type.starts_with("video/") {
            MediaType::Video
        } else if mime_type.starts_with("audio/") {
            MediaType::Audio
        } else {
            MediaType::Document
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            MediaType::Image => "IMAGE",
            MediaType::Video => "VIDEO",
            MediaType::Audio => "AUDIO",
            MediaType::Document => "DOCUMENT",
        }
    }

    /// Storage subdirectory under the media root.
    pub fn subdir(&self) -> &'static str {
        match self {
            MediaType::Image => "images",
            MediaType::Video => "videos",
            MediaType::Audio => "audio",
            MediaType::Document => "documents",
        }
    }

    pub fn max_size(&self) -> u64 {
        match self {
            MediaType::Image | MediaType::Audio => 16 * MIB,
            MediaType::Video => 64 * MIB,
            MediaType::Document => 100 * MIB,
        }
    }
}

impl From<whatsapp::MediaKind> for MediaType {
    fn from(kind: whatsapp::MediaKind) -> Self {
        match kind {
            whatsapp::MediaKind::Image => MediaType::Image,
            whatsapp::MediaKind::Video => MediaType::Video,
            whatsapp::MediaKind::Audio => MediaType::Audio,
            whatsapp::MediaKind::Document => MediaType::Document,
        }
    }
}

/// File attached to a report, stored under the media root
#[derive(sqlx::FromRow, Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportMedia {
    pub id: MediaId,
    pub report_id: ReportId,
    pub media_type: MediaType,
    pub file_name: String,
    /// Relative to the media root
    pub file_path: String,
    pub file_size: i64,
    pub mime_type: String,
    pub whatsapp_media_id: Option<String>,
    pub sha256: Option<String>,
    pub caption: Option<String>,
    pub uploaded_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewReportMedia {
    pub report_id: ReportId,
    pub media_type: MediaType,
    pub file_name: String,
    pub file_path: String,
    pub file_size: i64,
    pub mime_type: String,
    pub whatsapp_media_id: Option<String>,
    pub sha256: Option<String>,
    pub caption: Option<String>,
}

impl ReportMedia {
    pub async fn insert<'e>(new: &NewReportMedia, executor: impl PgExecutor<'e>) -> Result<Self> {
        sqlx::query_as::<_, Self>(
            r#"
            INSERT INTO report_media (
                id, report_id, media_type, file_name, file_path, file_size,
                mime_type, whatsapp_media_id, sha256, caption
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            RETURNING *
            "#,
        )
        .bind(MediaId::new())
        .bind(new.report_id)
        .bind(new.media_type)
        .bind(&new.file_name)
        .bind(&new.file_path)
        .bind(new.file_size)
        .bind(&new.mime_type)
        .bind(&new.whatsapp_media_id)
        .bind(&new.sha256)
        .bind(&new.caption)
        .fetch_one(executor)
        .await
        .map_err(Into::into)
    }

    pub async fn find_by_id(id: MediaId, pool: &PgPool) -> Result<Option<Self>> {
        sqlx::query_as::<_, Self>("SELECT * FROM report_media WHERE id = $1")
            .bind(id)
            .fetch_optional(pool)
            .await
            .map_err(Into::into)
    }

    /// Newest first.
    pub async fn find_by_report(report_id: ReportId, pool: &PgPool) -> Result<Vec<Self>> {
        sqlx::query_as::<_, Self>(
            "SELECT * FROM report_media WHERE report_id = $1 ORDER BY uploaded_at DESC",
        )
        .bind(report_id)
        .fetch_all(pool)
        .await
        .map_err(Into::into)
    }

    pub async fn file_paths_for_reports(report_ids: &[ReportId], pool: &PgPool) -> Result<Vec<String>> {
        if report_ids.is_empty() {
            return Ok(Vec::new());
        }
        sqlx::query_scalar::<_, String>("SELECT file_path FROM report_media WHERE report_id = ANY($1)")
            .bind(report_ids)
            .fetch_all(pool)
            .await
            .map_err(Into::into)
    }

    pub async fn delete(id: MediaId, pool: &PgPool) -> Result<bool> {
        let result = sqlx::query("DELETE FROM report_media WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    pub async fn count_by_type(pool: &PgPool) -> Result<Vec<(MediaType, i64)>> {
        sqlx::query_as::<_, (MediaType, i64)>(
            "SELECT media_type, COUNT(*) FROM report_media GROUP BY media_type ORDER BY media_type",
        )
        .fetch_all(pool)
        .await
        .map_err(Into::into)
    }
}
