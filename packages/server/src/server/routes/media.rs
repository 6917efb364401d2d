//! Stored media: download, delete and storage usage

use axum::extract::{Extension, Path};
use axum::http::header::{CACHE_CONTROL, CONTENT_TYPE};
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use serde_json::json;
use std::collections::BTreeMap;

use crate::common::MediaId;
use crate::domains::audit::{AuditAction, AuditLog, NewAuditLog};
use crate::domains::media::{ReportMedia, StorageStats};
use crate::domains::users::UserRole;
use crate::server::app::AppState;
use crate::server::error::{ApiError, ApiResult};
use crate::server::middleware::AuthUser;
use crate::server::response::ApiResponse;

const ADMIN_ONLY: &[UserRole] = &[UserRole::Admin];

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MediaStorageReport {
    storage: StorageStats,
    database: BTreeMap<String, i64>,
}

/// Stored MIME type, or a guess from the file name when none was recorded.
fn content_type_for(media: &ReportMedia) -> String {
    let stored = media.mime_type.trim();
    if !stored.is_empty() && stored != "application/octet-stream" {
        return stored.to_string();
    }
    mime_guess::from_path(&media.file_name)
        .first_or_octet_stream()
        .essence_str()
        .to_string()
}

/// GET /api/media/:id
pub async fn serve_media_handler(
    Extension(state): Extension<AppState>,
    _user: AuthUser,
    Path(id): Path<MediaId>,
) -> ApiResult<Response> {
    let media = ReportMedia::find_by_id(id, &state.deps.db_pool)
        .await?
        .ok_or_else(|| ApiError::not_found("Media not found"))?;

    let bytes = state
        .deps
        .media_storage
        .read(&media.file_path)
        .await?
        .ok_or_else(|| {
            tracing::warn!(media_id = %id, path = %media.file_path, "Media file missing from storage");
            ApiError::not_found("Media file not found")
        })?;

    Ok((
        [
            (CONTENT_TYPE, content_type_for(&media)),
            (CACHE_CONTROL, "private, max-age=86400".to_string()),
        ],
        bytes,
    )
        .into_response())
}

/// DELETE /api/media/:id
pub async fn delete_media_handler(
    Extension(state): Extension<AppState>,
    user: AuthUser,
    Path(id): Path<MediaId>,
) -> ApiResult<ApiResponse<()>> {
    user.require(ADMIN_ONLY)?;

    let pool = &state.deps.db_pool;
    let media = ReportMedia::find_by_id(id, pool)
        .await?
        .ok_or_else(|| ApiError::not_found("Media not found"))?;

    state.deps.media_storage.delete(&media.file_path).await?;
    ReportMedia::delete(id, pool).await?;

    AuditLog::record(
        NewAuditLog::new(AuditAction::Delete, "ReportMedia", id)
            .by(user.0.id)
            .report(media.report_id)
            .metadata(json!({
                "fileName": media.file_name,
                "mediaType": media.media_type,
                "fileSize": media.file_size,
            })),
        pool,
    )
    .await?;

    Ok(ApiResponse::message("Media deleted"))
}

/// GET /api/media/stats/storage
pub async fn storage_stats_handler(
    Extension(state): Extension<AppState>,
    user: AuthUser,
) -> ApiResult<ApiResponse<MediaStorageReport>> {
    user.require(ADMIN_ONLY)?;

    let storage = state.deps.media_storage.stats().await?;
    let database = ReportMedia::count_by_type(&state.deps.db_pool)
        .await?
        .into_iter()
        .map(|(media_type, count)| (media_type.as_str().to_string(), count))
        .collect();

    Ok(ApiResponse::ok(MediaStorageReport { storage, database }))
}
