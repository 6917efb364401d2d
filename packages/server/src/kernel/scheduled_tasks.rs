//! Scheduled background tasks using tokio-cron-scheduler.
//!
//! - Chat state sweep every 15 minutes
//! - Data retention purge daily at 03:00 UTC

use anyhow::Result;
use chrono::{Duration, Utc};
use std::sync::Arc;
use tokio_cron_scheduler::{Job, JobScheduler};

use crate::domains::chat_state::ChatState;
use crate::domains::media::{MediaStorage, ReportMedia};
use crate::domains::reports::Report;
use sqlx::PgPool;

/// Start all scheduled tasks
pub async fn start_scheduler(
    pool: PgPool,
    media_storage: Arc<MediaStorage>,
    retention_days: i64,
) -> Result<JobScheduler> {
    let scheduler = JobScheduler::new().await?;

    let sweep_pool = pool.clone();
    let sweep_job = Job::new_async("0 */15 * * * *", move |_uuid, _lock| {
        let pool = sweep_pool.clone();
        Box::pin(async move {
            if let Err(e) = run_chat_state_sweep(&pool).await {
                tracing::error!("Chat state sweep failed: {}", e);
            }
        })
    })?;

    scheduler.add(sweep_job).await?;

    let purge_pool = pool.clone();
    let purge_job = Job::new_async("0 0 3 * * *", move |_uuid, _lock| {
        let pool = purge_pool.clone();
        let storage = media_storage.clone();
        Box::pin(async move {
            if let Err(e) = run_retention_purge(&pool, &storage, retention_days).await {
                tracing::error!("Retention purge failed: {}", e);
            }
        })
    })?;

    scheduler.add(purge_job).await?;
    scheduler.start().await?;

    tracing::info!(
        retention_days,
        "Scheduled tasks started (chat state sweep every 15 minutes, retention purge daily at 03:00 UTC)"
    );
    Ok(scheduler)
}

/// Delete conversations idle for more than an hour
pub async fn run_chat_state_sweep(pool: &PgPool) -> Result<u64> {
    let deleted = ChatState::delete_expired(Utc::now(), pool).await?;
    if deleted > 0 {
        tracing::info!(deleted, "Expired chat states removed");
    }
    Ok(deleted)
}

/// Delete closed or stale reports untouched for `retention_days`, media
/// files first so no row outlives its file reference.
pub async fn run_retention_purge(
    pool: &PgPool,
    storage: &MediaStorage,
    retention_days: i64,
) -> Result<u64> {
    let cutoff = Utc::now() - Duration::days(retention_days);
    let ids = Report::find_expired_ids(cutoff, pool).await?;

    if ids.is_empty() {
        tracing::info!("No reports past retention");
        return Ok(0);
    }

    for path in ReportMedia::file_paths_for_reports(&ids, pool).await? {
        if let Err(e) = storage.delete(&path).await {
            tracing::warn!(path = %path, error = %e, "Failed to delete media file");
        }
    }

    let deleted = Report::delete_many(&ids, pool).await?;
    tracing::info!(deleted, retention_days, "Retention purge complete");
    Ok(deleted)
}
