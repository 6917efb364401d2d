use anyhow::Result;
use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::{PgExecutor, PgPool};

use super::enums::ActionType;
use crate::common::{ActionId, ReportId, UserId};

/// Responder activity on a report (status changes, assignments)
#[derive(sqlx::FromRow, Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportAction {
    pub id: ActionId,
    pub report_id: ReportId,
    #[serde(rename = "type")]
    pub action_type: ActionType,
    pub description: String,
    pub taken_by: Option<UserId>,
    pub created_at: DateTime<Utc>,
}

impl ReportAction {
    pub async fn insert<'e>(
        report_id: ReportId,
        action_type: ActionType,
        description: &str,
        taken_by: Option<UserId>,
        executor: impl PgExecutor<'e>,
    ) -> Result<Self> {
        sqlx::query_as::<_, Self>(
            "INSERT INTO report_actions (id, report_id, action_type, description, taken_by)
             VALUES ($1, $2, $3, $4, $5)
             RETURNING *",
        )
        .bind(ActionId::new())
        .bind(report_id)
        .bind(action_type)
        .bind(description)
        .bind(taken_by)
        .fetch_one(executor)
        .await
        .map_err(Into::into)
    }

    /// Newest first.
    pub async fn find_by_report(report_id: ReportId, pool: &PgPool) -> Result<Vec<Self>> {
        sqlx::query_as::<_, Self>(
            "SELECT * FROM report_actions WHERE report_id = $1 ORDER BY created_at DESC",
        )
        .bind(report_id)
        .fetch_all(pool)
        .await
        .map_err(Into::into)
    }

    pub async fn count_by_report_ids(
        report_ids: &[ReportId],
        pool: &PgPool,
    ) -> Result<Vec<(ReportId, i64)>> {
        if report_ids.is_empty() {
            return Ok(Vec::new());
        }
        sqlx::query_as::<_, (ReportId, i64)>(
            "SELECT report_id, COUNT(*) FROM report_actions
             WHERE report_id = ANY($1)
             GROUP BY report_id",
        )
        .bind(report_ids)
        .fetch_all(pool)
        .await
        .map_err(Into::into)
    }
}
