use anyhow::Result;
use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::{PgExecutor, PgPool};

use super::enums::{NeedCategory, NeedStatus};
use crate::common::{NeedId, ReportId};
use crate::domains::extraction::ExtractedNeed;

/// Aid request listed on a KEBUTUHAN report
#[derive(sqlx::FromRow, Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportNeed {
    pub id: NeedId,
    pub report_id: ReportId,
    pub category: NeedCategory,
    pub description: String,
    pub quantity: Option<i32>,
    pub people_affected: Option<i32>,
    pub status: NeedStatus,
    pub created_at: DateTime<Utc>,
}

impl ReportNeed {
    pub async fn insert<'e>(
        report_id: ReportId,
        need: &ExtractedNeed,
        executor: impl PgExecutor<'e>,
    ) -> Result<Self> {
        let category = NeedCategory::from_extracted(need.category.as_deref());
        let description = if need.description.trim().is_empty() {
            need.category.clone().unwrap_or_else(|| "Kebutuhan".to_string())
        } else {
            need.description.trim().to_string()
        };

        sqlx::query_as::<_, Self>(
            r#"
            INSERT INTO report_needs (id, report_id, category, description, quantity, people_affected, status)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING *
            "#,
        )
        .bind(NeedId::new())
        .bind(report_id)
        .bind(category)
        .bind(description)
        .bind(need.quantity)
        .bind(need.people_affected)
        .bind(NeedStatus::BelumTerpenuhi)
        .fetch_one(executor)
        .await
        .map_err(Into::into)
    }

    pub async fn find_by_report_ids(report_ids: &[ReportId], pool: &PgPool) -> Result<Vec<Self>> {
        if report_ids.is_empty() {
            return Ok(Vec::new());
        }
        sqlx::query_as::<_, Self>(
            "SELECT * FROM report_needs WHERE report_id = ANY($1) ORDER BY created_at, id",
        )
        .bind(report_ids)
        .fetch_all(pool)
        .await
        .map_err(Into::into)
    }
}
