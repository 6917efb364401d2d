use anyhow::Result;
use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::{PgExecutor, PgPool};

use super::enums::PersonStatus;
use crate::common::{PersonId, ReportId};
use crate::domains::extraction::ExtractedPerson;

/// Victim listed on a KORBAN report
#[derive(sqlx::FromRow, Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportPerson {
    pub id: PersonId,
    pub report_id: ReportId,
    pub name: String,
    pub status: PersonStatus,
    pub age: Option<i32>,
    pub gender: Option<String>,
    pub condition: Option<String>,
    pub last_seen_location: Option<String>,
    pub current_location: Option<String>,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl ReportPerson {
    pub async fn insert<'e>(
        report_id: ReportId,
        person: &ExtractedPerson,
        executor: impl PgExecutor<'e>,
    ) -> Result<Self> {
        let name = if person.name.trim().is_empty() {
            "Tidak disebutkan"
        } else {
            person.name.trim()
        };

        sqlx::query_as::<_, Self>(
            r#"
            INSERT INTO report_persons (
                id, report_id, name, status, age, gender, condition,
                last_seen_location, current_location, notes
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            RETURNING *
            "#,
        )
        .bind(PersonId::new())
        .bind(report_id)
        .bind(name)
        .bind(PersonStatus::from_extracted(person.status.as_deref()))
        .bind(person.age)
        .bind(&person.gender)
        .bind(&person.condition)
        .bind(&person.last_seen_location)
        .bind(&person.current_location)
        .bind(&person.notes)
        .fetch_one(executor)
        .await
        .map_err(Into::into)
    }

    pub async fn find_by_report_ids(report_ids: &[ReportId], pool: &PgPool) -> Result<Vec<Self>> {
        if report_ids.is_empty() {
            return Ok(Vec::new());
        }
        sqlx::query_as::<_, Self>(
            "SELECT * FROM report_persons WHERE report_id = ANY($1) ORDER BY created_at, id",
        )
        .bind(report_ids)
        .fetch_all(pool)
        .await
        .map_err(Into::into)
    }
}
