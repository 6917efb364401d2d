use anyhow::Result;
use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::{PgExecutor, PgPool};

use super::enums::{ReportStatus, ReportType, Urgency};
use crate::common::{ReportId, UserId, ValidatedPage};

/// Disaster incident record (victim or need)
#[derive(sqlx::FromRow, Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Report {
    pub id: ReportId,
    pub report_number: String,
    #[serde(rename = "type")]
    pub report_type: ReportType,
    pub status: ReportStatus,
    pub urgency: Urgency,

    pub reporter_id: UserId,
    pub reporter_phone: String,
    pub report_source: String,

    pub location: String,
    pub location_detail: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,

    pub summary: String,
    pub raw_message: String,
    pub extracted_data: serde_json::Value,

    pub verified_by: Option<UserId>,
    pub verified_at: Option<DateTime<Utc>>,
    pub assigned_to_id: Option<UserId>,
    pub assigned_at: Option<DateTime<Utc>>,
    pub resolved_at: Option<DateTime<Utc>>,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewReport {
    pub report_number: String,
    pub report_type: ReportType,
    pub status: ReportStatus,
    pub urgency: Urgency,
    pub reporter_id: UserId,
    pub reporter_phone: String,
    pub report_source: String,
    pub location: String,
    pub location_detail: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub summary: String,
    pub raw_message: String,
    pub extracted_data: serde_json::Value,
    pub verified_by: Option<UserId>,
    pub verified_at: Option<DateTime<Utc>>,
    /// Same instant the report number was derived from
    pub created_at: DateTime<Utc>,
}

/// Column changes for a dashboard status update. `None` keeps the current value.
#[derive(Debug, Clone, Default)]
pub struct StatusChanges {
    pub status: Option<ReportStatus>,
    pub verified_by: Option<UserId>,
    pub verified_at: Option<DateTime<Utc>>,
    pub resolved_at: Option<DateTime<Utc>>,
    pub assigned_to_id: Option<UserId>,
    pub assigned_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Default)]
pub struct ReportFilter {
    pub report_type: Option<ReportType>,
    pub status: Option<ReportStatus>,
    pub urgency: Option<Urgency>,
    /// Case-insensitive match on report number, location or summary
    pub search: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct ExportFilter {
    pub report_type: Option<ReportType>,
    pub status: Option<ReportStatus>,
    pub start_date: Option<DateTime<Utc>>,
    pub end_date: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortField {
    #[default]
    CreatedAt,
    UpdatedAt,
    Urgency,
    Status,
    ReportNumber,
}

impl SortField {
    /// Only whitelisted fields are accepted; anything else is `None`.
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "createdAt" => Some(SortField::CreatedAt),
            "updatedAt" => Some(SortField::UpdatedAt),
            "urgency" => Some(SortField::Urgency),
            "status" => Some(SortField::Status),
            "reportNumber" => Some(SortField::ReportNumber),
            _ => None,
        }
    }

    fn column(&self) -> &'static str {
        match self {
            SortField::CreatedAt => "created_at",
            SortField::UpdatedAt => "updated_at",
            SortField::Urgency => "urgency",
            SortField::Status => "status",
            SortField::ReportNumber => "report_number",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortOrder {
    Asc,
    #[default]
    Desc,
}

impl SortOrder {
    pub fn parse(value: &str) -> Option<Self> {
        match value.to_ascii_lowercase().as_str() {
            "asc" => Some(SortOrder::Asc),
            "desc" => Some(SortOrder::Desc),
            _ => None,
        }
    }

    fn keyword(&self) -> &'static str {
        match self {
            SortOrder::Asc => "ASC",
            SortOrder::Desc => "DESC",
        }
    }
}

const FILTER_CLAUSE: &str = "($1::report_type IS NULL OR report_type = $1)
       AND ($2::report_status IS NULL OR status = $2)
       AND ($3::urgency_level IS NULL OR urgency = $3)
       AND ($4::text IS NULL
            OR report_number ILIKE '%' || $4 || '%'
            OR location ILIKE '%' || $4 || '%'
            OR summary ILIKE '%' || $4 || '%')";

impl Report {
    pub async fn find_by_id(id: ReportId, pool: &PgPool) -> Result<Option<Self>> {
        sqlx::query_as::<_, Self>("SELECT * FROM reports WHERE id = $1")
            .bind(id)
            .fetch_optional(pool)
            .await
            .map_err(Into::into)
    }

    pub async fn insert<'e>(new: &NewReport, executor: impl PgExecutor<'e>) -> Result<Self> {
        sqlx::query_as::<_, Self>(
            r#"
            INSERT INTO reports (
                id, report_number, report_type, status, urgency,
                reporter_id, reporter_phone, report_source,
                location, location_detail, latitude, longitude,
                summary, raw_message, extracted_data,
                verified_by, verified_at, created_at, updated_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17, $18, $18)
            RETURNING *
            "#,
        )
        .bind(ReportId::new())
        .bind(&new.report_number)
        .bind(new.report_type)
        .bind(new.status)
        .bind(new.urgency)
        .bind(new.reporter_id)
        .bind(&new.reporter_phone)
        .bind(&new.report_source)
        .bind(&new.location)
        .bind(&new.location_detail)
        .bind(new.latitude)
        .bind(new.longitude)
        .bind(&new.summary)
        .bind(&new.raw_message)
        .bind(&new.extracted_data)
        .bind(new.verified_by)
        .bind(new.verified_at)
        .bind(new.created_at)
        .fetch_one(executor)
        .await
        .map_err(Into::into)
    }

    /// Reports created on or after `since`. Used for daily numbering.
    pub async fn count_created_since<'e>(
        since: DateTime<Utc>,
        executor: impl PgExecutor<'e>,
    ) -> Result<i64> {
        sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM reports WHERE created_at >= $1")
            .bind(since)
            .fetch_one(executor)
            .await
            .map_err(Into::into)
    }

    pub async fn apply_status_changes<'e>(
        id: ReportId,
        changes: &StatusChanges,
        executor: impl PgExecutor<'e>,
    ) -> Result<Option<Self>> {
        sqlx::query_as::<_, Self>(
            r#"
            UPDATE reports SET
                status = COALESCE($2, status),
                verified_by = COALESCE($3, verified_by),
                verified_at = COALESCE($4, verified_at),
                resolved_at = COALESCE($5, resolved_at),
                assigned_to_id = COALESCE($6, assigned_to_id),
                assigned_at = COALESCE($7, assigned_at),
                updated_at = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(changes.status)
        .bind(changes.verified_by)
        .bind(changes.verified_at)
        .bind(changes.resolved_at)
        .bind(changes.assigned_to_id)
        .bind(changes.assigned_at)
        .fetch_optional(executor)
        .await
        .map_err(Into::into)
    }

    /// Hand the report to a responder and move it to ASSIGNED.
    pub async fn assign(id: ReportId, assignee: UserId, pool: &PgPool) -> Result<Self> {
        sqlx::query_as::<_, Self>(
            "UPDATE reports
             SET status = 'ASSIGNED', assigned_to_id = $2, assigned_at = NOW(), updated_at = NOW()
             WHERE id = $1
             RETURNING *",
        )
        .bind(id)
        .bind(assignee)
        .fetch_one(pool)
        .await
        .map_err(Into::into)
    }

    /// Dashboard listing. Returns the page and the total match count.
    pub async fn find_filtered(
        filter: &ReportFilter,
        sort: (SortField, SortOrder),
        page: &ValidatedPage,
        pool: &PgPool,
    ) -> Result<(Vec<Self>, i64)> {
        let (field, order) = sort;
        // Column and direction come from closed enums, never from input.
        let sql = format!(
            "SELECT * FROM reports WHERE {} ORDER BY {} {}, id {} LIMIT $5 OFFSET $6",
            FILTER_CLAUSE,
            field.column(),
            order.keyword(),
            order.keyword(),
        );
        let search = filter.search.as_deref().filter(|s| !s.trim().is_empty());

        let reports = sqlx::query_as::<_, Self>(&sql)
            .bind(filter.report_type)
            .bind(filter.status)
            .bind(filter.urgency)
            .bind(search)
            .bind(page.limit)
            .bind(page.offset())
            .fetch_all(pool)
            .await?;

        let total = sqlx::query_scalar::<_, i64>(&format!(
            "SELECT COUNT(*) FROM reports WHERE {}",
            FILTER_CLAUSE
        ))
        .bind(filter.report_type)
        .bind(filter.status)
        .bind(filter.urgency)
        .bind(search)
        .fetch_one(pool)
        .await?;

        Ok((reports, total))
    }

    pub async fn find_for_export(filter: &ExportFilter, pool: &PgPool) -> Result<Vec<Self>> {
        sqlx::query_as::<_, Self>(
            r#"
            SELECT * FROM reports
            WHERE ($1::report_type IS NULL OR report_type = $1)
              AND ($2::report_status IS NULL OR status = $2)
              AND ($3::timestamptz IS NULL OR created_at >= $3)
              AND ($4::timestamptz IS NULL OR created_at <= $4)
            ORDER BY created_at DESC
            "#,
        )
        .bind(filter.report_type)
        .bind(filter.status)
        .bind(filter.start_date)
        .bind(filter.end_date)
        .fetch_all(pool)
        .await
        .map_err(Into::into)
    }

    pub async fn find_recent(limit: i64, pool: &PgPool) -> Result<Vec<Self>> {
        sqlx::query_as::<_, Self>("SELECT * FROM reports ORDER BY created_at DESC LIMIT $1")
            .bind(limit)
            .fetch_all(pool)
            .await
            .map_err(Into::into)
    }

    /// CLOSED or STALE reports untouched since `cutoff`.
    pub async fn find_expired_ids(cutoff: DateTime<Utc>, pool: &PgPool) -> Result<Vec<ReportId>> {
        sqlx::query_scalar::<_, ReportId>(
            "SELECT id FROM reports
             WHERE status IN ('CLOSED', 'STALE') AND updated_at < $1",
        )
        .bind(cutoff)
        .fetch_all(pool)
        .await
        .map_err(Into::into)
    }

    /// Persons, needs, actions and media rows cascade.
    pub async fn delete_many(ids: &[ReportId], pool: &PgPool) -> Result<u64> {
        if ids.is_empty() {
            return Ok(0);
        }
        let result = sqlx::query("DELETE FROM reports WHERE id = ANY($1)")
            .bind(ids)
            .execute(pool)
            .await?;
        Ok(result.rows_affected())
    }

    pub fn is_resolved(&self) -> bool {
        self.status == ReportStatus::Resolved
    }
}

// ============================================================================
// Dashboard statistics
// ============================================================================

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct StatsSummary {
    pub total_reports: i64,
    pub pending_verification: i64,
    pub critical_reports: i64,
    pub resolved_today: i64,
}

impl StatsSummary {
    /// `resolved_since` is the start of the current day.
    pub async fn load(resolved_since: DateTime<Utc>, pool: &PgPool) -> Result<Self> {
        let (total_reports, pending_verification, critical_reports, resolved_today) =
            sqlx::query_as::<_, (i64, i64, i64, i64)>(
                r#"
                SELECT
                    COUNT(*),
                    COUNT(*) FILTER (WHERE status = 'PENDING_VERIFICATION'),
                    COUNT(*) FILTER (WHERE urgency = 'CRITICAL' AND status <> 'RESOLVED'),
                    COUNT(*) FILTER (WHERE status = 'RESOLVED' AND resolved_at >= $1)
                FROM reports
                "#,
            )
            .bind(resolved_since)
            .fetch_one(pool)
            .await?;

        Ok(Self {
            total_reports,
            pending_verification,
            critical_reports,
            resolved_today,
        })
    }
}

pub async fn count_by_type(pool: &PgPool) -> Result<Vec<(ReportType, i64)>> {
    sqlx::query_as::<_, (ReportType, i64)>(
        "SELECT report_type, COUNT(*) FROM reports GROUP BY report_type ORDER BY report_type",
    )
    .fetch_all(pool)
    .await
    .map_err(Into::into)
}

/// Urgency breakdown of reports that are not yet resolved.
pub async fn count_unresolved_by_urgency(pool: &PgPool) -> Result<Vec<(Urgency, i64)>> {
    sqlx::query_as::<_, (Urgency, i64)>(
        "SELECT urgency, COUNT(*) FROM reports
         WHERE status <> 'RESOLVED'
         GROUP BY urgency
         ORDER BY urgency",
    )
    .fetch_all(pool)
    .await
    .map_err(Into::into)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sort_field_whitelist() {
        assert_eq!(SortField::parse("reportNumber"), Some(SortField::ReportNumber));
        assert_eq!(SortField::parse("urgency"), Some(SortField::Urgency));
        assert_eq!(SortField::parse("created_at; DROP TABLE reports"), None);
        assert_eq!(SortField::default().column(), "created_at");
    }

    #[test]
    fn test_sort_order() {
        assert_eq!(SortOrder::parse("ASC"), Some(SortOrder::Asc));
        assert_eq!(SortOrder::parse("desc"), Some(SortOrder::Desc));
        assert_eq!(SortOrder::parse("sideways"), None);
        assert_eq!(SortOrder::default(), SortOrder::Desc);
    }
}
