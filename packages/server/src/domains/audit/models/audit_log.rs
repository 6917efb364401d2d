use anyhow::Result;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{PgExecutor, PgPool};

use crate::common::{AuditLogId, ReportId, UserId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "audit_action", rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AuditAction {
    Create,
    Update,
    Delete,
    Login,
    Export,
}

#[derive(sqlx::FromRow, Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditLog {
    pub id: AuditLogId,
    pub user_id: Option<UserId>,
    pub action: AuditAction,
    pub entity_type: String,
    pub entity_id: String,
    pub report_id: Option<ReportId>,
    pub changes: Option<serde_json::Value>,
    pub metadata: Option<serde_json::Value>,
    pub created_at: DateTime<Utc>,
}

/// Audit row joined with the acting user's name and phone
#[derive(sqlx::FromRow, Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditLogWithUser {
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub log: AuditLog,
    pub user_name: Option<String>,
    pub user_phone: Option<String>,
}

#[derive(Debug, Clone)]
pub struct NewAuditLog {
    pub user_id: Option<UserId>,
    pub action: AuditAction,
    pub entity_type: &'static str,
    pub entity_id: String,
    pub report_id: Option<ReportId>,
    pub changes: Option<serde_json::Value>,
    pub metadata: Option<serde_json::Value>,
}

impl NewAuditLog {
    pub fn new(action: AuditAction, entity_type: &'static str, entity_id: impl ToString) -> Self {
        Self {
            user_id: None,
            action,
            entity_type,
            entity_id: entity_id.to_string(),
            report_id: None,
            changes: None,
            metadata: None,
        }
    }

    pub fn by(mut self, user_id: UserId) -> Self {
        self.user_id = Some(user_id);
        self
    }

    pub fn report(mut self, report_id: ReportId) -> Self {
        self.report_id = Some(report_id);
        self
    }

    pub fn changes(mut self, changes: serde_json::Value) -> Self {
        self.changes = Some(changes);
        self
    }

    pub fn metadata(mut self, metadata: serde_json::Value) -> Self {
        self.metadata = Some(metadata);
        self
    }
}

impl AuditLog {
    pub async fn record<'e>(entry: NewAuditLog, executor: impl PgExecutor<'e>) -> Result<Self> {
        sqlx::query_as::<_, Self>(
            r#"
            INSERT INTO audit_logs (id, user_id, action, entity_type, entity_id, report_id, changes, metadata)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING *
            "#,
        )
        .bind(AuditLogId::new())
        .bind(entry.user_id)
        .bind(entry.action)
        .bind(entry.entity_type)
        .bind(&entry.entity_id)
        .bind(entry.report_id)
        .bind(&entry.changes)
        .bind(&entry.metadata)
        .fetch_one(executor)
        .await
        .map_err(Into::into)
    }

    /// Newest first, with the acting user's details.
    pub async fn find_by_report(report_id: ReportId, pool: &PgPool) -> Result<Vec<AuditLogWithUser>> {
        sqlx::query_as::<_, AuditLogWithUser>(
            r#"
            SELECT a.*, u.name AS user_name, u.phone_number AS user_phone
            FROM audit_logs a
            LEFT JOIN users u ON u.id = a.user_id
            WHERE a.report_id = $1
            ORDER BY a.created_at DESC
            "#,
        )
        .bind(report_id)
        .fetch_all(pool)
        .await
        .map_err(Into::into)
    }

    pub async fn find_by_entity(
        entity_type: &str,
        entity_id: &str,
        pool: &PgPool,
    ) -> Result<Vec<Self>> {
        sqlx::query_as::<_, Self>(
            "SELECT * FROM audit_logs
             WHERE entity_type = $1 AND entity_id = $2
             ORDER BY created_at DESC",
        )
        .bind(entity_type)
        .bind(entity_id)
        .fetch_all(pool)
        .await
        .map_err(Into::into)
    }
}
