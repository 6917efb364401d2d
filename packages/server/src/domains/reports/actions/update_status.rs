use anyhow::Result;
use chrono::{DateTime, Utc};
use serde_json::json;
use sqlx::PgPool;
use tracing::info;

use crate::common::{ReportId, UserId};
use crate::domains::audit::{AuditAction, AuditLog, NewAuditLog};
use crate::domains::reports::models::{
    ActionType, Report, ReportAction, ReportStatus, StatusChanges,
};

/// Dashboard request to move a report along its lifecycle
#[derive(Debug, Clone, Default)]
pub struct StatusUpdate {
    pub status: Option<ReportStatus>,
    pub notes: Option<String>,
    pub assigned_to_id: Option<UserId>,
}

impl StatusUpdate {
    pub fn is_empty(&self) -> bool {
        self.status.is_none() && self.assigned_to_id.is_none()
    }

    /// Column changes implied by the request. Assignment always wins over
    /// an explicit status.
    pub fn changes(&self, actor: UserId, now: DateTime<Utc>) -> StatusChanges {
        let mut changes = StatusChanges {
            status: self.status,
            ..Default::default()
        };
        match self.status {
            Some(ReportStatus::Verified) => {
                changes.verified_by = Some(actor);
                changes.verified_at = Some(now);
            }
            Some(ReportStatus::Resolved) => changes.resolved_at = Some(now),
            _ => {}
        }
        if let Some(assignee) = self.assigned_to_id {
            changes.status = Some(ReportStatus::Assigned);
            changes.assigned_to_id = Some(assignee);
            changes.assigned_at = Some(now);
        }
        changes
    }
}

#[derive(Debug, Clone)]
pub struct StatusUpdated {
    pub report: Report,
    pub previous_status: ReportStatus,
}

/// Apply the update, log the action and audit the transition. `None` when
/// the report does not exist.
pub async fn update_report_status(
    report_id: ReportId,
    update: &StatusUpdate,
    actor: UserId,
    now: DateTime<Utc>,
    pool: &PgPool,
) -> Result<Option<StatusUpdated>> {
    let mut tx = pool.begin().await?;

    let previous_status = sqlx::query_scalar::<_, ReportStatus>(
        "SELECT status FROM reports WHERE id = $1 FOR UPDATE",
    )
    .bind(report_id)
    .fetch_optional(&mut *tx)
    .await?;
    let Some(previous_status) = previous_status else {
        return Ok(None);
    };

    let changes = update.changes(actor, now);
    let Some(report) = Report::apply_status_changes(report_id, &changes, &mut *tx).await? else {
        return Ok(None);
    };

    let action_type = if update.assigned_to_id.is_some() {
        ActionType::Assignment
    } else {
        ActionType::StatusUpdate
    };
    let description = update
        .notes
        .as_deref()
        .map(str::trim)
        .filter(|n| !n.is_empty())
        .map(str::to_string)
        .unwrap_or_else(|| format!("Status changed to {}", report.status.as_str()));

    ReportAction::insert(report_id, action_type, &description, Some(actor), &mut *tx).await?;

    let mut audit_changes = json!({
        "status": {"from": previous_status, "to": report.status},
    });
    if let Some(assignee) = update.assigned_to_id {
        audit_changes["assignedToId"] = json!(assignee);
    }
    AuditLog::record(
        NewAuditLog::new(AuditAction::Update, "Report", report_id)
            .by(actor)
            .report(report_id)
            .changes(audit_changes),
        &mut *tx,
    )
    .await?;

    tx.commit().await?;

    info!(
        report_number = %report.report_number,
        from = previous_status.as_str(),
        to = report.status.as_str(),
        user_id = %actor,
        "Report status updated"
    );

    Ok(Some(StatusUpdated {
        report,
        previous_status,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_verified_sets_verifier() {
        let actor = UserId::new();
        let now = Utc::now();
        let changes = StatusUpdate {
            status: Some(ReportStatus::Verified),
            ..Default::default()
        }
        .changes(actor, now);

        assert_eq!(changes.status, Some(ReportStatus::Verified));
        assert_eq!(changes.verified_by, Some(actor));
        assert_eq!(changes.verified_at, Some(now));
        assert!(changes.resolved_at.is_none());
    }

    #[test]
    fn test_resolved_sets_timestamp() {
        let now = Utc::now();
        let changes = StatusUpdate {
            status: Some(ReportStatus::Resolved),
            ..Default::default()
        }
        .changes(UserId::new(), now);
        assert_eq!(changes.resolved_at, Some(now));
        assert!(changes.verified_by.is_none());
    }

    #[test]
    fn test_assignment_overrides_status() {
        let assignee = UserId::new();
        let changes = StatusUpdate {
            status: Some(ReportStatus::InProgress),
            notes: None,
            assigned_to_id: Some(assignee),
        }
        .changes(UserId::new(), Utc::now());

        assert_eq!(changes.status, Some(ReportStatus::Assigned));
        assert_eq!(changes.assigned_to_id, Some(assignee));
        assert!(changes.assigned_at.is_some());
    }

    #[test]
    fn test_empty_update() {
        assert!(StatusUpdate::default().is_empty());
        assert!(StatusUpdate {
            notes: Some("cek lokasi".into()),
            ..Default::default()
        }
        .is_empty());
    }
}
