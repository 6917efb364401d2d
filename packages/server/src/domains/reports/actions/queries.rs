//! Read-side assembly for the dashboard: reports with their related rows,
//! batch-loaded per page instead of per report.

use anyhow::Result;
use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::PgPool;
use std::collections::{BTreeMap, HashMap};

use crate::common::time::start_of_utc_day;
use crate::common::{Pagination, ReportId, UserId, ValidatedPage};
use crate::domains::audit::{AuditLog, AuditLogWithUser};
use crate::domains::media::ReportMedia;
use crate::domains::reports::models::{
    count_by_type, count_unresolved_by_urgency, Report, ReportAction, ReportFilter, ReportNeed,
    ReportPerson, SortField, SortOrder, StatsSummary,
};
use crate::domains::users::{User, UserSummary};

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportListItem {
    #[serde(flatten)]
    pub report: Report,
    pub reporter: Option<UserSummary>,
    pub assigned_to: Option<UserSummary>,
    pub persons: Vec<ReportPerson>,
    pub needs: Vec<ReportNeed>,
    pub action_count: i64,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportDetail {
    #[serde(flatten)]
    pub report: Report,
    pub reporter: Option<UserSummary>,
    pub assigned_to: Option<UserSummary>,
    pub persons: Vec<ReportPerson>,
    pub needs: Vec<ReportNeed>,
    pub media: Vec<ReportMedia>,
    pub actions: Vec<ReportAction>,
    pub audit_logs: Vec<AuditLogWithUser>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardStats {
    pub summary: StatsSummary,
    pub reports_by_type: BTreeMap<String, i64>,
    pub reports_by_urgency: BTreeMap<String, i64>,
    pub recent_reports: Vec<ReportListItem>,
}

/// Attach reporter, assignee, persons, needs and action counts.
pub async fn with_relations(reports: Vec<Report>, pool: &PgPool) -> Result<Vec<ReportListItem>> {
    let report_ids: Vec<ReportId> = reports.iter().map(|r| r.id).collect();
    let mut user_ids: Vec<UserId> = reports
        .iter()
        .flat_map(|r| std::iter::once(r.reporter_id).chain(r.assigned_to_id))
        .collect();
    user_ids.sort_by_key(|id| *id.as_uuid());
    user_ids.dedup();

    let users: HashMap<UserId, UserSummary> = User::find_summaries(&user_ids, pool)
        .await?
        .into_iter()
        .map(|u| (u.id, u))
        .collect();

    let mut persons: HashMap<ReportId, Vec<ReportPerson>> = HashMap::new();
    for person in ReportPerson::find_by_report_ids(&report_ids, pool).await? {
        persons.entry(person.report_id).or_default().push(person);
    }

    let mut needs: HashMap<ReportId, Vec<ReportNeed>> = HashMap::new();
    for need in ReportNeed::find_by_report_ids(&report_ids, pool).await? {
        needs.entry(need.report_id).or_default().push(need);
    }

    let action_counts: HashMap<ReportId, i64> = ReportAction::count_by_report_ids(&report_ids, pool)
        .await?
        .into_iter()
        .collect();

    Ok(reports
        .into_iter()
        .map(|report| ReportListItem {
            reporter: users.get(&report.reporter_id).cloned(),
            assigned_to: report.assigned_to_id.and_then(|id| users.get(&id).cloned()),
            persons: persons.remove(&report.id).unwrap_or_default(),
            needs: needs.remove(&report.id).unwrap_or_default(),
            action_count: action_counts.get(&report.id).copied().unwrap_or(0),
            report,
        })
        .collect())
}

pub async fn list_reports(
    filter: &ReportFilter,
    sort: (SortField, SortOrder),
    page: &ValidatedPage,
    pool: &PgPool,
) -> Result<(Vec<ReportListItem>, Pagination)> {
    let (reports, total) = Report::find_filtered(filter, sort, page, pool).await?;
    let items = with_relations(reports, pool).await?;
    Ok((items, Pagination::new(page, total)))
}

pub async fn get_report_detail(id: ReportId, pool: &PgPool) -> Result<Option<ReportDetail>> {
    let Some(report) = Report::find_by_id(id, pool).await? else {
        return Ok(None);
    };

    let media = ReportMedia::find_by_report(id, pool).await?;
    let actions = ReportAction::find_by_report(id, pool).await?;
    let audit_logs = AuditLog::find_by_report(id, pool).await?;

    let Some(item) = with_relations(vec![report], pool).await?.pop() else {
        return Ok(None);
    };

    Ok(Some(ReportDetail {
        report: item.report,
        reporter: item.reporter,
        assigned_to: item.assigned_to,
        persons: item.persons,
        needs: item.needs,
        media,
        actions,
        audit_logs,
    }))
}

pub async fn dashboard_stats(now: DateTime<Utc>, pool: &PgPool) -> Result<DashboardStats> {
    let summary = StatsSummary::load(start_of_utc_day(now), pool).await?;

    let reports_by_type = count_by_type(pool)
        .await?
        .into_iter()
        .map(|(report_type, count)| (report_type.as_str().to_string(), count))
        .collect();
    let reports_by_urgency = count_unresolved_by_urgency(pool)
        .await?
        .into_iter()
        .map(|(urgency, count)| (urgency.as_str().to_string(), count))
        .collect();

    let recent = Report::find_recent(10, pool).await?;
    let recent_reports = with_relations(recent, pool).await?;

    Ok(DashboardStats {
        summary,
        reports_by_type,
        reports_by_urgency,
        recent_reports,
    })
}
