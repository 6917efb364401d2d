//! Report routes: public web form, dashboard listing, detail, status
//! workflow and export.

use axum::extract::{Extension, Path, Query};
use axum::http::header::{CONTENT_DISPOSITION, CONTENT_TYPE};
use axum::response::{IntoResponse, Response};
use axum::Json;
use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::Deserialize;
use serde_json::json;

use crate::common::{PageParams, ReportId, UserId};
use crate::domains::audit::{AuditAction, AuditLog, NewAuditLog};
use crate::domains::intake::{submit_web_report, WebReportForm, WebReportResult};
use crate::domains::media::ReportMedia;
use crate::domains::notifications::notify_status_change;
use crate::domains::reports::actions::{
    get_report_detail, list_reports, update_report_status, with_relations, ReportDetail,
    ReportListItem, StatusUpdate,
};
use crate::domains::reports::export::reports_to_csv;
use crate::domains::reports::{
    ExportFilter, Report, ReportFilter, ReportStatus, ReportType, SortField, SortOrder, Urgency,
};
use crate::domains::users::{User, UserRole};
use crate::server::app::AppState;
use crate::server::error::{ApiError, ApiResult};
use crate::server::middleware::AuthUser;
use crate::server::response::ApiResponse;

const EXPORT_ROLES: &[UserRole] = &[UserRole::Admin, UserRole::PmiBnpb];
const STATUS_ROLES: &[UserRole] = &[UserRole::Admin, UserRole::Coordinator, UserRole::Volunteer];

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListReportsQuery {
    #[serde(rename = "type")]
    report_type: Option<ReportType>,
    status: Option<ReportStatus>,
    urgency: Option<Urgency>,
    search: Option<String>,
    page: Option<i64>,
    limit: Option<i64>,
    sort_by: Option<String>,
    sort_order: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportQuery {
    #[serde(rename = "type")]
    report_type: Option<ReportType>,
    status: Option<ReportStatus>,
    start_date: Option<String>,
    end_date: Option<String>,
    format: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusUpdateRequest {
    status: Option<ReportStatus>,
    notes: Option<String>,
    assigned_to_id: Option<UserId>,
}

/// POST /api/reports - public web form
pub async fn create_report_handler(
    Extension(state): Extension<AppState>,
    Json(form): Json<WebReportForm>,
) -> ApiResult<ApiResponse<Report>> {
    match submit_web_report(&form, &state.deps).await? {
        WebReportResult::Created(report) => {
            Ok(ApiResponse::created(report).with_message("Report submitted successfully"))
        }
        WebReportResult::MissingFields => {
            Err(ApiError::bad_request("Phone number and message required"))
        }
        WebReportResult::UnknownIntent => Err(ApiError::bad_request(
            "Could not identify report type. Please describe victims or needs.",
        )),
        WebReportResult::MissingLocation => Err(ApiError::bad_request("Location is required")),
    }
}

/// GET /api/reports
pub async fn list_reports_handler(
    Extension(state): Extension<AppState>,
    _user: AuthUser,
    Query(query): Query<ListReportsQuery>,
) -> ApiResult<ApiResponse<Vec<ReportListItem>>> {
    let sort_field = match query.sort_by.as_deref() {
        None => SortField::default(),
        Some(value) => SortField::parse(value)
            .ok_or_else(|| ApiError::bad_request(format!("Invalid sortBy: {}", value)))?,
    };
    let sort_order = match query.sort_order.as_deref() {
        None => SortOrder::default(),
        Some(value) => SortOrder::parse(value)
            .ok_or_else(|| ApiError::bad_request(format!("Invalid sortOrder: {}", value)))?,
    };

    let filter = ReportFilter {
        report_type: query.report_type,
        status: query.status,
        urgency: query.urgency,
        search: query
            .search
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty()),
    };
    let page = PageParams {
        page: query.page,
        limit: query.limit,
    }
    .validate();

    let (items, pagination) =
        list_reports(&filter, (sort_field, sort_order), &page, &state.deps.db_pool).await?;
    Ok(ApiResponse::paginated(items, pagination))
}

/// GET /api/reports/export - JSON by default, `format=csv` for a download
pub async fn export_reports_handler(
    Extension(state): Extension<AppState>,
    user: AuthUser,
    Query(query): Query<ExportQuery>,
) -> ApiResult<Response> {
    user.require(EXPORT_ROLES)?;

    let as_csv = match query.format.as_deref() {
        None | Some("json") => false,
        Some("csv") => true,
        Some(other) => return Err(ApiError::bad_request(format!("Unsupported format: {}", other))),
    };

    let filter = ExportFilter {
        report_type: query.report_type,
        status: query.status,
        start_date: parse_date_bound(query.start_date.as_deref(), DateBound::Start)
            .map_err(|_| ApiError::bad_request("Invalid startDate"))?,
        end_date: parse_date_bound(query.end_date.as_deref(), DateBound::End)
            .map_err(|_| ApiError::bad_request("Invalid endDate"))?,
    };

    let pool = &state.deps.db_pool;
    let reports = Report::find_for_export(&filter, pool).await?;
    let items = with_relations(reports, pool).await?;

    AuditLog::record(
        NewAuditLog::new(AuditAction::Export, "Report", "bulk")
            .by(user.0.id)
            .metadata(json!({
                "count": items.len(),
                "format": if as_csv { "csv" } else { "json" },
                "filters": {
                    "type": query.report_type,
                    "status": query.status,
                    "startDate": query.start_date,
                    "endDate": query.end_date,
                },
            })),
        pool,
    )
    .await?;

    tracing::info!(count = items.len(), user_id = %user.0.id, csv = as_csv, "Reports exported");

    if !as_csv {
        return Ok(ApiResponse::ok(items).into_response());
    }

    let body = reports_to_csv(&items)?;
    let disposition = format!(
        "attachment; filename=\"laporan-{}.csv\"",
        Utc::now().format("%Y%m%d")
    );
    Ok((
        [
            (CONTENT_TYPE, "text/csv; charset=utf-8".to_string()),
            (CONTENT_DISPOSITION, disposition),
        ],
        body,
    )
        .into_response())
}

/// GET /api/reports/:id
pub async fn get_report_handler(
    Extension(state): Extension<AppState>,
    _user: AuthUser,
    Path(id): Path<ReportId>,
) -> ApiResult<ApiResponse<ReportDetail>> {
    get_report_detail(id, &state.deps.db_pool)
        .await?
        .map(ApiResponse::ok)
        .ok_or_else(|| ApiError::not_found("Report not found"))
}

/// PATCH /api/reports/:id/status
pub async fn update_status_handler(
    Extension(state): Extension<AppState>,
    user: AuthUser,
    Path(id): Path<ReportId>,
    Json(request): Json<StatusUpdateRequest>,
) -> ApiResult<ApiResponse<Report>> {
    user.require(STATUS_ROLES)?;

    let update = StatusUpdate {
        status: request.status,
        notes: request.notes,
        assigned_to_id: request.assigned_to_id,
    };
    if update.is_empty() {
        return Err(ApiError::bad_request("Status or assignedToId required"));
    }

    let pool = &state.deps.db_pool;
    if let Some(assignee) = update.assigned_to_id {
        if User::find_by_id(assignee, pool).await?.is_none() {
            return Err(ApiError::bad_request("Assigned user not found"));
        }
    }

    let updated = update_report_status(id, &update, user.0.id, Utc::now(), pool)
        .await?
        .ok_or_else(|| ApiError::not_found("Report not found"))?;

    notify_status_change(&updated, &update, &state.deps).await;

    Ok(ApiResponse::ok(updated.report).with_message("Report status updated"))
}

/// GET /api/reports/:id/media
pub async fn report_media_handler(
    Extension(state): Extension<AppState>,
    _user: AuthUser,
    Path(id): Path<ReportId>,
) -> ApiResult<ApiResponse<Vec<ReportMedia>>> {
    let media = ReportMedia::find_by_report(id, &state.deps.db_pool).await?;
    Ok(ApiResponse::ok(media))
}

#[derive(Debug, Clone, Copy)]
enum DateBound {
    Start,
    End,
}

/// RFC 3339 timestamps pass through; bare `YYYY-MM-DD` dates cover the
/// whole UTC day on either side.
fn parse_date_bound(value: Option<&str>, bound: DateBound) -> Result<Option<DateTime<Utc>>, ()> {
    let Some(value) = value.map(str::trim).filter(|v| !v.is_empty()) else {
        return Ok(None);
    };

    if let Ok(timestamp) = DateTime::parse_from_rfc3339(value) {
        return Ok(Some(timestamp.with_timezone(&Utc)));
    }

    let date = NaiveDate::parse_from_str(value, "%Y-%m-%d").map_err(|_| ())?;
    let time = match bound {
        DateBound::Start => NaiveTime::MIN,
        DateBound::End => NaiveTime::from_hms_milli_opt(23, 59, 59, 999).ok_or(())?,
    };
    Ok(Some(date.and_time(time).and_utc()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_parse_date_bound_whole_day() {
        let start = parse_date_bound(Some("2026-10-01"), DateBound::Start).unwrap();
        assert_eq!(start, Some(Utc.with_ymd_and_hms(2026, 10, 1, 0, 0, 0).unwrap()));

        let end = parse_date_bound(Some("2026-10-01"), DateBound::End).unwrap().unwrap();
        assert_eq!(end.date_naive(), NaiveDate::from_ymd_opt(2026, 10, 1).unwrap());
        assert!(end > Utc.with_ymd_and_hms(2026, 10, 1, 23, 59, 59).unwrap());
    }

    #[test]
    fn test_parse_date_bound_rfc3339() {
        let parsed = parse_date_bound(Some("2026-10-01T07:00:00+07:00"), DateBound::Start).unwrap();
        assert_eq!(parsed, Some(Utc.with_ymd_and_hms(2026, 10, 1, 0, 0, 0).unwrap()));
    }

    #[test]
    fn test_parse_date_bound_empty_and_invalid() {
        assert_eq!(parse_date_bound(None, DateBound::Start), Ok(None));
        assert_eq!(parse_date_bound(Some("  "), DateBound::End), Ok(None));
        assert!(parse_date_bound(Some("01/10/2026"), DateBound::Start).is_err());
    }
}
