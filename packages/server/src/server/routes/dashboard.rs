use axum::extract::Extension;
use chrono::Utc;

use crate::domains::reports::actions::{dashboard_stats, DashboardStats};
use crate::server::app::AppState;
use crate::server::error::ApiResult;
use crate::server::middleware::AuthUser;
use crate::server::response::ApiResponse;

/// GET /api/dashboard/stats
pub async fn dashboard_stats_handler(
    Extension(state): Extension<AppState>,
    _user: AuthUser,
) -> ApiResult<ApiResponse<DashboardStats>> {
    let stats = dashboard_stats(Utc::now(), &state.deps.db_pool).await?;
    Ok(ApiResponse::ok(stats))
}
