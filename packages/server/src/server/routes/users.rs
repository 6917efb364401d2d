//! User administration (ADMIN only)

use axum::extract::{Extension, Path, Query};
use axum::Json;
use serde::Deserialize;
use serde_json::json;

use crate::common::UserId;
use crate::domains::audit::{AuditAction, AuditLog, NewAuditLog};
use crate::domains::users::{NewUser, User, UserChanges, UserRole, UserWithReportCount};
use crate::server::app::AppState;
use crate::server::error::{has_db_code, ApiError, ApiResult, FOREIGN_KEY_VIOLATION, UNIQUE_VIOLATION};
use crate::server::middleware::AuthUser;
use crate::server::response::ApiResponse;

const ADMIN_ONLY: &[UserRole] = &[UserRole::Admin];
const MAX_TRUST_LEVEL: i32 = 5;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListUsersQuery {
    role: Option<UserRole>,
    is_active: Option<bool>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateUserRequest {
    phone_number: Option<String>,
    name: Option<String>,
    role: Option<UserRole>,
    organization: Option<String>,
    trust_level: Option<i32>,
}

fn check_trust_level(trust_level: Option<i32>) -> ApiResult<()> {
    match trust_level {
        Some(level) if !(0..=MAX_TRUST_LEVEL).contains(&level) => Err(ApiError::bad_request(
            format!("trustLevel must be between 0 and {}", MAX_TRUST_LEVEL),
        )),
        _ => Ok(()),
    }
}

/// GET /api/users
pub async fn list_users_handler(
    Extension(state): Extension<AppState>,
    user: AuthUser,
    Query(query): Query<ListUsersQuery>,
) -> ApiResult<ApiResponse<Vec<UserWithReportCount>>> {
    user.require(ADMIN_ONLY)?;
    let users =
        User::list_with_report_counts(query.role, query.is_active, &state.deps.db_pool).await?;
    Ok(ApiResponse::ok(users))
}

/// GET /api/users/:id
pub async fn get_user_handler(
    Extension(state): Extension<AppState>,
    user: AuthUser,
    Path(id): Path<UserId>,
) -> ApiResult<ApiResponse<User>> {
    user.require(ADMIN_ONLY)?;
    User::find_by_id(id, &state.deps.db_pool)
        .await?
        .map(ApiResponse::ok)
        .ok_or_else(|| ApiError::not_found("User not found"))
}

/// POST /api/users
pub async fn create_user_handler(
    Extension(state): Extension<AppState>,
    user: AuthUser,
    Json(request): Json<CreateUserRequest>,
) -> ApiResult<ApiResponse<User>> {
    user.require(ADMIN_ONLY)?;

    let phone_number = request.phone_number.as_deref().map(str::trim).unwrap_or_default();
    let name = request.name.as_deref().map(str::trim).unwrap_or_default();
    if phone_number.is_empty() || name.is_empty() {
        return Err(ApiError::bad_request("Phone number and name required"));
    }
    check_trust_level(request.trust_level)?;

    let new_user = NewUser {
        phone_number: phone_number.to_string(),
        name: name.to_string(),
        role: request.role.unwrap_or(UserRole::Public),
        organization: request.organization,
        trust_level: request.trust_level.unwrap_or(0),
    };

    let pool = &state.deps.db_pool;
    let created = match User::insert(&new_user, pool).await {
        Ok(created) => created,
        Err(e) if has_db_code(&e, UNIQUE_VIOLATION) => {
            return Err(ApiError::Conflict("Phone number already registered".to_string()))
        }
        Err(e) => return Err(e.into()),
    };

    AuditLog::record(
        NewAuditLog::new(AuditAction::Create, "User", created.id)
            .by(user.0.id)
            .changes(json!({
                "phoneNumber": created.phone_number,
                "name": created.name,
                "role": created.role,
                "trustLevel": created.trust_level,
            })),
        pool,
    )
    .await?;

    tracing::info!(user_id = %created.id, role = ?created.role, "User created");
    Ok(ApiResponse::created(created))
}

/// PATCH /api/users/:id
pub async fn update_user_handler(
    Extension(state): Extension<AppState>,
    user: AuthUser,
    Path(id): Path<UserId>,
    Json(changes): Json<UserChanges>,
) -> ApiResult<ApiResponse<User>> {
    user.require(ADMIN_ONLY)?;
    if changes.is_empty() {
        return Err(ApiError::bad_request("No changes provided"));
    }
    check_trust_level(changes.trust_level)?;

    let pool = &state.deps.db_pool;
    let updated = User::update(id, &changes, pool)
        .await?
        .ok_or_else(|| ApiError::not_found("User not found"))?;

    AuditLog::record(
        NewAuditLog::new(AuditAction::Update, "User", id)
            .by(user.0.id)
            .changes(serde_json::to_value(&changes).map_err(anyhow::Error::from)?),
        pool,
    )
    .await?;

    Ok(ApiResponse::ok(updated))
}

/// DELETE /api/users/:id
pub async fn delete_user_handler(
    Extension(state): Extension<AppState>,
    user: AuthUser,
    Path(id): Path<UserId>,
) -> ApiResult<ApiResponse<()>> {
    user.require(ADMIN_ONLY)?;
    if id == user.0.id {
        return Err(ApiError::bad_request("Cannot delete your own account"));
    }

    let pool = &state.deps.db_pool;
    let deleted = match User::delete(id, pool).await {
        Ok(deleted) => deleted,
        Err(e) if has_db_code(&e, FOREIGN_KEY_VIOLATION) => {
            return Err(ApiError::Conflict(
                "User has submitted reports; deactivate instead".to_string(),
            ))
        }
        Err(e) => return Err(e.into()),
    };
    if !deleted {
        return Err(ApiError::not_found("User not found"));
    }

    AuditLog::record(
        NewAuditLog::new(AuditAction::Delete, "User", id).by(user.0.id),
        pool,
    )
    .await?;

    tracing::info!(user_id = %id, deleted_by = %user.0.id, "User deleted");
    Ok(ApiResponse::message("User deleted"))
}
