//! Dashboard authentication routes

use axum::extract::Extension;
use axum::Json;
use serde::{Deserialize, Serialize};

use crate::common::UserId;
use crate::domains::auth::{login, setup_admin, LoginResult, SetupAdminResult};
use crate::domains::users::{User, UserRole};
use crate::server::app::AppState;
use crate::server::error::{ApiError, ApiResult};
use crate::server::middleware::AuthUser;
use crate::server::response::ApiResponse;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginRequest {
    phone_number: Option<String>,
    username: Option<String>,
    password: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SetupAdminRequest {
    phone_number: Option<String>,
    name: Option<String>,
    password: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionUser {
    id: UserId,
    phone_number: String,
    name: String,
    role: UserRole,
    organization: Option<String>,
}

impl From<User> for SessionUser {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            phone_number: user.phone_number,
            name: user.name,
            role: user.role,
            organization: user.organization,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct Session {
    token: String,
    user: SessionUser,
}

/// POST /auth/login
pub async fn login_handler(
    Extension(state): Extension<AppState>,
    Json(request): Json<LoginRequest>,
) -> ApiResult<ApiResponse<Session>> {
    let identifier = request.phone_number.as_deref().or(request.username.as_deref());

    match login(identifier, request.password.as_deref(), &state.deps).await? {
        LoginResult::Authenticated { token, user } => Ok(ApiResponse::ok(Session {
            token,
            user: user.into(),
        })),
        LoginResult::MissingIdentifier => {
            Err(ApiError::bad_request("Phone number or username required"))
        }
        LoginResult::InvalidCredentials => {
            Err(ApiError::Unauthorized("Invalid credentials".to_string()))
        }
        LoginResult::PasswordRequired => Err(ApiError::Unauthorized("Password required".to_string())),
        LoginResult::Inactive => Err(ApiError::Forbidden("User is inactive".to_string())),
    }
}

/// POST /auth/setup-admin - one-time bootstrap
pub async fn setup_admin_handler(
    Extension(state): Extension<AppState>,
    Json(request): Json<SetupAdminRequest>,
) -> ApiResult<ApiResponse<Session>> {
    let result = setup_admin(
        request.phone_number.as_deref(),
        request.name.as_deref(),
        &state.deps,
    )
    .await?;

    match result {
        SetupAdminResult::Created { token, user } => {
            if request.password.is_some() && state.deps.auth.admin_password.is_none() {
                tracing::warn!("Admin password supplied at setup; configure ADMIN_PASSWORD to enable password login");
            }
            Ok(ApiResponse::ok(Session {
                token,
                user: user.into(),
            })
            .with_message("Admin created successfully"))
        }
        SetupAdminResult::AdminExists => Err(ApiError::bad_request("Admin already exists")),
        SetupAdminResult::MissingFields => {
            Err(ApiError::bad_request("Phone number and name required"))
        }
    }
}

/// GET /auth/me
pub async fn me_handler(AuthUser(user): AuthUser) -> ApiResponse<User> {
    ApiResponse::ok(user)
}
