use axum::async_trait;
use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use axum::{middleware::Next, response::Response};
use std::sync::Arc;
use tracing::debug;

use crate::common::auth::require_role;
use crate::common::AuthError;
use crate::domains::auth::{Claims, JwtService};
use crate::domains::users::{User, UserRole};
use crate::server::app::AppState;
use crate::server::error::ApiError;

/// Outcome of reading the bearer token, stored in request extensions
#[derive(Clone, Debug)]
pub struct TokenOutcome(pub Result<Claims, AuthError>);

/// JWT authentication middleware
///
/// Extracts the bearer token, verifies it, and records the claims or the
/// failure kind. Requests always continue; routes that need a user reject
/// through the `AuthUser` extractor.
pub async fn jwt_auth_middleware(
    jwt_service: Arc<JwtService>,
    mut request: axum::http::Request<axum::body::Body>,
    next: Next,
) -> Response {
    let outcome = extract_claims(&request, &jwt_service);

    match &outcome {
        Ok(claims) => debug!(user_id = %claims.user_id, "Authenticated request"),
        Err(e) => debug!(reason = %e, "No valid authentication token"),
    }
    request.extensions_mut().insert(TokenOutcome(outcome));

    next.run(request).await
}

fn extract_claims(
    request: &axum::http::Request<axum::body::Body>,
    jwt_service: &JwtService,
) -> Result<Claims, AuthError> {
    let token = request
        .headers()
        .get("authorization")
        .and_then(|h| h.to_str().ok())
        .and_then(|h| h.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .ok_or(AuthError::MissingToken)?;

    jwt_service.verify_token(token)
}

/// Authenticated, active dashboard user
#[derive(Clone, Debug)]
pub struct AuthUser(pub User);

impl AuthUser {
    pub fn require(&self, allowed: &[UserRole]) -> Result<(), ApiError> {
        require_role(self.0.role, allowed).map_err(Into::into)
    }
}

#[async_trait]
impl<S: Send + Sync> FromRequestParts<S> for AuthUser {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let claims = parts
            .extensions
            .get::<TokenOutcome>()
            .map(|outcome| outcome.0.clone())
            .unwrap_or(Err(AuthError::MissingToken))?;

        let state = parts
            .extensions
            .get::<AppState>()
            .cloned()
            .ok_or_else(|| anyhow::anyhow!("AppState extension missing"))?;

        let user = User::find_by_id(claims.user_id, &state.deps.db_pool)
            .await?
            .ok_or(AuthError::UserNotFound)?;

        if !user.is_active {
            return Err(AuthError::InactiveUser.into());
        }

        Ok(AuthUser(user))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::UserId;
    use chrono::Utc;
    use std::time::Duration;

    fn jwt_service() -> JwtService {
        JwtService::new(
            "test_secret_key_that_is_long_enough",
            "test_issuer".to_string(),
            Duration::from_secs(3600),
        )
    }

    fn user() -> User {
        User {
            id: UserId::new(),
            phone_number: "6281234567890".into(),
            name: "Koordinator".into(),
            role: UserRole::Coordinator,
            organization: None,
            trust_level: 3,
            is_active: true,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_extract_token_with_bearer() {
        let jwt_service = jwt_service();
        let user = user();
        let token = jwt_service.create_token(&user).unwrap();

        let request = axum::http::Request::builder()
            .header("authorization", format!("Bearer {}", token))
            .body(axum::body::Body::empty())
            .unwrap();

        let claims = extract_claims(&request, &jwt_service).unwrap();
        assert_eq!(claims.user_id, user.id);
    }

    #[test]
    fn test_raw_token_is_rejected() {
        let jwt_service = jwt_service();
        let token = jwt_service.create_token(&user()).unwrap();

        let request = axum::http::Request::builder()
            .header("authorization", token)
            .body(axum::body::Body::empty())
            .unwrap();

        assert_eq!(
            extract_claims(&request, &jwt_service).unwrap_err(),
            AuthError::MissingToken
        );
    }

    #[test]
    fn test_no_auth_header() {
        let request = axum::http::Request::builder()
            .body(axum::body::Body::empty())
            .unwrap();

        assert_eq!(
            extract_claims(&request, &jwt_service()).unwrap_err(),
            AuthError::MissingToken
        );
    }

    #[test]
    fn test_invalid_token() {
        let request = axum::http::Request::builder()
            .header("authorization", "Bearer invalid_token")
            .body(axum::body::Body::empty())
            .unwrap();

        assert_eq!(
            extract_claims(&request, &jwt_service()).unwrap_err(),
            AuthError::InvalidToken
        );
    }
}
