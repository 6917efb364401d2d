//! Dashboard login

use anyhow::Result;
use sha2::{Digest, Sha256};
use tracing::{info, warn};

use crate::domains::audit::{AuditAction, AuditLog, NewAuditLog};
use crate::domains::users::{User, UserRole};
use crate::kernel::{AuthSettings, ServerDeps};

pub enum LoginResult {
    Authenticated { token: String, user: User },
    MissingIdentifier,
    InvalidCredentials,
    PasswordRequired,
    Inactive,
}

fn digest(value: &str) -> [u8; 32] {
    Sha256::digest(value.as_bytes()).into()
}

/// Password check for a known, active user. Without a password only admins
/// get in, and only when the deployment allows it.
pub fn password_accepted(password: Option<&str>, role: UserRole, settings: &AuthSettings) -> Result<(), LoginResult> {
    match password.filter(|p| !p.is_empty()) {
        Some(password) => match settings.admin_password.as_deref() {
            Some(expected) if digest(password) == digest(expected) => Ok(()),
            _ => Err(LoginResult::InvalidCredentials),
        },
        None if role == UserRole::Admin && settings.allow_passwordless_admin => Ok(()),
        None => Err(LoginResult::PasswordRequired),
    }
}

/// `identifier` is a phone number (the dashboard also sends it as `username`).
pub async fn login(identifier: Option<&str>, password: Option<&str>, deps: &ServerDeps) -> Result<LoginResult> {
    let Some(identifier) = identifier.map(str::trim).filter(|i| !i.is_empty()) else {
        return Ok(LoginResult::MissingIdentifier);
    };

    let Some(user) = User::find_by_phone(identifier, &deps.db_pool).await? else {
        warn!(phone = %identifier, "Login for unknown user");
        return Ok(LoginResult::InvalidCredentials);
    };

    if !user.is_active {
        return Ok(LoginResult::Inactive);
    }

    if let Err(rejected) = password_accepted(password, user.role, &deps.auth) {
        warn!(user_id = %user.id, "Login rejected");
        return Ok(rejected);
    }

    let token = deps.jwt_service.create_token(&user)?;

    AuditLog::record(
        NewAuditLog::new(AuditAction::Login, "User", user.id).by(user.id),
        &deps.db_pool,
    )
    .await?;

    info!(user_id = %user.id, role = ?user.role, "User logged in");
    Ok(LoginResult::Authenticated { token, user })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn settings(admin_password: Option<&str>, passwordless: bool) -> AuthSettings {
        AuthSettings {
            admin_password: admin_password.map(str::to_string),
            allow_passwordless_admin: passwordless,
        }
    }

    #[test]
    fn test_matching_password() {
        let settings = settings(Some("rahasia-posko"), false);
        assert!(password_accepted(Some("rahasia-posko"), UserRole::Operator, &settings).is_ok());
        assert!(matches!(
            password_accepted(Some("salah"), UserRole::Admin, &settings),
            Err(LoginResult::InvalidCredentials)
        ));
    }

    #[test]
    fn test_password_rejected_when_none_configured() {
        let settings = settings(None, true);
        assert!(matches!(
            password_accepted(Some("anything"), UserRole::Admin, &settings),
            Err(LoginResult::InvalidCredentials)
        ));
    }

    #[test]
    fn test_passwordless_admin_only_when_allowed() {
        assert!(password_accepted(None, UserRole::Admin, &settings(None, true)).is_ok());
        assert!(matches!(
            password_accepted(None, UserRole::Admin, &settings(None, false)),
            Err(LoginResult::PasswordRequired)
        ));
        assert!(matches!(
            password_accepted(Some(""), UserRole::Coordinator, &settings(None, true)),
            Err(LoginResult::PasswordRequired)
        ));
    }
}
