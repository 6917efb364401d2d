//! First-run administrator bootstrap

use anyhow::Result;
use tracing::info;

use crate::domains::audit::{AuditAction, AuditLog, NewAuditLog};
use crate::domains::users::{NewUser, User, UserRole};
use crate::kernel::ServerDeps;

pub enum SetupAdminResult {
    Created { token: String, user: User },
    AdminExists,
    MissingFields,
}

/// Create the first admin, or promote the existing account that owns the
/// phone number. Refused once any admin exists.
pub async fn setup_admin(phone_number: Option<&str>, name: Option<&str>, deps: &ServerDeps) -> Result<SetupAdminResult> {
    if User::admin_exists(&deps.db_pool).await? {
        return Ok(SetupAdminResult::AdminExists);
    }

    let phone_number = phone_number.map(str::trim).filter(|p| !p.is_empty());
    let name = name.map(str::trim).filter(|n| !n.is_empty());
    let (Some(phone_number), Some(name)) = (phone_number, name) else {
        return Ok(SetupAdminResult::MissingFields);
    };

    let admin = match User::find_by_phone(phone_number, &deps.db_pool).await? {
        Some(existing) => User::promote_to_admin(existing.id, name, &deps.db_pool).await?,
        None => {
            User::insert(
                &NewUser {
                    phone_number: phone_number.to_string(),
                    name: name.to_string(),
                    role: UserRole::Admin,
                    organization: None,
                    trust_level: 5,
                },
                &deps.db_pool,
            )
            .await?
        }
    };

    AuditLog::record(
        NewAuditLog::new(AuditAction::Create, "User", admin.id)
            .by(admin.id)
            .metadata(serde_json::json!({ "setup": true })),
        &deps.db_pool,
    )
    .await?;

    let token = deps.jwt_service.create_token(&admin)?;
    info!(user_id = %admin.id, "Admin user created");

    Ok(SetupAdminResult::Created { token, user: admin })
}
