use anyhow::Result;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{PgExecutor, PgPool};

use crate::common::UserId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "user_role", rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum UserRole {
    Admin,
    Coordinator,
    Operator,
    Volunteer,
    PmiBnpb,
    Public,
}

/// Reporter or dashboard account, keyed by WhatsApp phone number
#[derive(sqlx::FromRow, Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: UserId,
    pub phone_number: String,
    pub name: String,
    pub role: UserRole,
    pub organization: Option<String>,
    pub trust_level: i32,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Minimal user projection embedded in report payloads
#[derive(sqlx::FromRow, Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserSummary {
    pub id: UserId,
    pub name: String,
    pub phone_number: String,
    pub role: UserRole,
    pub trust_level: i32,
}

/// User row with its report count (admin listing)
#[derive(sqlx::FromRow, Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserWithReportCount {
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub user: User,
    pub report_count: i64,
}

#[derive(Debug, Clone)]
pub struct NewUser {
    pub phone_number: String,
    pub name: String,
    pub role: UserRole,
    pub organization: Option<String>,
    pub trust_level: i32,
}

/// Partial update; `None` leaves the column untouched.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserChanges {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role: Option<UserRole>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub organization: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub trust_level: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_active: Option<bool>,
}

impl UserChanges {
    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.role.is_none()
            && self.organization.is_none()
            && self.trust_level.is_none()
            && self.is_active.is_none()
    }
}

impl User {
    pub async fn find_by_id(id: UserId, pool: &PgPool) -> Result<Option<Self>> {
        sqlx::query_as::<_, Self>("SELECT * FROM users WHERE id = $1")
            .bind(id)
            .fetch_optional(pool)
            .await
            .map_err(Into::into)
    }

    pub async fn find_by_phone<'e>(
        phone_number: &str,
        executor: impl PgExecutor<'e>,
    ) -> Result<Option<Self>> {
        sqlx::query_as::<_, Self>("SELECT * FROM users WHERE phone_number = $1")
            .bind(phone_number)
            .fetch_optional(executor)
            .await
            .map_err(Into::into)
    }

    pub async fn insert(new: &NewUser, pool: &PgPool) -> Result<Self> {
        sqlx::query_as::<_, Self>(
            "INSERT INTO users (id, phone_number, name, role, organization, trust_level)
             VALUES ($1, $2, $3, $4, $5, $6)
             RETURNING *",
        )
        .bind(UserId::new())
        .bind(&new.phone_number)
        .bind(&new.name)
        .bind(new.role)
        .bind(&new.organization)
        .bind(new.trust_level)
        .fetch_one(pool)
        .await
        .map_err(Into::into)
    }

    /// Insert unless the phone number already exists. Returns the row and
    /// whether it was created by this call.
    pub async fn find_or_create(new: &NewUser, pool: &PgPool) -> Result<(Self, bool)> {
        let inserted = sqlx::query_as::<_, Self>(
            "INSERT INTO users (id, phone_number, name, role, organization, trust_level)
             VALUES ($1, $2, $3, $4, $5, $6)
             ON CONFLICT (phone_number) DO NOTHING
             RETURNING *",
        )
        .bind(UserId::new())
        .bind(&new.phone_number)
        .bind(&new.name)
        .bind(new.role)
        .bind(&new.organization)
        .bind(new.trust_level)
        .fetch_optional(pool)
        .await?;

        if let Some(user) = inserted {
            return Ok((user, true));
        }

        let existing = sqlx::query_as::<_, Self>("SELECT * FROM users WHERE phone_number = $1")
            .bind(&new.phone_number)
            .fetch_one(pool)
            .await?;
        Ok((existing, false))
    }

    pub async fn update(id: UserId, changes: &UserChanges, pool: &PgPool) -> Result<Option<Self>> {
        sqlx::query_as::<_, Self>(
            "UPDATE users SET
                name = COALESCE($2, name),
                role = COALESCE($3, role),
                organization = COALESCE($4, organization),
                trust_level = COALESCE($5, trust_level),
                is_active = COALESCE($6, is_active),
                updated_at = NOW()
             WHERE id = $1
             RETURNING *",
        )
        .bind(id)
        .bind(&changes.name)
        .bind(changes.role)
        .bind(&changes.organization)
        .bind(changes.trust_level)
        .bind(changes.is_active)
        .fetch_optional(pool)
        .await
        .map_err(Into::into)
    }

    /// Promote an existing account to administrator (first-run setup).
    pub async fn promote_to_admin(id: UserId, name: &str, pool: &PgPool) -> Result<Self> {
        sqlx::query_as::<_, Self>(
            "UPDATE users
             SET role = 'ADMIN', trust_level = 5, is_active = TRUE, name = $2, updated_at = NOW()
             WHERE id = $1
             RETURNING *",
        )
        .bind(id)
        .bind(name)
        .fetch_one(pool)
        .await
        .map_err(Into::into)
    }

    pub async fn delete(id: UserId, pool: &PgPool) -> Result<bool> {
        let result = sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    pub async fn admin_exists(pool: &PgPool) -> Result<bool> {
        sqlx::query_scalar::<_, bool>("SELECT EXISTS (SELECT 1 FROM users WHERE role = 'ADMIN')")
            .fetch_one(pool)
            .await
            .map_err(Into::into)
    }

    /// Admin listing with optional role / active filters, newest first.
    pub async fn list_with_report_counts(
        role: Option<UserRole>,
        is_active: Option<bool>,
        pool: &PgPool,
    ) -> Result<Vec<UserWithReportCount>> {
        sqlx::query_as::<_, UserWithReportCount>(
            "SELECT u.*, COUNT(r.id) AS report_count
             FROM users u
             LEFT JOIN reports r ON r.reporter_id = u.id
             WHERE ($1::user_role IS NULL OR u.role = $1)
               AND ($2::boolean IS NULL OR u.is_active = $2)
             GROUP BY u.id
             ORDER BY u.created_at DESC",
        )
        .bind(role)
        .bind(is_active)
        .fetch_all(pool)
        .await
        .map_err(Into::into)
    }

    pub async fn find_summaries(ids: &[UserId], pool: &PgPool) -> Result<Vec<UserSummary>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        sqlx::query_as::<_, UserSummary>(
            "SELECT id, name, phone_number, role, trust_level FROM users WHERE id = ANY($1)",
        )
        .bind(ids)
        .fetch_all(pool)
        .await
        .map_err(Into::into)
    }

    pub fn is_volunteer(&self) -> bool {
        self.role == UserRole::Volunteer
    }

    pub fn summary(&self) -> UserSummary {
        UserSummary {
            id: self.id,
            name: self.name.clone(),
            phone_number: self.phone_number.clone(),
            role: self.role,
            trust_level: self.trust_level,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_wire_format() {
        assert_eq!(
            serde_json::to_string(&UserRole::PmiBnpb).unwrap(),
            "\"PMI_BNPB\""
        );
        let role: UserRole = serde_json::from_str("\"VOLUNTEER\"").unwrap();
        assert_eq!(role, UserRole::Volunteer);
    }

    #[test]
    fn test_changes_accept_camel_case() {
        let changes: UserChanges =
            serde_json::from_str(r#"{"trustLevel": 4, "isActive": false}"#).unwrap();
        assert_eq!(changes.trust_level, Some(4));
        assert_eq!(changes.is_active, Some(false));
        assert!(changes.role.is_none());
    }
}
