use anyhow::Result;
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use sqlx::types::Json;
use sqlx::PgPool;

use crate::domains::extraction::ExtractedReport;
use crate::domains::media::PendingMedia;

/// Idle time after which a conversation is abandoned.
pub const STATE_TTL_MINUTES: i64 = 60;

/// Fields that must be filled before a report can be created.
pub const CRITICAL_FIELDS: &[&str] = &["location"];

pub fn is_critical(field: &str) -> bool {
    CRITICAL_FIELDS.contains(&field)
}

/// Slot-filling progress for one sender
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConversationState {
    pub extracted_data: ExtractedReport,
    /// Critical fields still to ask for, in order
    pub missing_fields: Vec<String>,
    pub original_message: String,
    #[serde(default)]
    pub pending_media: Vec<PendingMedia>,
}

#[derive(sqlx::FromRow, Debug, Clone)]
pub struct ChatState {
    pub phone_number: String,
    pub current_intent: String,
    pub state: Json<ConversationState>,
    pub last_message_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

impl ChatState {
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now - self.last_message_at > Duration::minutes(STATE_TTL_MINUTES)
    }

    /// The sender's conversation, unless it has gone idle, in which case the
    /// stale row is removed.
    pub async fn find_active(
        phone_number: &str,
        now: DateTime<Utc>,
        pool: &PgPool,
    ) -> Result<Option<Self>> {
        let state = sqlx::query_as::<_, Self>("SELECT * FROM chat_states WHERE phone_number = $1")
            .bind(phone_number)
            .fetch_optional(pool)
            .await?;

        match state {
            Some(state) if state.is_expired(now) => {
                Self::clear(phone_number, pool).await?;
                Ok(None)
            }
            other => Ok(other),
        }
    }

    /// Upsert and refresh `last_message_at`.
    pub async fn save(
        phone_number: &str,
        state: &ConversationState,
        now: DateTime<Utc>,
        pool: &PgPool,
    ) -> Result<Self> {
        sqlx::query_as::<_, Self>(
            r#"
            INSERT INTO chat_states (phone_number, current_intent, state, last_message_at)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (phone_number) DO UPDATE SET
                current_intent = EXCLUDED.current_intent,
                state = EXCLUDED.state,
                last_message_at = EXCLUDED.last_message_at
            RETURNING *
            "#,
        )
        .bind(phone_number)
        .bind(state.extracted_data.intent.as_str())
        .bind(Json(state))
        .bind(now)
        .fetch_one(pool)
        .await
        .map_err(Into::into)
    }

    /// No-op when there is no conversation.
    pub async fn clear(phone_number: &str, pool: &PgPool) -> Result<()> {
        sqlx::query("DELETE FROM chat_states WHERE phone_number = $1")
            .bind(phone_number)
            .execute(pool)
            .await?;
        Ok(())
    }

    /// Sweep conversations idle for longer than the TTL.
    pub async fn delete_expired(now: DateTime<Utc>, pool: &PgPool) -> Result<u64> {
        let cutoff = now - Duration::minutes(STATE_TTL_MINUTES);
        let result = sqlx::query("DELETE FROM chat_states WHERE last_message_at < $1")
            .bind(cutoff)
            .execute(pool)
            .await?;
        Ok(result.rows_affected())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn state_at(last_message_at: DateTime<Utc>) -> ChatState {
        ChatState {
            phone_number: "6281234567890".into(),
            current_intent: "korban".into(),
            state: Json(ConversationState {
                extracted_data: ExtractedReport::default(),
                missing_fields: vec!["location".into()],
                original_message: "3 orang luka".into(),
                pending_media: Vec::new(),
            }),
            last_message_at,
            created_at: last_message_at,
        }
    }

    #[test]
    fn test_expiry_boundary() {
        let now = Utc::now();
        assert!(!state_at(now - Duration::minutes(59)).is_expired(now));
        assert!(!state_at(now - Duration::minutes(60)).is_expired(now));
        assert!(state_at(now - Duration::minutes(61)).is_expired(now));
    }

    #[test]
    fn test_only_location_is_critical() {
        assert!(is_critical("location"));
        assert!(!is_critical("name"));
        assert!(!is_critical("peopleAffected"));
    }
}
