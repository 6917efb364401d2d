use anyhow::Result;
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use uuid::Uuid;

use crate::common::{AuthError, UserId};
use crate::domains::users::{User, UserRole};

/// JWT Claims - data stored in the token
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Claims {
    pub sub: String,      // Subject (user id as string)
    pub user_id: UserId,  // Dashboard user
    pub role: UserRole,   // Role at issue time; the middleware re-reads it
    pub exp: i64,         // Expiration timestamp
    pub iat: i64,         // Issued at timestamp
    pub iss: String,      // Issuer
    pub jti: String,      // JWT ID (unique token identifier)
}

/// JWT Service - creates and verifies JWT tokens
#[derive(Clone)]
pub struct JwtService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    issuer: String,
    ttl: Duration,
}

impl JwtService {
    pub fn new(secret: &str, issuer: String, ttl: Duration) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            issuer,
            ttl,
        }
    }

    /// Create a new JWT token for a dashboard user
    pub fn create_token(&self, user: &User) -> Result<String> {
        let now = chrono::Utc::now();
        let exp = now
            .checked_add_signed(chrono::Duration::from_std(self.ttl)?)
            .ok_or_else(|| anyhow::anyhow!("Token lifetime out of range"))?;

        let claims = Claims {
            sub: user.id.to_string(),
            user_id: user.id,
            role: user.role,
            exp: exp.timestamp(),
            iat: now.timestamp(),
            iss: self.issuer.clone(),
            jti: Uuid::new_v4().to_string(),
        };

        encode(&Header::default(), &claims, &self.encoding_key).map_err(Into::into)
    }

    /// Verify and decode a JWT token, telling expiry apart from every other
    /// failure.
    pub fn verify_token(&self, token: &str) -> Result<Claims, AuthError> {
        let mut validation = Validation::default();
        validation.set_issuer(&[&self.issuer]);

        decode::<Claims>(token, &self.decoding_key, &validation)
            .map(|data| data.claims)
            .map_err(|e| match e.kind() {
                ErrorKind::ExpiredSignature => AuthError::TokenExpired,
                _ => AuthError::InvalidToken,
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    const SECRET: &str = "test_secret_key_that_is_long_enough";

    fn service() -> JwtService {
        JwtService::new(SECRET, "test_issuer".to_string(), Duration::from_secs(7 * 86400))
    }

    fn user() -> User {
        User {
            id: UserId::new(),
            phone_number: "6281234567890".into(),
            name: "Admin".into(),
            role: UserRole::Admin,
            organization: None,
            trust_level: 5,
            is_active: true,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_create_and_verify_token() {
        let user = user();
        let token = service().create_token(&user).unwrap();

        let claims = service().verify_token(&token).unwrap();
        assert_eq!(claims.user_id, user.id);
        assert_eq!(claims.sub, user.id.to_string());
        assert_eq!(claims.role, UserRole::Admin);
        assert_eq!(claims.iss, "test_issuer");

        let expires_in = claims.exp - claims.iat;
        assert_eq!(expires_in, 7 * 86400);
    }

    #[test]
    fn test_invalid_token() {
        assert_eq!(
            service().verify_token("invalid_token").unwrap_err(),
            AuthError::InvalidToken
        );
    }

    #[test]
    fn test_lifetime_past_calendar_range_is_an_error() {
        // Thirty million years: a valid chrono duration, but no valid expiry
        let svc = JwtService::new(SECRET, "test_issuer".to_string(), Duration::from_secs(1_000_000_000_000_000));
        assert!(svc.create_token(&user()).is_err());
    }

    #[test]
    fn test_wrong_secret() {
        let other = JwtService::new(
            "another_secret_key_that_is_long_enough",
            "test_issuer".to_string(),
            Duration::from_secs(3600),
        );
        let token = other.create_token(&user()).unwrap();

        // Token created with another secret should not verify
        assert_eq!(service().verify_token(&token).unwrap_err(), AuthError::InvalidToken);
    }

    #[test]
    fn test_wrong_issuer() {
        let other = JwtService::new(SECRET, "someone_else".to_string(), Duration::from_secs(3600));
        let token = other.create_token(&user()).unwrap();
        assert_eq!(service().verify_token(&token).unwrap_err(), AuthError::InvalidToken);
    }

    #[test]
    fn test_expired_token() {
        let user = user();
        let issued = Utc::now() - chrono::Duration::hours(2);
        let claims = Claims {
            sub: user.id.to_string(),
            user_id: user.id,
            role: user.role,
            exp: (issued + chrono::Duration::hours(1)).timestamp(),
            iat: issued.timestamp(),
            iss: "test_issuer".to_string(),
            jti: Uuid::new_v4().to_string(),
        };
        let token = encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(SECRET.as_bytes()),
        )
        .unwrap();

        assert_eq!(service().verify_token(&token).unwrap_err(), AuthError::TokenExpired);
    }
}
