//! Test fixtures for creating test data.
//!
//! These fixtures use the model methods directly to create test data.

use anyhow::Result;
use axum::body::{to_bytes, Body};
use axum::http::{Method, Request, StatusCode};
use axum::Router;
use serde_json::Value;
use server_core::domains::users::{NewUser, User, UserRole};
use server_core::kernel::ServerDeps;
use sqlx::PgPool;
use tower::ServiceExt;
use whatsapp::{IncomingMedia, IncomingMessage, MediaKind};

/// Insert a user with the given role and trust level
pub async fn create_user(
    pool: &PgPool,
    phone_number: &str,
    name: &str,
    role: UserRole,
    trust_level: i32,
) -> Result<User> {
    User::insert(
        &NewUser {
            phone_number: phone_number.to_string(),
            name: name.to_string(),
            role,
            organization: None,
            trust_level,
        },
        pool,
    )
    .await
}

/// Bearer token for `user`
pub fn token_for(deps: &ServerDeps, user: &User) -> String {
    deps.jwt_service
        .create_token(user)
        .expect("Failed to create token")
}

/// Plain text WhatsApp message
pub fn text_message(from: &str, text: &str) -> IncomingMessage {
    IncomingMessage {
        message_id: format!("wamid.{}", uuid::Uuid::new_v4().simple()),
        from: from.to_string(),
        name: Some("Warga".to_string()),
        timestamp: None,
        text: text.to_string(),
        media: None,
    }
}

/// Photo message with an optional caption
pub fn image_message(from: &str, media_id: &str, caption: &str) -> IncomingMessage {
    IncomingMessage {
        media: Some(IncomingMedia {
            kind: MediaKind::Image,
            id: media_id.to_string(),
            mime_type: Some("image/jpeg".to_string()),
            sha256: None,
            filename: None,
        }),
        ..text_message(from, caption)
    }
}

/// Status and JSON body of a response
pub struct TestResponse {
    pub status: StatusCode,
    pub body: Value,
    pub content_type: Option<String>,
    pub raw: Vec<u8>,
}

/// Send one request through the router
pub async fn send(
    app: &Router,
    method: Method,
    uri: &str,
    token: Option<&str>,
    body: Option<Value>,
) -> TestResponse {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header("authorization", format!("Bearer {}", token));
    }
    let request = match body {
        Some(body) => builder
            .header("content-type", "application/json")
            .body(Body::from(body.to_string())),
        None => builder.body(Body::empty()),
    }
    .expect("Failed to build request");

    let response = app
        .clone()
        .oneshot(request)
        .await
        .expect("Router failed");

    let status = response.status();
    let content_type = response
        .headers()
        .get("content-type")
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);
    let raw = to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("Failed to read body")
        .to_vec();
    let body = serde_json::from_slice(&raw).unwrap_or(Value::Null);

    TestResponse {
        status,
        body,
        content_type,
        raw,
    }
}
