// WhatsApp Cloud API client
//
// Covers the calls the intake service makes against the Graph API:
// text messages, read receipts, media lookup/download and the phone number
// lookup used for health checks. Webhook payload parsing lives in `webhook`.

use std::time::Duration;

pub mod error;
pub mod models;
pub mod webhook;

use reqwest::{header, Client};
use tracing::{debug, warn};

pub use error::{Result, WhatsAppError};
pub use models::{MediaInfo, PhoneNumberInfo, SendMessageResponse};
pub use webhook::{
    parse_incoming, verify_subscription, IncomingMedia, IncomingMessage, MediaKind,
    WebhookPayload,
};

const DEFAULT_GRAPH_BASE: &str = "https://graph.facebook.com";
const MEDIA_DOWNLOAD_TIMEOUT: Duration = Duration::from_secs(60);
const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(15);

#[derive(Debug, Clone)]
pub struct WhatsAppOptions {
    pub phone_number_id: String,
    pub access_token: String,
    pub api_version: String,
    /// Override for tests; defaults to the public Graph endpoint.
    pub base_url: Option<String>,
}

#[derive(Debug, Clone)]
pub struct WhatsAppService {
    options: WhatsAppOptions,
    client: Client,
}

impl WhatsAppService {
    pub fn new(options: WhatsAppOptions) -> Self {
        let client = Client::builder()
            .timeout(DEFAULT_REQUEST_TIMEOUT)
            .build()
            .unwrap_or_else(|_| Client::new());
        Self { options, client }
    }

    pub fn phone_number_id(&self) -> &str {
        &self.options.phone_number_id
    }

    fn base(&self) -> String {
        format!(
            "{}/{}",
            self.options
                .base_url
                .as_deref()
                .unwrap_or(DEFAULT_GRAPH_BASE)
                .trim_end_matches('/'),
            self.options.api_version
        )
    }

    fn messages_url(&self) -> String {
        format!("{}/{}/messages", self.base(), self.options.phone_number_id)
    }

    fn bearer(&self) -> String {
        format!("Bearer {}", self.options.access_token)
    }

    /// Send a plain text message. `to` may contain formatting; only digits are sent.
    pub async fn send_text(&self, to: &str, body: &str) -> Result<SendMessageResponse> {
        let request = models::TextMessageRequest {
            messaging_product: "whatsapp",
            recipient_type: "individual",
            to: normalize_recipient(to),
            kind: "text",
            text: models::TextBody {
                preview_url: false,
                body,
            },
        };

        let response = self
            .client
            .post(self.messages_url())
            .header(header::AUTHORIZATION, self.bearer())
            .json(&request)
            .send()
            .await?;

        let response = check_status(response).await?;
        let sent = response.json::<SendMessageResponse>().await?;

        debug!(to = %request.to, message_id = ?sent.message_id(), "WhatsApp message sent");
        Ok(sent)
    }

    pub async fn mark_as_read(&self, message_id: &str) -> Result<()> {
        let request = models::ReadReceiptRequest {
            messaging_product: "whatsapp",
            status: "read",
            message_id,
        };

        let response = self
            .client
            .post(self.messages_url())
            .header(header::AUTHORIZATION, self.bearer())
            .json(&request)
            .send()
            .await?;

        check_status(response).await?;
        Ok(())
    }

    /// Resolve a media id from a webhook into a short-lived download URL.
    pub async fn get_media(&self, media_id: &str) -> Result<MediaInfo> {
        let response = self
            .client
            .get(format!("{}/{}", self.base(), media_id))
            .header(header::AUTHORIZATION, self.bearer())
            .send()
            .await?;

        let response = check_status(response).await?;
        Ok(response.json::<MediaInfo>().await?)
    }

    /// Download media bytes. The URL requires the same bearer token.
    ///
    /// Stops reading once the body passes `max_bytes`, so an oversized file
    /// is never buffered whole.
    pub async fn download_media(&self, url: &str, max_bytes: u64) -> Result<bytes::Bytes> {
        let response = self
            .client
            .get(url)
            .header(header::AUTHORIZATION, self.bearer())
            .timeout(MEDIA_DOWNLOAD_TIMEOUT)
            .send()
            .await?;

        let mut response = check_status(response).await?;
        if let Some(size) = response.content_length().filter(|size| *size > max_bytes) {
            return Err(WhatsAppError::TooLarge {
                size,
                limit: max_bytes,
            });
        }

        let mut body = bytes::BytesMut::new();
        while let Some(chunk) = response.chunk().await? {
            let size = (body.len() + chunk.len()) as u64;
            if size > max_bytes {
                return Err(WhatsAppError::TooLarge {
                    size,
                    limit: max_bytes,
                });
            }
            body.extend_from_slice(&chunk);
        }
        Ok(body.freeze())
    }

    pub async fn phone_number_info(&self) -> Result<PhoneNumberInfo> {
        let response = self
            .client
            .get(format!("{}/{}", self.base(), self.options.phone_number_id))
            .header(header::AUTHORIZATION, self.bearer())
            .timeout(Duration::from_secs(5))
            .send()
            .await?;

        let response = check_status(response).await?;
        Ok(response.json::<PhoneNumberInfo>().await?)
    }
}

async fn check_status(response: reqwest::Response) -> Result<reqwest::Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    warn!(status = %status, body = %body, "WhatsApp API error");
    Err(WhatsAppError::Api {
        status: status.as_u16(),
        body,
    })
}

/// Strip everything except digits (`+62 812-3456` -> `628123456`).
pub fn normalize_recipient(to: &str) -> String {
    to.chars().filter(|c| c.is_ascii_digit()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use httpmock::prelude::*;
    use serde_json::json;

    fn service(server: &MockServer) -> WhatsAppService {
        WhatsAppService::new(WhatsAppOptions {
            phone_number_id: "10001".to_string(),
            access_token: "token-abc".to_string(),
            api_version: "v18.0".to_string(),
            base_url: Some(server.base_url()),
        })
    }

    #[test]
    fn test_normalize_recipient() {
        assert_eq!(normalize_recipient("+62 812-3456-7890"), "6281234567890");
        assert_eq!(normalize_recipient("6281"), "6281");
    }

    #[tokio::test]
    async fn test_send_text_posts_normalized_recipient() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(POST)
                    .path("/v18.0/10001/messages")
                    .header("authorization", "Bearer token-abc")
                    .json_body_partial(
                        r#"{"messaging_product":"whatsapp","to":"6281234","type":"text","text":{"body":"halo"}}"#,
                    );
                then.status(200)
                    .json_body(json!({"messages": [{"id": "wamid.1"}]}));
            })
            .await;

        let sent = service(&server).send_text("+62 81-234", "halo").await.unwrap();

        mock.assert_async().await;
        assert_eq!(sent.message_id(), Some("wamid.1"));
    }

    #[tokio::test]
    async fn test_send_text_surfaces_api_errors() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(POST).path("/v18.0/10001/messages");
                then.status(401).body(r#"{"error":{"message":"bad token"}}"#);
            })
            .await;

        let err = service(&server).send_text("62811", "x").await.unwrap_err();
        match err {
            WhatsAppError::Api { status, body } => {
                assert_eq!(status, 401);
                assert!(body.contains("bad token"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_get_and_download_media() {
        let server = MockServer::start_async().await;
        let download_url = format!("{}/files/abc", server.base_url());
        server
            .mock_async(|when, then| {
                when.method(GET).path("/v18.0/media-9");
                then.status(200).json_body(json!({
                    "url": download_url,
                    "mime_type": "image/jpeg",
                    "file_size": 3,
                    "sha256": "deadbeef"
                }));
            })
            .await;
        server
            .mock_async(|when, then| {
                when.method(GET)
                    .path("/files/abc")
                    .header("authorization", "Bearer token-abc");
                then.status(200).body("abc");
            })
            .await;

        let svc = service(&server);
        let info = svc.get_media("media-9").await.unwrap();
        assert_eq!(info.mime_type, "image/jpeg");
        assert_eq!(info.file_size, Some(3));

        let bytes = svc.download_media(&info.url, 16).await.unwrap();
        assert_eq!(&bytes[..], b"abc");
    }

    #[tokio::test]
    async fn test_download_media_stops_at_limit() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/files/big");
                then.status(200).body(vec![0u8; 64]);
            })
            .await;

        let err = service(&server)
            .download_media(&format!("{}/files/big", server.base_url()), 32)
            .await
            .unwrap_err();
        match err {
            WhatsAppError::TooLarge { size, limit } => {
                assert!(size > 32);
                assert_eq!(limit, 32);
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }
}
