// Telegram Bot API client
//
// Only what operator alerting needs: sendMessage and getMe.

use std::time::Duration;

pub mod error;
pub mod models;

use reqwest::Client;
use serde::de::DeserializeOwned;
use tracing::{debug, warn};

pub use error::{Result, TelegramError};
pub use models::{BotUser, Message, ParseMode};

const DEFAULT_API_BASE: &str = "https://api.telegram.org";

#[derive(Debug, Clone)]
pub struct TelegramOptions {
    pub bot_token: String,
    /// Override for tests; defaults to api.telegram.org.
    pub base_url: Option<String>,
}

#[derive(Debug, Clone)]
pub struct TelegramService {
    options: TelegramOptions,
    client: Client,
}

impl TelegramService {
    pub fn new(options: TelegramOptions) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(10))
            .build()
            .unwrap_or_else(|_| Client::new());
        Self { options, client }
    }

    fn method_url(&self, method: &str) -> String {
        format!(
            "{}/bot{}/{}",
            self.options
                .base_url
                .as_deref()
                .unwrap_or(DEFAULT_API_BASE)
                .trim_end_matches('/'),
            self.options.bot_token,
            method
        )
    }

    pub async fn send_message(
        &self,
        chat_id: &str,
        text: &str,
        parse_mode: Option<ParseMode>,
    ) -> Result<Message> {
        let request = models::SendMessageRequest {
            chat_id,
            text,
            parse_mode,
            disable_web_page_preview: true,
        };

        let response = self
            .client
            .post(self.method_url("sendMessage"))
            .json(&request)
            .send()
            .await?;

        let message: Message = unwrap_response(response).await?;
        debug!(chat_id, message_id = message.message_id, "Telegram message sent");
        Ok(message)
    }

    pub async fn get_me(&self) -> Result<BotUser> {
        let response = self
            .client
            .get(self.method_url("getMe"))
            .timeout(Duration::from_secs(5))
            .send()
            .await?;

        unwrap_response(response).await
    }
}

async fn unwrap_response<T: DeserializeOwned>(response: reqwest::Response) -> Result<T> {
    let status = response.status();
    let body = response.text().await?;

    let parsed: models::ApiResponse<T> = match serde_json::from_str(&body) {
        Ok(parsed) => parsed,
        Err(e) if status.is_success() => return Err(TelegramError::Parse(e.to_string())),
        Err(_) => {
            warn!(status = %status, body = %body, "Telegram API error");
            return Err(TelegramError::Api {
                status: status.as_u16(),
                description: body,
            });
        }
    };

    match (parsed.ok, parsed.result) {
        (true, Some(result)) => Ok(result),
        (true, None) => Err(TelegramError::Parse("missing result".to_string())),
        (false, _) => {
            let description = parsed.description.unwrap_or_default();
            warn!(status = %status, description = %description, "Telegram API error");
            Err(TelegramError::Api {
                status: status.as_u16(),
                description,
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use httpmock::prelude::*;
    use serde_json::json;

    fn service(server: &MockServer) -> TelegramService {
        TelegramService::new(TelegramOptions {
            bot_token: "123:abc".to_string(),
            base_url: Some(server.base_url()),
        })
    }

    #[tokio::test]
    async fn test_send_message_uses_html_and_disables_preview() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(POST)
                    .path("/bot123:abc/sendMessage")
                    .json_body(json!({
                        "chat_id": "-100",
                        "text": "<b>hi</b>",
                        "parse_mode": "HTML",
                        "disable_web_page_preview": true
                    }));
                then.status(200)
                    .json_body(json!({"ok": true, "result": {"message_id": 7}}));
            })
            .await;

        let message = service(&server)
            .send_message("-100", "<b>hi</b>", Some(ParseMode::Html))
            .await
            .unwrap();

        mock.assert_async().await;
        assert_eq!(message.message_id, 7);
    }

    #[tokio::test]
    async fn test_api_error_carries_description() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(POST).path("/bot123:abc/sendMessage");
                then.status(400).json_body(json!({
                    "ok": false,
                    "error_code": 400,
                    "description": "Bad Request: chat not found"
                }));
            })
            .await;

        let err = service(&server)
            .send_message("nope", "x", None)
            .await
            .unwrap_err();

        match err {
            TelegramError::Api { status, description } => {
                assert_eq!(status, 400);
                assert!(description.contains("chat not found"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_get_me() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/bot123:abc/getMe");
                then.status(200).json_body(json!({
                    "ok": true,
                    "result": {"id": 1, "is_bot": true, "first_name": "Posko", "username": "posko_bot"}
                }));
            })
            .await;

        let me = service(&server).get_me().await.unwrap();
        assert!(me.is_bot);
        assert_eq!(me.username.as_deref(), Some("posko_bot"));
    }
}
