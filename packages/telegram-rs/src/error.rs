use thiserror::Error;

pub type Result<T> = std::result::Result<T, TelegramError>;

#[derive(Debug, Error)]
pub enum TelegramError {
    /// Connection failed or timed out
    #[error("Network error: {0}")]
    Network(String),

    /// Bot API returned `ok: false` or a non-2xx status
    #[error("API error ({status}): {description}")]
    Api { status: u16, description: String },

    /// Response body did not have the expected shape
    #[error("Parse error: {0}")]
    Parse(String),
}

impl From<reqwest::Error> for TelegramError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_decode() {
            TelegramError::Parse(e.to_string())
        } else {
            TelegramError::Network(e.to_string())
        }
    }
}
