use thiserror::Error;

pub type Result<T> = std::result::Result<T, WhatsAppError>;

#[derive(Debug, Error)]
pub enum WhatsAppError {
    /// Connection failed or timed out
    #[error("Network error: {0}")]
    Network(String),

    /// Graph API answered with a non-2xx status
    #[error("API error ({status}): {body}")]
    Api { status: u16, body: String },

    /// Media is bigger than the caller accepts
    #[error("Media too large: {size} bytes exceeds limit of {limit} bytes")]
    TooLarge { size: u64, limit: u64 },

    /// Response body did not have the expected shape
    #[error("Parse error: {0}")]
    Parse(String),
}

impl From<reqwest::Error> for WhatsAppError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_decode() {
            WhatsAppError::Parse(e.to_string())
        } else {
            WhatsAppError::Network(e.to_string())
        }
    }
}
