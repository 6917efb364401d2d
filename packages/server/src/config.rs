use anyhow::{bail, Context, Result};
use dotenvy::dotenv;
use std::env;
use std::path::PathBuf;
use std::time::Duration;

/// Deployment environment
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppEnv {
    Development,
    Production,
    Test,
}

impl AppEnv {
    fn parse(value: &str) -> Result<Self> {
        match value.to_ascii_lowercase().as_str() {
            "development" | "dev" => Ok(Self::Development),
            "production" | "prod" => Ok(Self::Production),
            "test" => Ok(Self::Test),
            other => bail!("APP_ENV must be development, production or test (got {other})"),
        }
    }
}

/// Application configuration loaded from environment variables
#[derive(Debug, Clone)]
pub struct Config {
    pub app_env: AppEnv,
    pub port: u16,
    pub api_base_url: String,

    pub database_url: String,
    pub database_max_connections: u32,

    pub jwt_secret: String,
    pub jwt_expires_in: Duration,
    pub jwt_issuer: String,

    pub whatsapp_phone_number_id: String,
    pub whatsapp_access_token: String,
    pub whatsapp_verify_token: String,
    pub whatsapp_business_account_id: Option<String>,
    pub whatsapp_api_version: String,
    pub whatsapp_fallback_phone_number_id: Option<String>,

    pub telegram_bot_token: String,
    pub telegram_admin_chat_id: String,

    pub ollama_base_url: String,
    pub ollama_model: String,
    pub ollama_timeout: Duration,
    pub ollama_fallback_enabled: bool,

    pub auto_assign_critical_to: Option<String>,
    pub auto_verify_trust_level: i32,
    pub rate_limit_per_minute: u32,
    pub data_retention_days: i64,
    pub media_storage_path: PathBuf,
    pub admin_password: Option<String>,

    pub debug_mode: bool,
    pub log_level: String,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        // Load .env file if present (development)
        let _ = dotenv();

        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build configuration from an arbitrary key lookup.
    ///
    /// Empty values are treated as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let required = |key: &str| get(key).with_context(|| format!("{key} must be set"));
        let or = |key: &str, default: &str| get(key).unwrap_or_else(|| default.to_string());

        let jwt_secret = required("JWT_SECRET")?;
        if jwt_secret.len() < 32 {
            bail!("JWT_SECRET must be at least 32 characters");
        }

        let log_level = or("LOG_LEVEL", "info").to_ascii_lowercase();
        if !["error", "warn", "info", "debug", "trace"].contains(&log_level.as_str()) {
            bail!("LOG_LEVEL must be one of error, warn, info, debug (got {log_level})");
        }

        Ok(Self {
            app_env: AppEnv::parse(&or("APP_ENV", "production"))?,
            port: or("PORT", "3000")
                .parse()
                .context("PORT must be a valid number")?,
            api_base_url: or("API_BASE_URL", "http://localhost:3000"),

            database_url: required("DATABASE_URL")?,
            database_max_connections: or("DATABASE_MAX_CONNECTIONS", "10")
                .parse()
                .context("DATABASE_MAX_CONNECTIONS must be a valid number")?,

            jwt_secret,
            jwt_expires_in: parse_duration(&or("JWT_EXPIRES_IN", "7d"))
                .context("JWT_EXPIRES_IN must look like 30m, 12h or 7d")?,
            jwt_issuer: or("JWT_ISSUER", "disaster-intake"),

            whatsapp_phone_number_id: required("WHATSAPP_PHONE_NUMBER_ID")?,
            whatsapp_access_token: required("WHATSAPP_ACCESS_TOKEN")?,
            whatsapp_verify_token: required("WHATSAPP_VERIFY_TOKEN")?,
            whatsapp_business_account_id: get("WHATSAPP_BUSINESS_ACCOUNT_ID"),
            whatsapp_api_version: or("WHATSAPP_API_VERSION", "v18.0"),
            whatsapp_fallback_phone_number_id: get("WHATSAPP_FALLBACK_PHONE_NUMBER_ID"),

            telegram_bot_token: required("TELEGRAM_BOT_TOKEN")?,
            telegram_admin_chat_id: required("TELEGRAM_ADMIN_CHAT_ID")?,

            // Empty is meaningful here (disables the LLM), so bypass `or`.
            ollama_base_url: lookup("OLLAMA_BASE_URL")
                .unwrap_or_else(|| "http://ollama:11434".to_string()),
            ollama_model: or("OLLAMA_MODEL", "qwen2.5:7b"),
            ollama_timeout: Duration::from_millis(
                or("OLLAMA_TIMEOUT", "30000")
                    .parse()
                    .context("OLLAMA_TIMEOUT must be milliseconds")?,
            ),
            ollama_fallback_enabled: parse_bool(&or("OLLAMA_FALLBACK_ENABLED", "true"))
                .context("OLLAMA_FALLBACK_ENABLED must be true or false")?,

            auto_assign_critical_to: get("AUTO_ASSIGN_CRITICAL_TO"),
            auto_verify_trust_level: or("AUTO_VERIFY_TRUST_LEVEL", "3")
                .parse()
                .context("AUTO_VERIFY_TRUST_LEVEL must be a valid number")?,
            rate_limit_per_minute: or("RATE_LIMIT_PER_MINUTE", "100")
                .parse()
                .context("RATE_LIMIT_PER_MINUTE must be a valid number")?,
            data_retention_days: or("DATA_RETENTION_DAYS", "180")
                .parse()
                .context("DATA_RETENTION_DAYS must be a valid number")?,
            media_storage_path: PathBuf::from(or("MEDIA_STORAGE_PATH", "/app/media")),
            admin_password: get("ADMIN_PASSWORD"),

            debug_mode: parse_bool(&or("DEBUG_MODE", "false"))
                .context("DEBUG_MODE must be true or false")?,
            log_level,
        })
    }

    pub fn is_development(&self) -> bool {
        self.app_env == AppEnv::Development
    }

    /// The LLM is switched off by leaving the URL empty or marking it `disabled`.
    pub fn ollama_enabled(&self) -> bool {
        let url = self.ollama_base_url.trim();
        !url.is_empty() && !url.contains("disabled")
    }

    /// Default tracing filter when RUST_LOG is not set.
    pub fn log_filter(&self) -> String {
        let sqlx_level = if self.debug_mode { "debug" } else { "warn" };
        format!(
            "{level},server_core={level},sqlx={sqlx_level}",
            level = self.log_level
        )
    }
}

/// Parse `<n>[s|m|h|d]`. A bare number is seconds.
pub fn parse_duration(value: &str) -> Result<Duration> {
    let value = value.trim();
    let (digits, unit) = match value.char_indices().find(|(_, c)| !c.is_ascii_digit()) {
        Some((idx, _)) => value.split_at(idx),
        None => (value, "s"),
    };

    let amount: u64 = digits
        .parse()
        .with_context(|| format!("invalid duration: {value}"))?;
    let multiplier: u64 = match unit {
        "s" => 1,
        "m" => 60,
        "h" => 3600,
        "d" => 86_400,
        _ => bail!("invalid duration unit in {value}"),
    };
    let Some(seconds) = amount.checked_mul(multiplier) else {
        bail!("duration out of range: {value}");
    };
    Ok(Duration::from_secs(seconds))
}

fn parse_bool(value: &str) -> Result<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" => Ok(true),
        "false" | "0" | "no" => Ok(false),
        other => bail!("invalid boolean: {other}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn base_env() -> HashMap<&'static str, &'static str> {
        HashMap::from([
            ("DATABASE_URL", "postgres://localhost/intake"),
            ("JWT_SECRET", "0123456789abcdef0123456789abcdef"),
            ("WHATSAPP_PHONE_NUMBER_ID", "1001"),
            ("WHATSAPP_ACCESS_TOKEN", "wa-token"),
            ("WHATSAPP_VERIFY_TOKEN", "verify-me"),
            ("TELEGRAM_BOT_TOKEN", "123:abc"),
            ("TELEGRAM_ADMIN_CHAT_ID", "-100200"),
        ])
    }

    fn load(env: &HashMap<&'static str, &'static str>) -> Result<Config> {
        Config::from_lookup(|key| env.get(key).map(|v| v.to_string()))
    }

    #[test]
    fn test_defaults() {
        let config = load(&base_env()).unwrap();

        assert_eq!(config.app_env, AppEnv::Production);
        assert_eq!(config.port, 3000);
        assert_eq!(config.jwt_expires_in, Duration::from_secs(7 * 86_400));
        assert_eq!(config.jwt_issuer, "disaster-intake");
        assert_eq!(config.whatsapp_api_version, "v18.0");
        assert_eq!(config.ollama_model, "qwen2.5:7b");
        assert_eq!(config.ollama_timeout, Duration::from_millis(30_000));
        assert!(config.ollama_fallback_enabled);
        assert!(config.ollama_enabled());
        assert_eq!(config.auto_verify_trust_level, 3);
        assert_eq!(config.rate_limit_per_minute, 100);
        assert_eq!(config.data_retention_days, 180);
        assert_eq!(config.media_storage_path, PathBuf::from("/app/media"));
        assert_eq!(config.log_filter(), "info,server_core=info,sqlx=warn");
    }

    #[test]
    fn test_missing_required_variable_is_named() {
        let mut env = base_env();
        env.remove("TELEGRAM_BOT_TOKEN");

        let err = load(&env).unwrap_err();
        assert!(err.to_string().contains("TELEGRAM_BOT_TOKEN"));
    }

    #[test]
    fn test_short_jwt_secret_rejected() {
        let mut env = base_env();
        env.insert("JWT_SECRET", "too-short");
        assert!(load(&env).is_err());
    }

    #[test]
    fn test_ollama_disabled_markers() {
        let mut env = base_env();
        env.insert("OLLAMA_BASE_URL", "");
        assert!(!load(&env).unwrap().ollama_enabled());

        env.insert("OLLAMA_BASE_URL", "http://disabled");
        assert!(!load(&env).unwrap().ollama_enabled());
    }

    #[test]
    fn test_debug_mode_raises_sqlx_level() {
        let mut env = base_env();
        env.insert("DEBUG_MODE", "true");
        env.insert("LOG_LEVEL", "debug");
        assert_eq!(
            load(&env).unwrap().log_filter(),
            "debug,server_core=debug,sqlx=debug"
        );
    }

    #[test]
    fn test_parse_duration() {
        assert_eq!(parse_duration("45").unwrap(), Duration::from_secs(45));
        assert_eq!(parse_duration("30m").unwrap(), Duration::from_secs(1800));
        assert_eq!(parse_duration("12h").unwrap(), Duration::from_secs(43_200));
        assert!(parse_duration("7w").is_err());
        assert!(parse_duration("d").is_err());
    }

    #[test]
    fn test_parse_duration_rejects_overflow() {
        let err = parse_duration("999999999999999999d").unwrap_err();
        assert!(err.to_string().contains("out of range"));
        assert!(parse_duration("18446744073709551615s").is_ok());
        assert!(parse_duration("18446744073709551615m").is_err());
    }
}
