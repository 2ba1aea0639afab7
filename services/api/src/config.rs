//! services/api/src/config.rs
//!
//! Defines the application's configuration structure and loading logic.
//!
//! All configuration is loaded from environment variables at startup. The `.env`
//! file is used for local development.

use std::net::SocketAddr;
use std::str::FromStr;
use tracing::Level;

/// A custom error type for configuration loading failures.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing the environment variable {0}")]
    MissingVar(String),
    #[error("Invalid value for the environment variable {0}: {1}")]
    InvalidValue(String, String),
}

/// Holds all configuration loaded from the environment at startup.
#[derive(Clone, Debug)]
pub struct Config {
    pub bind_address: SocketAddr,
    pub database_url: String,
    pub database_max_connections: u32,
    pub log_level: Level,
    pub openai_api_key: Option<String>,
    pub openai_base_url: Option<String>,
    pub summary_model: String,
    pub flashcard_model: String,
    pub grading_model: String,
    pub session_ttl_days: i64,
    pub reset_token_ttl_minutes: i64,
    pub password_reset_url: String,
    pub cors_origin: String,
    pub secure_cookies: bool,
}

impl Config {
    /// Loads configuration from environment variables.
    ///
    /// It will look for a `.env` file in the current directory for development,
    /// but this is skipped in test environments to ensure tests are hermetic.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Only load from .env in non-test mode to avoid contamination.
        if !cfg!(test) {
            dotenvy::dotenv().ok();
        }

        // --- Server and Database Settings ---
        let bind_address = parse_var("BIND_ADDRESS", "0.0.0.0:3000")?;
        let database_url = std::env::var("DATABASE_URL")
            .map_err(|_| ConfigError::MissingVar("DATABASE_URL".to_string()))?;
        let database_max_connections = parse_var("DATABASE_MAX_CONNECTIONS", "5")?;

        let log_level_str = std::env::var("RUST_LOG").unwrap_or_else(|_| "INFO".to_string());
        let log_level = log_level_str.parse::<Level>().map_err(|_| {
            ConfigError::InvalidValue(
                "RUST_LOG".to_string(),
                format!("'{}' is not a valid log level", log_level_str),
            )
        })?;

        // --- AI Provider Settings ---
        let openai_api_key = std::env::var("OPENAI_API_KEY").ok();
        let openai_base_url = std::env::var("OPENAI_BASE_URL").ok();
        let summary_model = var_or("SUMMARY_MODEL", "gpt-4o-mini");
        let flashcard_model = var_or("FLASHCARD_MODEL", "gpt-4o-mini");
        let grading_model = var_or("GRADING_MODEL", "gpt-4o-mini");

        // --- Auth Settings ---
        let session_ttl_days = parse_positive("SESSION_TTL_DAYS", "30")?;
        let reset_token_ttl_minutes = parse_positive("RESET_TOKEN_TTL_MINUTES", "30")?;
        let password_reset_url =
            var_or("PASSWORD_RESET_URL", "http://localhost:3000/reset-password");
        let cors_origin = var_or("CORS_ORIGIN", "http://localhost:3000");
        let secure_cookies = parse_var("SECURE_COOKIES", "true")?;

        Ok(Self {
            bind_address,
            database_url,
            database_max_connections,
            log_level,
            openai_api_key,
            openai_base_url,
            summary_model,
            flashcard_model,
            grading_model,
            session_ttl_days,
            reset_token_ttl_minutes,
            password_reset_url,
            cors_origin,
            secure_cookies,
        })
    }
}

fn var_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

fn parse_var<T>(key: &str, default: &str) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    var_or(key, default)
        .parse::<T>()
        .map_err(|e| ConfigError::InvalidValue(key.to_string(), e.to_string()))
}

fn parse_positive(key: &str, default: &str) -> Result<i64, ConfigError> {
    let value: i64 = parse_var(key, default)?;
    if value <= 0 {
        return Err(ConfigError::InvalidValue(
            key.to_string(),
            "must be greater than zero".to_string(),
        ));
    }
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_var_falls_back_to_default() {
        let port: u16 = parse_var("STUDY_NOTES_TEST_UNSET_PORT", "8080").unwrap();
        assert_eq!(port, 8080);
    }

    #[test]
    fn parse_positive_rejects_zero() {
        let err = parse_positive("STUDY_NOTES_TEST_UNSET_TTL", "0").unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue(ref key, _) if key == "STUDY_NOTES_TEST_UNSET_TTL"));
    }

    #[test]
    fn invalid_defaults_surface_as_invalid_value() {
        let err = parse_var::<SocketAddr>("STUDY_NOTES_TEST_UNSET_ADDR", "not-an-address").unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue(_, _)));
    }
}
