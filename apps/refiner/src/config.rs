use anyhow::{Context, Result};

use crate::errors::AppError;
use crate::session::store::DEFAULT_SESSION_TTL_SECS;

const DEFAULT_MAX_UPLOAD_BYTES: usize = 10 * 1024 * 1024;

/// Application configuration loaded from environment variables.
///
/// Built once in `main` and handed to `AppState`; nothing reads the
/// environment after startup.
#[derive(Debug, Clone)]
pub struct Config {
    /// `ANTHROPIC_API_KEY`. Optional at load time so the UI can report its absence.
    pub anthropic_api_key: Option<String>,
    pub bind_addr: String,
    pub port: u16,
    pub rust_log: String,
    pub max_upload_bytes: usize,
    /// Sessions older than this are evicted (`SESSION_TTL_SECS`).
    pub session_ttl_secs: u64,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        Ok(Config {
            anthropic_api_key: optional_env("ANTHROPIC_API_KEY"),
            bind_addr: optional_env("BIND_ADDR").unwrap_or_else(|| "127.0.0.1".to_string()),
            port: std::env::var("PORT")
                .unwrap_or_else(|_| "8080".to_string())
                .parse::<u16>()
                .context("PORT must be a valid port number")?,
            rust_log: std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()),
            max_upload_bytes: match optional_env("MAX_UPLOAD_BYTES") {
                Some(raw) => raw
                    .parse::<usize>()
                    .context("MAX_UPLOAD_BYTES must be a byte count")?,
                None => DEFAULT_MAX_UPLOAD_BYTES,
            },
            session_ttl_secs: match optional_env("SESSION_TTL_SECS") {
                Some(raw) => raw
                    .parse::<u64>()
                    .context("SESSION_TTL_SECS must be a number of seconds")?,
                None => DEFAULT_SESSION_TTL_SECS,
            },
        })
    }

    /// Returns the provider key or a `Configuration` error naming the variable.
    pub fn require_api_key(&self) -> Result<&str, AppError> {
        self.anthropic_api_key.as_deref().ok_or_else(|| {
            AppError::Configuration(
                "Required environment variable 'ANTHROPIC_API_KEY' is not set".to_string(),
            )
        })
    }
}

impl Default for Config {
    fn default() -> Self {
        Config {
            anthropic_api_key: None,
            bind_addr: "127.0.0.1".to_string(),
            port: 8080,
            rust_log: "info".to_string(),
            max_upload_bytes: DEFAULT_MAX_UPLOAD_BYTES,
            session_ttl_secs: DEFAULT_SESSION_TTL_SECS,
        }
    }
}

/// Blank values count as unset.
fn optional_env(key: &str) -> Option<String> {
    std::env::var(key)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_key_is_configuration_error() {
        let config = Config::default();
        let err = config.require_api_key().unwrap_err();
        assert!(matches!(err, AppError::Configuration(_)));
        assert!(err.to_string().contains("ANTHROPIC_API_KEY"));
    }

    #[test]
    fn test_present_key_is_returned() {
        let config = Config {
            anthropic_api_key: Some("sk-test".to_string()),
            ..Config::default()
        };
        assert_eq!(config.require_api_key().unwrap(), "sk-test");
    }
}
