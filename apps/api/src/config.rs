use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};

use crate::gateway::retry::RetryPolicy;

const DEFAULT_MODEL: &str = "gemini-2.5-flash";
const DEFAULT_STORE_PATH: &str = "data/profiles.json";

/// Application configuration loaded from environment variables.
/// Fails at startup if required variables are missing.
#[derive(Debug, Clone)]
pub struct Config {
    pub gemini_api_key: String,
    pub gemini_model: String,
    pub profile_store_path: PathBuf,
    pub port: u16,
    pub llm_max_attempts: u32,
    pub llm_backoff_ms: u64,
    pub rust_log: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        Ok(Config {
            gemini_api_key: require_env("GEMINI_API_KEY")?,
            gemini_model: std::env::var("GEMINI_MODEL")
                .unwrap_or_else(|_| DEFAULT_MODEL.to_string()),
            profile_store_path: std::env::var("PROFILE_STORE_PATH")
                .unwrap_or_else(|_| DEFAULT_STORE_PATH.to_string())
                .into(),
            port: parse_env("PORT", 5000)?,
            llm_max_attempts: parse_env("LLM_MAX_ATTEMPTS", 3)?,
            llm_backoff_ms: parse_env("LLM_BACKOFF_MS", 1000)?,
            rust_log: std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()),
        })
    }

    /// Retry policy for the AI gateway. Always allows at least one attempt.
    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::new(
            self.llm_max_attempts.max(1),
            Duration::from_millis(self.llm_backoff_ms),
        )
    }
}

fn require_env(key: &str) -> Result<String> {
    std::env::var(key).with_context(|| format!("Required environment variable '{key}' is not set"))
}

fn parse_env<T>(key: &str, default: T) -> Result<T>
where
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match std::env::var(key) {
        Ok(raw) => raw
            .parse::<T>()
            .with_context(|| format!("{key} must be a valid number, got '{raw}'")),
        Err(_) => Ok(default),
    }
}
