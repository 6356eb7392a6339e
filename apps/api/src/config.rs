use std::path::PathBuf;
use std::str::FromStr;

use anyhow::{bail, Context, Result};

use crate::llm_client::is_known_model;

/// Application configuration loaded from environment variables.
/// Fails at startup if required variables are missing or malformed.
#[derive(Debug, Clone)]
pub struct Config {
    pub openai_api_key: String,
    pub openai_base_url: String,
    pub default_model: String,
    pub llm_timeout_secs: u64,
    pub criteria_path: PathBuf,
    pub max_batch_size: usize,
    pub port: u16,
    pub rust_log: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        let default_model =
            std::env::var("CLASSIFIER_MODEL").unwrap_or_else(|_| "gpt-4.1-mini".to_string());
        if !is_known_model(&default_model) {
            bail!("CLASSIFIER_MODEL '{default_model}' is not a supported model");
        }

        Ok(Config {
            openai_api_key: require_env("OPENAI_API_KEY")?,
            openai_base_url: std::env::var("OPENAI_BASE_URL")
                .unwrap_or_else(|_| "https://api.openai.com".to_string()),
            default_model,
            llm_timeout_secs: parse_env("LLM_TIMEOUT_SECS", 60)?,
            criteria_path: std::env::var("CRITERIA_PATH")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from("data/criteria.json")),
            max_batch_size: parse_env("MAX_BATCH_SIZE", 500)?,
            port: parse_env("PORT", 8080)?,
            rust_log: std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()),
        })
    }
}

fn require_env(key: &str) -> Result<String> {
    std::env::var(key).with_context(|| format!("Required environment variable '{key}' is not set"))
}

fn parse_env<T>(key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match std::env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse::<T>()
            .with_context(|| format!("{key} must be a valid number, got '{raw}'")),
        Err(_) => Ok(default),
    }
}
