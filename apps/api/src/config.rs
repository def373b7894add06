use std::path::PathBuf;

use anyhow::{Context, Result};

use crate::llm_client::{DEFAULT_BASE_URL, DEFAULT_MODEL};

const DEFAULT_CORS_ORIGINS: &str = "http://localhost:5173,http://127.0.0.1:5173";

/// Application configuration loaded from environment variables.
/// Only malformed numeric values fail startup; everything else has a default.
#[derive(Debug, Clone)]
pub struct Config {
    /// Absent means no oracle access: scoring falls back, enrichment refuses.
    pub openai_api_key: Option<String>,
    pub openai_model: String,
    pub openai_summary_model: String,
    pub openai_base_url: String,
    pub profile_path: PathBuf,
    pub port: u16,
    pub cors_origins: Vec<String>,
    pub jd_cache_ttl_secs: u64,
    pub rust_log: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        let openai_model = optional_env("OPENAI_MODEL").unwrap_or_else(|| DEFAULT_MODEL.to_string());

        Ok(Config {
            openai_api_key: optional_env("OPENAI_API_KEY"),
            openai_summary_model: optional_env("OPENAI_SUMMARY_MODEL")
                .unwrap_or_else(|| openai_model.clone()),
            openai_model,
            openai_base_url: optional_env("OPENAI_BASE_URL")
                .unwrap_or_else(|| DEFAULT_BASE_URL.to_string()),
            profile_path: optional_env("PROFILE_PATH")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from("data/profile.json")),
            port: optional_env("PORT")
                .unwrap_or_else(|| "8000".to_string())
                .parse::<u16>()
                .context("PORT must be a valid port number")?,
            cors_origins: parse_origins(
                &optional_env("CORS_ORIGINS").unwrap_or_else(|| DEFAULT_CORS_ORIGINS.to_string()),
            ),
            jd_cache_ttl_secs: optional_env("JD_CACHE_TTL_SECS")
                .unwrap_or_else(|| "3600".to_string())
                .parse::<u64>()
                .context("JD_CACHE_TTL_SECS must be a non-negative integer")?,
            rust_log: std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()),
        })
    }

    pub fn has_oracle_credential(&self) -> bool {
        self.openai_api_key.is_some()
    }
}

#[cfg(test)]
impl Config {
    /// Defaults without touching the process environment.
    pub fn for_tests(profile_path: impl Into<PathBuf>) -> Self {
        Config {
            openai_api_key: None,
            openai_model: DEFAULT_MODEL.to_string(),
            openai_summary_model: DEFAULT_MODEL.to_string(),
            openai_base_url: DEFAULT_BASE_URL.to_string(),
            profile_path: profile_path.into(),
            port: 8000,
            cors_origins: parse_origins(DEFAULT_CORS_ORIGINS),
            jd_cache_ttl_secs: 3600,
            rust_log: "info".to_string(),
        }
    }
}

/// Reads an env var, treating blank values as unset.
fn optional_env(key: &str) -> Option<String> {
    std::env::var(key)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn parse_origins(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
        .collect()
}
