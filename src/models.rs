//! Data models and structures
//!
//! Defines the inbound chat request/response bodies and the process-wide
//! configuration loaded once at startup.

use crate::ai::retry::RetryPolicy;
use crate::{Error, Result};
use serde::{Deserialize, Deserializer, Serialize};
use std::str::FromStr;
use std::time::Duration;

/// Body accepted by `POST /api/chat`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatRequest {
    #[serde(default, deserialize_with = "null_as_empty")]
    pub message: String,
    #[serde(default)]
    pub image_data: Option<String>,
}

/// An explicit `null` message is treated the same as a missing one.
fn null_as_empty<'de, D>(deserializer: D) -> std::result::Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatResponse {
    pub response: String,
}

impl ChatResponse {
    pub fn new(response: impl Into<String>) -> Self {
        Self {
            response: response.into(),
        }
    }
}

pub const DEFAULT_MODEL: &str = "gemini-2.5-flash-preview-05-20";
pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com";

#[derive(Clone)]
pub struct ApiKey(String);

impl ApiKey {
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Debug for ApiKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("[REDACTED]")
    }
}

// Configuration
#[derive(Debug, Clone)]
pub struct Config {
    pub gemini_api_key: ApiKey,
    pub gemini_model: String,
    pub gemini_base_url: String,
    pub request_timeout: Duration,
    pub retry: RetryPolicy,
    pub host: String,
    pub port: u16,
    pub max_body_bytes: usize,
    pub debug: bool,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_vars(|key| std::env::var(key).ok())
    }

    /// Build a config from an arbitrary variable source.
    pub fn from_vars<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        let gemini_api_key = var("GEMINI_API_KEY")
            .map(ApiKey)
            .ok_or_else(|| Error::Config("GEMINI_API_KEY not set".to_string()))?;

        let max_attempts: usize = parse_or(var("MAX_ATTEMPTS"), "MAX_ATTEMPTS", 5)?;
        if max_attempts == 0 {
            return Err(Error::Config("MAX_ATTEMPTS must be at least 1".to_string()));
        }

        Ok(Self {
            gemini_api_key,
            gemini_model: var("GEMINI_MODEL").unwrap_or_else(|| DEFAULT_MODEL.to_string()),
            gemini_base_url: var("GEMINI_BASE_URL")
                .unwrap_or_else(|| DEFAULT_BASE_URL.to_string()),
            request_timeout: Duration::from_secs(parse_or(
                var("REQUEST_TIMEOUT_SECS"),
                "REQUEST_TIMEOUT_SECS",
                60,
            )?),
            retry: RetryPolicy {
                max_attempts,
                initial_backoff: Duration::from_millis(parse_or(
                    var("INITIAL_BACKOFF_MS"),
                    "INITIAL_BACKOFF_MS",
                    1000,
                )?),
            },
            host: var("HOST").unwrap_or_else(|| "127.0.0.1".to_string()),
            port: parse_or(var("PORT"), "PORT", 5000)?,
            max_body_bytes: parse_or(var("MAX_BODY_BYTES"), "MAX_BODY_BYTES", 20 * 1024 * 1024)?,
            debug: parse_or(var("DEBUG"), "DEBUG", true)?,
        })
    }
}

fn parse_or<T: FromStr>(value: Option<String>, key: &str, default: T) -> Result<T> {
    match value {
        Some(raw) => raw
            .parse()
            .map_err(|_| Error::Config(format!("Invalid value for {}: '{}'", key, raw))),
        None => Ok(default),
    }
}
