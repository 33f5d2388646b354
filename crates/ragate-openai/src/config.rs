//! Language service configuration

use serde::{Deserialize, Serialize};
use std::env;
use url::Url;
use ragate_core::{Error, Result};

/// Configuration for the OpenAI-compatible client
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OpenAiConfig {
    pub api_key: String,
    pub base_url: String,
    pub model: String,
    pub embedding_model: String,
    pub temperature: f32,
}

impl OpenAiConfig {
    pub const DEFAULT_BASE_URL: &'static str = "https://api.openai.com/v1";
    pub const DEFAULT_MODEL: &'static str = "gpt-4o";
    pub const DEFAULT_EMBEDDING_MODEL: &'static str = "text-embedding-3-small";

    /// Create configuration from environment variables
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Create configuration from an arbitrary variable source.
    ///
    /// `OPENAI_API_KEY` is required; everything else has a default.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let api_key = lookup("OPENAI_API_KEY")
            .filter(|key| !key.trim().is_empty())
            .ok_or_else(|| Error::Configuration(
                "OPENAI_API_KEY environment variable not found".to_string()
            ))?;

        let base_url = lookup("OPENAI_BASE_URL")
            .unwrap_or_else(|| Self::DEFAULT_BASE_URL.to_string());
        Url::parse(&base_url).map_err(|e| Error::Configuration(
            format!("OPENAI_BASE_URL '{}' is not a valid URL: {}", base_url, e)
        ))?;

        let model = lookup("RAGATE_MODEL")
            .unwrap_or_else(|| Self::DEFAULT_MODEL.to_string());

        let embedding_model = lookup("RAGATE_EMBEDDING_MODEL")
            .unwrap_or_else(|| Self::DEFAULT_EMBEDDING_MODEL.to_string());

        Ok(Self {
            api_key,
            base_url: base_url.trim_end_matches('/').to_string(),
            model,
            embedding_model,
            temperature: 0.0,
        })
    }

    /// Create configuration with explicit values
    pub fn new(api_key: String) -> Self {
        Self {
            api_key,
            base_url: Self::DEFAULT_BASE_URL.to_string(),
            model: Self::DEFAULT_MODEL.to_string(),
            embedding_model: Self::DEFAULT_EMBEDDING_MODEL.to_string(),
            temperature: 0.0,
        }
    }
}
