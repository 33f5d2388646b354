//! Document store configuration

use serde::{Deserialize, Serialize};
use std::env;
use url::Url;
use ragate_core::{Error, Result};

use crate::vector_store::SearchConfig;

/// Configuration for the Qdrant-backed document store
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QdrantConfig {
    pub url: String,
    pub collection: String,
    pub top_k: usize,
}

impl QdrantConfig {
    pub const DEFAULT_URL: &'static str = "http://localhost:6334";
    pub const DEFAULT_COLLECTION: &'static str = "documents";

    /// Create configuration from environment variables
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Create configuration from an arbitrary variable source
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let url = lookup("QDRANT_URL")
            .unwrap_or_else(|| Self::DEFAULT_URL.to_string());
        Url::parse(&url).map_err(|e| Error::Configuration(
            format!("QDRANT_URL '{}' is not a valid URL: {}", url, e)
        ))?;

        let collection = lookup("QDRANT_COLLECTION")
            .unwrap_or_else(|| Self::DEFAULT_COLLECTION.to_string());

        let top_k = match lookup("RAGATE_TOP_K") {
            Some(raw) => raw.trim().parse::<usize>().map_err(|e| Error::Configuration(
                format!("RAGATE_TOP_K '{}' is not a positive integer: {}", raw, e)
            ))?,
            None => SearchConfig::default().top_k,
        };

        if top_k == 0 {
            return Err(Error::Configuration("RAGATE_TOP_K must be at least 1".to_string()));
        }

        Ok(Self { url, collection, top_k })
    }

    pub fn search_config(&self) -> SearchConfig {
        SearchConfig {
            top_k: self.top_k,
            ..Default::default()
        }
    }
}

impl Default for QdrantConfig {
    fn default() -> Self {
        Self {
            url: Self::DEFAULT_URL.to_string(),
            collection: Self::DEFAULT_COLLECTION.to_string(),
            top_k: SearchConfig::default().top_k,
        }
    }
}
