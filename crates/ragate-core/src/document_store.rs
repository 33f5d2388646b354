//! Document store trait and types

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::Result;

/// A passage returned by a document store.
///
/// Documents are never modified once the store hands them out; the grader and
/// generator only read `content`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    #[serde(default)]
    pub id: String,
    pub content: String,
    #[serde(default)]
    pub source: Option<String>,
    #[serde(default)]
    pub score: Option<f32>,
    #[serde(default = "empty_metadata")]
    pub metadata: serde_json::Value,
}

fn empty_metadata() -> serde_json::Value {
    serde_json::Value::Object(serde_json::Map::new())
}

impl Document {
    /// Create a document with only a text payload
    pub fn new(content: impl Into<String>) -> Self {
        Self {
            id: String::new(),
            content: content.into(),
            source: None,
            score: None,
            metadata: empty_metadata(),
        }
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = id.into();
        self
    }

    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.source = Some(source.into());
        self
    }

    pub fn with_metadata(mut self, metadata: serde_json::Value) -> Self {
        self.metadata = metadata;
        self
    }
}

/// Trait for document stores (e.g., Qdrant, an in-memory corpus)
///
/// A store answers one question: which passages are nearest to this query.
/// Ordering of the returned documents is the store's ranking and is preserved
/// by every later stage.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Search for documents similar to the query
    async fn search(&self, query: &str) -> Result<Vec<Document>>;

    /// Human-readable name used in logs
    fn name(&self) -> &str;
}
