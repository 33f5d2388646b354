//! Document store implementations

use async_trait::async_trait;
use qdrant_client::Qdrant;
use qdrant_client::qdrant::point_id::PointIdOptions;
use qdrant_client::qdrant::value::Kind;
use qdrant_client::qdrant::{ScoredPoint, SearchPointsBuilder, Value as QdrantValue};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::HashSet;
use std::path::Path;
use std::sync::Arc;

use ragate_core::{Document, DocumentStore, Embedder, Error, Result};

use crate::config::QdrantConfig;

/// Configuration for similarity search
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchConfig {
    pub top_k: usize,
    pub score_threshold: Option<f32>,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            top_k: 4,
            score_threshold: None,
        }
    }
}

/// In-memory document store over a fixed corpus.
///
/// Scores are the share of query words found in the document. Without a
/// score threshold, documents sharing no word with the query are skipped.
/// Ties keep corpus order.
pub struct LocalDocumentStore {
    documents: Vec<Document>,
    config: SearchConfig,
}

impl LocalDocumentStore {
    /// Create a store over the given documents
    pub fn new(documents: Vec<Document>, config: SearchConfig) -> Self {
        let documents = documents
            .into_iter()
            .enumerate()
            .map(|(i, mut doc)| {
                if doc.id.is_empty() {
                    doc.id = format!("doc_{}", i);
                }
                doc
            })
            .collect();

        Self { documents, config }
    }

    /// Load a corpus from a JSON array of documents
    pub async fn from_json_file(path: impl AsRef<Path>, config: SearchConfig) -> Result<Self> {
        let path = path.as_ref();
        let raw = tokio::fs::read_to_string(path).await?;
        let documents: Vec<Document> = serde_json::from_str(&raw).map_err(|e| Error::Serialization(
            format!("{} is not a JSON array of documents: {}", path.display(), e)
        ))?;

        tracing::debug!(path = %path.display(), documents = documents.len(), "loaded corpus");
        Ok(Self::new(documents, config))
    }

    pub fn len(&self) -> usize {
        self.documents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }

    /// Lowercased alphanumeric words
    fn words(text: &str) -> impl Iterator<Item = String> + '_ {
        text.split(|c: char| !c.is_alphanumeric())
            .filter(|word| !word.is_empty())
            .map(str::to_lowercase)
    }

    /// Share of the query's words that appear as whole words in the content
    fn text_similarity(query: &str, content: &str) -> f32 {
        let content_words: HashSet<String> = Self::words(content).collect();
        let query_words: Vec<String> = Self::words(query).collect();

        if query_words.is_empty() {
            return 0.0;
        }

        let matches = query_words
            .iter()
            .filter(|word| content_words.contains(word.as_str()))
            .count();

        matches as f32 / query_words.len() as f32
    }
}

#[async_trait]
impl DocumentStore for LocalDocumentStore {
    async fn search(&self, query: &str) -> Result<Vec<Document>> {
        let mut results: Vec<Document> = self
            .documents
            .iter()
            .map(|doc| {
                let mut scored = doc.clone();
                scored.score = Some(Self::text_similarity(query, &doc.content));
                scored
            })
            .filter(|doc| {
                let score = doc.score.unwrap_or(0.0);
                match self.config.score_threshold {
                    Some(threshold) => score >= threshold,
                    None => score > 0.0,
                }
            })
            .collect();

        // sort_by is stable, so equal scores keep corpus order
        results.sort_by(|a, b| {
            b.score
                .unwrap_or(0.0)
                .total_cmp(&a.score.unwrap_or(0.0))
        });
        results.truncate(self.config.top_k);

        Ok(results)
    }

    fn name(&self) -> &str {
        "local"
    }
}

/// Qdrant-backed document store.
///
/// Searches an existing collection; query vectors come from an external
/// embedding service. Text is read from the `page_content` payload key, with
/// `content` as a fallback.
pub struct QdrantDocumentStore {
    client: Qdrant,
    collection: String,
    embedder: Arc<dyn Embedder>,
    config: SearchConfig,
}

impl QdrantDocumentStore {
    const TEXT_KEYS: [&'static str; 2] = ["page_content", "content"];

    /// Connect to Qdrant using the given configuration
    pub fn new(config: &QdrantConfig, embedder: Arc<dyn Embedder>) -> Result<Self> {
        let client = Qdrant::from_url(&config.url)
            .build()
            .map_err(|e| Error::Retrieval(format!("Failed to create Qdrant client: {}", e)))?;

        Ok(Self {
            client,
            collection: config.collection.clone(),
            embedder,
            config: config.search_config(),
        })
    }

    /// Fail early when the configured collection does not exist
    pub async fn ensure_collection(&self) -> Result<()> {
        let exists = self
            .client
            .collection_exists(self.collection.clone())
            .await
            .map_err(|e| Error::Retrieval(format!("Qdrant unreachable: {}", e)))?;

        if !exists {
            return Err(Error::Retrieval(format!(
                "Qdrant collection '{}' does not exist",
                self.collection
            )));
        }

        Ok(())
    }

    /// Convert a scored point into a document
    pub(crate) fn point_to_document(point: ScoredPoint) -> Result<Document> {
        let id = point
            .id
            .and_then(|id| id.point_id_options)
            .map(|options| match options {
                PointIdOptions::Num(num) => num.to_string(),
                PointIdOptions::Uuid(uuid) => uuid,
            })
            .unwrap_or_default();

        let mut payload: Map<String, Value> = point
            .payload
            .into_iter()
            .map(|(key, value)| (key, qdrant_value_to_json(value)))
            .collect();

        let content = Self::TEXT_KEYS
            .iter()
            .find_map(|key| match payload.remove(*key) {
                Some(Value::String(text)) => Some(text),
                _ => None,
            })
            .ok_or_else(|| Error::Retrieval(format!("Point '{}' has no text payload", id)))?;

        // LangChain-style stores nest metadata under one key
        let mut metadata = match payload.remove("metadata") {
            Some(Value::Object(nested)) => nested,
            _ => Map::new(),
        };
        metadata.extend(payload);

        let source = metadata
            .get("source")
            .and_then(Value::as_str)
            .map(String::from);

        Ok(Document {
            id,
            content,
            source,
            score: Some(point.score),
            metadata: Value::Object(metadata),
        })
    }
}

#[async_trait]
impl DocumentStore for QdrantDocumentStore {
    async fn search(&self, query: &str) -> Result<Vec<Document>> {
        let vector = self
            .embedder
            .embed(query)
            .await
            .map_err(|e| Error::Retrieval(format!("Query embedding failed: {}", e)))?;

        let mut request = SearchPointsBuilder::new(&self.collection, vector, self.config.top_k as u64)
            .with_payload(true);
        if let Some(threshold) = self.config.score_threshold {
            request = request.score_threshold(threshold);
        }

        let response = self
            .client
            .search_points(request)
            .await
            .map_err(|e| Error::Retrieval(format!("Qdrant search failed: {}", e)))?;

        response
            .result
            .into_iter()
            .map(Self::point_to_document)
            .collect()
    }

    fn name(&self) -> &str {
        "qdrant"
    }
}

fn qdrant_value_to_json(value: QdrantValue) -> Value {
    match value.kind {
        Some(Kind::NullValue(_)) | None => Value::Null,
        Some(Kind::BoolValue(b)) => Value::Bool(b),
        Some(Kind::IntegerValue(i)) => Value::from(i),
        Some(Kind::DoubleValue(d)) => serde_json::Number::from_f64(d)
            .map(Value::Number)
            .unwrap_or(Value::Null),
        Some(Kind::StringValue(s)) => Value::String(s),
        Some(Kind::ListValue(list)) => {
            Value::Array(list.values.into_iter().map(qdrant_value_to_json).collect())
        }
        Some(Kind::StructValue(st)) => Value::Object(
            st.fields
                .into_iter()
                .map(|(k, v)| (k, qdrant_value_to_json(v)))
                .collect(),
        ),
    }
}
