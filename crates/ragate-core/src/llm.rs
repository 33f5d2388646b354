//! Language service trait and types

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::Result;

/// Author of a chat message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

/// A role-tagged chat message
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub role: Role,
    pub content: String,
}

impl Message {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }
}

/// Output schema for a constrained completion
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StructuredSchema {
    /// Schema name reported to the provider
    pub name: String,
    /// Optional description of what the schema captures
    pub description: Option<String>,
    /// JSON schema the completion must satisfy
    pub schema: serde_json::Value,
}

/// Trait for language services (e.g., OpenAI-compatible chat APIs)
///
/// Implementations are constructed once, configured for deterministic output,
/// and shared read-only by every pipeline stage.
#[async_trait]
pub trait LanguageService: Send + Sync {
    /// Unconstrained chat completion returning free text
    async fn complete(&self, messages: &[Message]) -> Result<String>;

    /// Completion constrained to `schema`, returning the parsed JSON value.
    ///
    /// Output that is not valid JSON must be reported as
    /// [`Error::SchemaViolation`](crate::Error::SchemaViolation). Callers still
    /// validate the value's shape themselves.
    async fn complete_structured(
        &self,
        messages: &[Message],
        schema: &StructuredSchema,
    ) -> Result<serde_json::Value>;

    /// Get the model ID being used
    fn model_id(&self) -> &str;
}

/// Trait for services that turn text into query vectors
#[async_trait]
pub trait Embedder: Send + Sync {
    async fn embed(&self, text: &str) -> Result<Vec<f32>>;
}
