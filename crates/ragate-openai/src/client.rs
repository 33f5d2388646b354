//! OpenAI-compatible chat completions client

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use std::time::Duration;

use ragate_core::{
    Embedder, LanguageService, Message, StructuredSchema,
    Error, Result,
};

use crate::config::OpenAiConfig;

/// Chat completions client shared by every pipeline stage
pub struct OpenAiClient {
    config: OpenAiConfig,
    client: Client,
}

#[derive(Serialize)]
struct EmbeddingRequest<'a> {
    model: &'a str,
    input: &'a str,
}

#[derive(Deserialize)]
struct EmbeddingData {
    embedding: Vec<f32>,
}

#[derive(Deserialize)]
struct EmbeddingResponse {
    data: Vec<EmbeddingData>,
}

impl OpenAiClient {
    /// Create a new client from configuration
    pub fn new(config: OpenAiConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(60))
            .build()
            .map_err(|e| Error::Network(e.to_string()))?;

        Ok(Self { config, client })
    }

    /// Create a new client from environment variables
    pub fn from_env() -> Result<Self> {
        let config = OpenAiConfig::from_env()?;
        Self::new(config)
    }

    /// Set the model to use for completions
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.config.model = model.into();
        self
    }

    pub fn config(&self) -> &OpenAiConfig {
        &self.config
    }

    /// Build the request body for a chat completion
    pub(crate) fn chat_body(&self, messages: &[Message], schema: Option<&StructuredSchema>) -> Value {
        let mut body = json!({
            "model": self.config.model,
            "temperature": self.config.temperature,
            "messages": messages,
        });

        if let Some(schema) = schema {
            let mut json_schema = json!({
                "name": schema.name,
                "strict": true,
                "schema": schema.schema,
            });
            if let Some(description) = &schema.description {
                json_schema["description"] = json!(description);
            }
            body["response_format"] = json!({
                "type": "json_schema",
                "json_schema": json_schema,
            });
        }

        body
    }

    /// Extract the assistant text from a chat completion response
    pub(crate) fn parse_chat_content(response: &Value) -> Result<String> {
        let message = response["choices"]
            .get(0)
            .map(|choice| &choice["message"])
            .ok_or_else(|| Error::LanguageService("No choices in response".to_string()))?;

        if let Some(refusal) = message["refusal"].as_str() {
            return Err(Error::SchemaViolation(format!("Model refused: {}", refusal)));
        }

        message["content"]
            .as_str()
            .map(String::from)
            .ok_or_else(|| Error::LanguageService("No content in response".to_string()))
    }

    /// Parse the text of a constrained completion into JSON
    pub(crate) fn parse_structured(content: &str) -> Result<Value> {
        serde_json::from_str(content.trim()).map_err(|e| Error::SchemaViolation(format!(
            "Structured output is not valid JSON ({}): {}",
            e, content
        )))
    }

    async fn post_json(&self, path: &str, body: &impl Serialize) -> Result<Value> {
        let url = format!("{}{}", self.config.base_url, path);

        let response = self
            .client
            .post(&url)
            .header("Content-Type", "application/json")
            .bearer_auth(&self.config.api_key)
            .json(body)
            .send()
            .await
            .map_err(|e| Error::Network(format!("{} connection failed: {}", url, e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(Error::LanguageService(format!(
                "API request failed with status {}: {}",
                status, error_text
            )));
        }

        response
            .json()
            .await
            .map_err(|e| Error::Serialization(e.to_string()))
    }
}

#[async_trait]
impl LanguageService for OpenAiClient {
    async fn complete(&self, messages: &[Message]) -> Result<String> {
        let body = self.chat_body(messages, None);
        tracing::debug!(model = %self.config.model, messages = messages.len(), "chat completion");

        let response = self.post_json("/chat/completions", &body).await?;
        Self::parse_chat_content(&response)
    }

    async fn complete_structured(
        &self,
        messages: &[Message],
        schema: &StructuredSchema,
    ) -> Result<Value> {
        let body = self.chat_body(messages, Some(schema));
        tracing::debug!(model = %self.config.model, schema = %schema.name, "structured completion");

        let response = self.post_json("/chat/completions", &body).await?;
        let content = Self::parse_chat_content(&response)?;
        Self::parse_structured(&content)
    }

    fn model_id(&self) -> &str {
        &self.config.model
    }
}

#[async_trait]
impl Embedder for OpenAiClient {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        let request = EmbeddingRequest {
            model: &self.config.embedding_model,
            input: text,
        };

        let response = self.post_json("/embeddings", &request).await?;
        let parsed: EmbeddingResponse = serde_json::from_value(response)?;

        parsed
            .data
            .into_iter()
            .next()
            .map(|d| d.embedding)
            .ok_or_else(|| Error::LanguageService("Empty embedding response".to_string()))
    }
}
