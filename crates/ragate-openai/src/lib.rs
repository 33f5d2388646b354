//! OpenAI-compatible language service for ragate
//!
//! This crate provides the chat-completions implementation of the
//! `LanguageService` trait, including schema-constrained completions, and an
//! `Embedder` backed by the embeddings endpoint.

mod client;
mod config;


pub use client::OpenAiClient;
pub use config::OpenAiConfig;

// Re-export core types for convenience
pub use ragate_core::{
    Embedder, LanguageService, Message, Role, StructuredSchema,
    Error, Result,
};
