//! Core traits and types for ragate
//!
//! This crate defines the seams of the question-answering pipeline: the
//! document store and language service collaborators, the values that flow
//! between pipeline stages, and the shared error taxonomy. Everything that
//! talks to the network lives behind these traits so the pipeline can be
//! driven by scripted fakes in tests.

pub mod document_store;
pub mod error;
pub mod llm;
pub mod types;

pub use document_store::{Document, DocumentStore};
pub use error::{Error, Result};
pub use llm::{Embedder, LanguageService, Message, Role, StructuredSchema};
pub use types::*;
