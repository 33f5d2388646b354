//! Relevance-gated retrieval-augmented generation for ragate
//!
//! This crate provides the document stores, the relevance grader, the
//! generation gate, the answer generator and the pipeline that sequences them.

mod config;
mod gate;
mod generator;
mod grader;
mod pipeline;
mod retriever;
mod vector_store;

#[cfg(test)]
mod fakes;
#[cfg(test)]
mod tests;

pub use config::QdrantConfig;
pub use gate::should_generate;
pub use generator::{AnswerGenerator, format_context};
pub use grader::{GradingConfig, RelevanceGrader};
pub use pipeline::{Pipeline, PipelineStage};
pub use retriever::Retriever;
pub use vector_store::{LocalDocumentStore, QdrantDocumentStore, SearchConfig};

// Re-export core types for convenience
pub use ragate_core::{
    Document, DocumentStore, Embedder, LanguageService, Message,
    GradeFailurePolicy, GradeResult, PipelineResult, PipelineStatus, Verdict,
    NO_RELEVANT_DOCUMENTS, Error, Result,
};
