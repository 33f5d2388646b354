//! Pipeline orchestration

use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use uuid::Uuid;

use ragate_core::{DocumentStore, LanguageService, PipelineResult, Result};

use crate::gate::should_generate;
use crate::generator::AnswerGenerator;
use crate::grader::{GradingConfig, RelevanceGrader};
use crate::retriever::Retriever;

/// Stages of one run. `Generating` and `Rejected` are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PipelineStage {
    Retrieving,
    Grading,
    Generating,
    Rejected,
}

impl fmt::Display for PipelineStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            PipelineStage::Retrieving => "retrieving",
            PipelineStage::Grading => "grading",
            PipelineStage::Generating => "generating",
            PipelineStage::Rejected => "rejected",
        };
        f.write_str(name)
    }
}

/// Retrieve, grade, gate, generate.
///
/// The pipeline owns the store and language service handles it was built
/// with; nothing is shared between runs.
pub struct Pipeline {
    retriever: Retriever,
    grader: RelevanceGrader,
    generator: AnswerGenerator,
}

impl Pipeline {
    /// Create a pipeline with the default grading configuration
    pub fn new(store: Arc<dyn DocumentStore>, llm: Arc<dyn LanguageService>) -> Self {
        Self {
            retriever: Retriever::new(store),
            grader: RelevanceGrader::new(llm.clone()),
            generator: AnswerGenerator::new(llm),
        }
    }

    pub fn with_grading(mut self, config: GradingConfig) -> Self {
        self.grader = self.grader.with_config(config);
        self
    }

    /// Answer one question.
    ///
    /// Empty retrieval still passes through grading (with no calls). When no
    /// document survives grading the fixed rejection message is returned and
    /// the language service is not asked for an answer. Errors from any stage
    /// abort the run.
    #[tracing::instrument(name = "pipeline.run", skip(self), fields(run_id = %Uuid::new_v4()))]
    pub async fn run(&self, question: &str) -> Result<PipelineResult> {
        tracing::info!(stage = %PipelineStage::Retrieving, "Retrieving documents...");
        let documents = self.retriever.retrieve(question).await?;

        tracing::info!(stage = %PipelineStage::Grading, candidates = documents.len(), "Reviewing documents...");
        let filtered = self.grader.grade(question, &documents).await?;

        if !should_generate(&filtered) {
            tracing::info!(stage = %PipelineStage::Rejected, "No document passed grading");
            return Ok(PipelineResult::rejected(documents.len()));
        }

        tracing::info!(stage = %PipelineStage::Generating, relevant = filtered.len(), "Generating answer...");
        let answer = self.generator.generate(question, &filtered).await?;

        Ok(PipelineResult::answered(answer, documents.len(), filtered.len()))
    }
}
