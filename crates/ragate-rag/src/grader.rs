//! Relevance grading stage

use futures::stream::{self, StreamExt};
use serde::{Deserialize, Serialize};
use std::pin::pin;
use std::sync::Arc;

use ragate_core::{
    Document, Error, GradeFailurePolicy, GradeResult, LanguageService, Message, Result, Verdict,
};

const GRADER_SYSTEM_PROMPT: &str = "You are a grader assessing relevance of a retrieved document to a user question.\n\
If the document contains keyword(s) or semantic meaning related to the user question, grade it as relevant.\n\
It does not need to be a stringent test. The goal is to filter out erroneous retrievals.\n\
Give a binary score 'yes' or 'no' score to indicate whether the document is relevant to the question.";

/// Grading behaviour
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct GradingConfig {
    pub policy: GradeFailurePolicy,
    /// Documents graded at once; 1 grades strictly in order
    pub concurrency: usize,
}

impl Default for GradingConfig {
    fn default() -> Self {
        Self {
            policy: GradeFailurePolicy::Exclude,
            concurrency: 1,
        }
    }
}

/// Filters retrieved documents down to the ones the language service labels
/// relevant. One constrained completion per document, no cross-document
/// context.
#[derive(Clone)]
pub struct RelevanceGrader {
    llm: Arc<dyn LanguageService>,
    config: GradingConfig,
}

impl RelevanceGrader {
    pub fn new(llm: Arc<dyn LanguageService>) -> Self {
        Self {
            llm,
            config: GradingConfig::default(),
        }
    }

    pub fn with_config(mut self, config: GradingConfig) -> Self {
        self.config = config;
        self
    }

    /// Build the grading conversation for one document
    pub fn grading_messages(question: &str, document: &Document) -> Vec<Message> {
        vec![
            Message::system(GRADER_SYSTEM_PROMPT),
            Message::user(format!(
                "Here is the retrieved document: \n\n {} \n\n Here is the user question: \n\n {}",
                document.content, question
            )),
        ]
    }

    /// Keep the documents labeled relevant, in input order.
    ///
    /// Transport or provider failures abort with [`Error::Grading`]. A grade
    /// that violates the schema excludes its document under
    /// [`GradeFailurePolicy::Exclude`] and aborts with
    /// [`Error::SchemaViolation`] under [`GradeFailurePolicy::Abort`].
    #[tracing::instrument(
        name = "grade",
        skip(self, question, documents),
        fields(documents = documents.len(), kept)
    )]
    pub async fn grade(&self, question: &str, documents: &[Document]) -> Result<Vec<Document>> {
        let mut filtered = Vec::new();

        if self.config.concurrency <= 1 {
            for (index, document) in documents.iter().enumerate() {
                let verdict = self.grade_document(question, index, document).await?;
                if self.accept(index, verdict)? {
                    filtered.push(document.clone());
                }
            }
        } else {
            // buffered() yields in input order regardless of completion order;
            // returning early drops the stream so no further documents start
            let mut verdicts = pin!(
                stream::iter(documents.iter().enumerate())
                    .map(|(index, document)| async move {
                        (index, document, self.grade_document(question, index, document).await)
                    })
                    .buffered(self.config.concurrency)
            );

            while let Some((index, document, verdict)) = verdicts.next().await {
                if self.accept(index, verdict?)? {
                    filtered.push(document.clone());
                }
            }
        }

        tracing::Span::current().record("kept", filtered.len());
        Ok(filtered)
    }

    #[tracing::instrument(name = "grade_document", skip(self, question, document), fields(verdict))]
    async fn grade_document(&self, question: &str, index: usize, document: &Document) -> Result<Verdict> {
        let messages = Self::grading_messages(question, document);

        let verdict = match self.llm.complete_structured(&messages, &GradeResult::schema()).await {
            Ok(value) => GradeResult::verdict(&value),
            Err(Error::SchemaViolation(reason)) => Verdict::Malformed(reason),
            Err(e) => return Err(Error::Grading(format!("document {}: {}", index, e))),
        };

        tracing::Span::current().record("verdict", tracing::field::debug(&verdict));
        Ok(verdict)
    }

    /// Apply the failure policy to one verdict
    fn accept(&self, index: usize, verdict: Verdict) -> Result<bool> {
        match verdict {
            Verdict::Relevant => Ok(true),
            Verdict::NotRelevant => Ok(false),
            Verdict::Malformed(reason) => match self.config.policy {
                GradeFailurePolicy::Exclude => {
                    tracing::warn!(index, %reason, "malformed grade, excluding document");
                    Ok(false)
                }
                GradeFailurePolicy::Abort => Err(Error::SchemaViolation(format!(
                    "document {}: {}",
                    index, reason
                ))),
            },
        }
    }
}
