//! Values passed between pipeline stages

use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::StructuredSchema;

/// Fixed answer returned when grading leaves no documents.
pub const NO_RELEVANT_DOCUMENTS: &str = "No relevant documents found. Try a different query.";

/// Structured output of the relevance grader.
///
/// The service is asked for `{"binary_score": "yes" | "no"}`; the field name
/// is part of the wire contract.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct GradeResult {
    pub binary_score: String,
}

impl GradeResult {
    /// The only label that marks a document relevant. Compared exactly.
    pub const RELEVANT: &'static str = "yes";
    pub const NOT_RELEVANT: &'static str = "no";

    /// Schema handed to the language service for constrained completion
    pub fn schema() -> StructuredSchema {
        StructuredSchema {
            name: "grade_documents".to_string(),
            description: Some("Binary score for relevance check on retrieved documents.".to_string()),
            schema: json!({
                "type": "object",
                "properties": {
                    "binary_score": {
                        "type": "string",
                        "description": "Documents are relevant to the question, 'yes' or 'no'",
                        "enum": [Self::RELEVANT, Self::NOT_RELEVANT],
                    }
                },
                "required": ["binary_score"],
                "additionalProperties": false,
            }),
        }
    }

    /// Validate a raw structured completion before trusting its label.
    ///
    /// A missing or non-string `binary_score`, or any extra key, is
    /// malformed. A well-formed label other than exactly `"yes"` (including
    /// `"Yes"` or `" yes"`) is not relevant.
    pub fn verdict(value: &serde_json::Value) -> Verdict {
        match serde_json::from_value::<GradeResult>(value.clone()) {
            Ok(grade) if grade.binary_score == Self::RELEVANT => Verdict::Relevant,
            Ok(_) => Verdict::NotRelevant,
            Err(e) => Verdict::Malformed(format!("{}: {}", e, value)),
        }
    }
}

/// Validated outcome of grading one document
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Verdict {
    Relevant,
    NotRelevant,
    Malformed(String),
}

impl Verdict {
    pub fn is_relevant(&self) -> bool {
        matches!(self, Verdict::Relevant)
    }
}

/// How the grader treats a document whose grade violates the schema
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GradeFailurePolicy {
    /// Drop the document and keep grading the rest
    #[default]
    Exclude,
    /// Abort the grading pass with the schema violation
    Abort,
}

/// Terminal state of a pipeline run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PipelineStatus {
    Answered,
    NoRelevantDocuments,
}

/// Result of one pipeline run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PipelineResult {
    pub answer: String,
    pub status: PipelineStatus,
    /// Documents the store returned
    pub retrieved: usize,
    /// Documents that survived grading
    pub relevant: usize,
}

impl PipelineResult {
    pub fn answered(answer: String, retrieved: usize, relevant: usize) -> Self {
        Self {
            answer,
            status: PipelineStatus::Answered,
            retrieved,
            relevant,
        }
    }

    pub fn rejected(retrieved: usize) -> Self {
        Self {
            answer: NO_RELEVANT_DOCUMENTS.to_string(),
            status: PipelineStatus::NoRelevantDocuments,
            retrieved,
            relevant: 0,
        }
    }

    pub fn is_answered(&self) -> bool {
        self.status == PipelineStatus::Answered
    }
}
