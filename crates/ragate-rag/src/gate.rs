//! Generation gate

use ragate_core::Document;

/// Generation proceeds only when at least one document survived grading.
pub fn should_generate(filtered_documents: &[Document]) -> bool {
    !filtered_documents.is_empty()
}
