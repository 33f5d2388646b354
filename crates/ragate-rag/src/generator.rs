//! Answer generation stage

use std::sync::Arc;

use ragate_core::{Document, Error, LanguageService, Message, Result};

/// Join document contents, in order, separated by a blank line
pub fn format_context(documents: &[Document]) -> String {
    documents
        .iter()
        .map(|doc| doc.content.as_str())
        .collect::<Vec<_>>()
        .join("\n\n")
}

fn answer_prompt(question: &str, context: &str) -> String {
    format!(
        "You are an assistant for question-answering tasks. Use the following pieces of retrieved context to answer the question.\n\
        If you don't know the answer, just say that you don't know. Use three sentences maximum and keep the answer concise.\n\
        \n\
        Question: {}\n\
        \n\
        Context: {}\n\
        \n\
        Answer:",
        question, context
    )
}

/// Produces the final answer from the graded documents
#[derive(Clone)]
pub struct AnswerGenerator {
    llm: Arc<dyn LanguageService>,
}

impl AnswerGenerator {
    pub fn new(llm: Arc<dyn LanguageService>) -> Self {
        Self { llm }
    }

    /// The instruction message carrying question and context, followed by the
    /// raw question
    pub fn answer_messages(question: &str, documents: &[Document]) -> Vec<Message> {
        let context = format_context(documents);
        vec![
            Message::system(answer_prompt(question, &context)),
            Message::user(question),
        ]
    }

    /// Generate an answer grounded in `documents`.
    ///
    /// `documents` must be non-empty; the service's text is returned verbatim.
    #[tracing::instrument(
        name = "generate",
        skip(self, question, documents),
        fields(documents = documents.len(), answer_len)
    )]
    pub async fn generate(&self, question: &str, documents: &[Document]) -> Result<String> {
        if documents.is_empty() {
            return Err(Error::PreconditionViolation(
                "answer generation requires at least one document".to_string(),
            ));
        }

        let messages = Self::answer_messages(question, documents);
        let answer = self
            .llm
            .complete(&messages)
            .await
            .map_err(|e| Error::Generation(e.to_string()))?;

        tracing::Span::current().record("answer_len", answer.len());
        Ok(answer)
    }
}
