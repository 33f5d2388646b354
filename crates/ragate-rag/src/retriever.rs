//! Document retrieval stage

use std::sync::Arc;

use ragate_core::{Document, DocumentStore, Error, Result};

/// Passes the question to the document store unchanged
#[derive(Clone)]
pub struct Retriever {
    store: Arc<dyn DocumentStore>,
}

impl Retriever {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self { store }
    }

    /// Retrieve candidate documents, in the store's ranking order.
    ///
    /// An empty result is not an error. Any store failure is reported as
    /// [`Error::Retrieval`].
    #[tracing::instrument(name = "retrieve", skip(self), fields(store = self.store.name(), count))]
    pub async fn retrieve(&self, question: &str) -> Result<Vec<Document>> {
        let documents = self.store.search(question).await.map_err(|e| match e {
            Error::Retrieval(_) => e,
            other => Error::Retrieval(other.to_string()),
        })?;

        tracing::Span::current().record("count", documents.len());
        Ok(documents)
    }
}
