//! Error types for ragate

use thiserror::Error;

/// Result type alias using our custom Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Error taxonomy shared by every pipeline stage.
///
/// Provider-level variants (`LanguageService`, `Network`, ...) are what the
/// clients raise; the pipeline maps them into a stage variant (`Retrieval`,
/// `Grading`, `Generation`) at the stage boundary.
#[derive(Error, Debug)]
pub enum Error {
    #[error("Retrieval failed: {0}")]
    Retrieval(String),

    #[error("Schema violation: {0}")]
    SchemaViolation(String),

    #[error("Grading failed: {0}")]
    Grading(String),

    #[error("Generation failed: {0}")]
    Generation(String),

    #[error("Precondition violated: {0}")]
    PreconditionViolation(String),

    #[error("Language service error: {0}")]
    LanguageService(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Other error: {0}")]
    Other(String),
}

impl Error {
    /// Whether the error came from the structured-output contract rather than
    /// from the transport or the provider.
    pub fn is_schema_violation(&self) -> bool {
        matches!(self, Error::SchemaViolation(_))
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Serialization(err.to_string())
    }
}

impl From<anyhow::Error> for Error {
    fn from(err: anyhow::Error) -> Self {
        Error::Other(err.to_string())
    }
}
