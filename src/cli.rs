//! Command-line surface

use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

use ragate_rag::{GradeFailurePolicy, GradingConfig, PipelineResult};

#[derive(Parser, Debug)]
#[command(name = "ragate")]
#[command(about = "Answer a question from retrieved documents, or say none are relevant", long_about = None)]
pub struct Cli {
    /// Question to answer
    pub question: String,

    /// Answer from a local JSON corpus instead of Qdrant
    #[arg(long, value_name = "FILE")]
    pub corpus: Option<PathBuf>,

    /// Qdrant collection to search (overrides QDRANT_COLLECTION)
    #[arg(long)]
    pub collection: Option<String>,

    /// Qdrant endpoint (overrides QDRANT_URL)
    #[arg(long)]
    pub qdrant_url: Option<String>,

    /// Number of documents to retrieve (overrides RAGATE_TOP_K)
    #[arg(long, value_parser = clap::value_parser!(u64).range(1..))]
    pub top_k: Option<u64>,

    /// Documents graded at once
    #[arg(long, default_value_t = 1, value_parser = clap::value_parser!(u64).range(1..))]
    pub grading_concurrency: u64,

    /// Fail the run when a grade does not match the schema
    #[arg(long)]
    pub abort_on_malformed_grade: bool,

    /// Print the full result as JSON
    #[arg(long)]
    pub json: bool,

    /// Enable debug logging
    #[arg(short, long)]
    pub verbose: bool,
}

impl Cli {
    pub fn grading_config(&self) -> GradingConfig {
        GradingConfig {
            policy: if self.abort_on_malformed_grade {
                GradeFailurePolicy::Abort
            } else {
                GradeFailurePolicy::Exclude
            },
            concurrency: self.grading_concurrency as usize,
        }
    }
}

/// Logs go to stderr so stdout carries only the answer
pub fn init_tracing(verbose: bool) {
    let filter = if verbose {
        "ragate=debug,ragate_rag=debug,ragate_openai=debug"
    } else {
        "ragate=info,ragate_rag=info,ragate_openai=warn"
    };

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)))
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

/// Text printed on stdout for a finished run
pub fn render(result: &PipelineResult, json: bool) -> Result<String> {
    if json {
        Ok(serde_json::to_string_pretty(result)?)
    } else {
        Ok(result.answer.clone())
    }
}
