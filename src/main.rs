use anyhow::{Context, Result};
use clap::Parser;
use colored::*;
use std::process::ExitCode;
use std::sync::Arc;

mod cli;

use cli::Cli;
use ragate_core::{DocumentStore, PipelineResult};
use ragate_openai::OpenAiClient;
use ragate_rag::{LocalDocumentStore, Pipeline, QdrantConfig, QdrantDocumentStore, SearchConfig};

#[tokio::main]
async fn main() -> ExitCode {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();
    cli::init_tracing(cli.verbose);

    match run(&cli).await {
        Ok(result) => match cli::render(&result, cli.json) {
            Ok(output) => {
                println!("{}", output);
                ExitCode::SUCCESS
            }
            Err(e) => report(e),
        },
        Err(e) => report(e),
    }
}

async fn run(cli: &Cli) -> Result<PipelineResult> {
    // Built once and shared by every stage
    let llm = Arc::new(OpenAiClient::from_env().context("language service is not configured")?);
    tracing::debug!(model = %llm.config().model, "language service ready");

    let store = open_store(cli, llm.clone()).await?;
    let pipeline = Pipeline::new(store, llm).with_grading(cli.grading_config());

    Ok(pipeline.run(&cli.question).await?)
}

async fn open_store(cli: &Cli, llm: Arc<OpenAiClient>) -> Result<Arc<dyn DocumentStore>> {
    if let Some(path) = &cli.corpus {
        let mut config = SearchConfig::default();
        if let Some(top_k) = cli.top_k {
            config.top_k = top_k as usize;
        }

        let store = LocalDocumentStore::from_json_file(path, config)
            .await
            .with_context(|| format!("failed to load corpus {}", path.display()))?;
        tracing::info!(documents = store.len(), "Using local corpus");
        return Ok(Arc::new(store));
    }

    let mut config = QdrantConfig::from_env()?;
    if let Some(url) = &cli.qdrant_url {
        config.url = url.clone();
    }
    if let Some(collection) = &cli.collection {
        config.collection = collection.clone();
    }
    if let Some(top_k) = cli.top_k {
        config.top_k = top_k as usize;
    }

    let store = QdrantDocumentStore::new(&config, llm)?;
    store.ensure_collection().await?;
    tracing::info!(url = %config.url, collection = %config.collection, "Using Qdrant collection");
    Ok(Arc::new(store))
}

fn report(error: anyhow::Error) -> ExitCode {
    eprintln!("{} {:#}", "error:".red().bold(), error);
    ExitCode::FAILURE
}
