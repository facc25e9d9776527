//! Fact-check CLI
//!
//! Builds the vector index from a press-release corpus and checks claims
//! against it, one-shot or in an interactive session.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use factcheck_core::corpus::{build_index, load_documents, source_distribution, DEFAULT_BATCH_SIZE};
use factcheck_core::embeddings::load_provider;
use factcheck_core::search::expand_query_terms;
use factcheck_core::{
    load_index, save_index, AggregatedResult, ClaimVerifier, EmbeddingProvider, EvidenceRetriever,
    FactCheckConfig, FactChecker, LlmVerifier, RuleBasedExtractor, VectorIndex,
};
use serde::Deserialize;
use tokio::sync::RwLock;
use tracing::{info, Level};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

mod interactive;
mod report;

#[derive(Parser)]
#[command(name = "factcheck", version, about = "Check claims against government press releases")]
struct Cli {
    /// Index snapshot path (overrides FACTCHECK_INDEX_PATH)
    #[arg(long, global = true)]
    index: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Embed a JSONL corpus and write the index snapshot
    Build {
        /// Corpus file, one JSON document per line
        #[arg(long)]
        corpus: PathBuf,

        /// Snapshot output path (defaults to the configured index path)
        #[arg(long)]
        output: Option<PathBuf>,

        /// Documents embedded per batch
        #[arg(long, default_value_t = DEFAULT_BATCH_SIZE)]
        batch_size: usize,
    },

    /// Check a claim, or a file of claims
    Check {
        /// Text to check
        #[arg(required_unless_present = "input", conflicts_with = "input")]
        text: Option<String>,

        /// JSON file of the form {"claims": [...]}
        #[arg(long, requires = "output")]
        input: Option<PathBuf>,

        /// Where to write the JSON array of results
        #[arg(long)]
        output: Option<PathBuf>,

        /// Print the full result as JSON
        #[arg(short, long)]
        json: bool,
    },

    /// Show the evidence retrieved for a query
    Search {
        query: String,

        /// Maximum candidates to return
        #[arg(long)]
        top_k: Option<usize>,
    },

    /// Show index statistics
    Stats,

    /// Check claims in an interactive session
    Interactive,
}

#[derive(Debug, Deserialize)]
struct ClaimsFile {
    claims: Vec<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    // Logs go to stderr so stdout stays clean for results
    let log_level = if cli.verbose { Level::DEBUG } else { Level::WARN };
    tracing_subscriber::registry()
        .with(EnvFilter::from_default_env().add_directive(log_level.into()))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let mut config = FactCheckConfig::from_env()?;
    if let Some(index) = cli.index {
        config.index_path = index;
    }

    match cli.command {
        Commands::Build {
            corpus,
            output,
            batch_size,
        } => {
            let output = output.unwrap_or_else(|| config.index_path.clone());
            run_build(&config, &corpus, &output, batch_size)
        }
        Commands::Check {
            text,
            input,
            output,
            json,
        } => {
            let checker = open_checker(config)?;
            match (text, input, output) {
                (Some(text), _, _) => {
                    let result = checker.check_claim(&text).await?;
                    if json {
                        println!("{}", serde_json::to_string_pretty(&result)?);
                    } else {
                        print!("{}", report::render_result(&result, None));
                    }
                    Ok(())
                }
                (None, Some(input), Some(output)) => {
                    run_check_file(&checker, &input, &output).await
                }
                _ => bail!("provide a claim or --input with --output"),
            }
        }
        Commands::Search { query, top_k } => run_search(&config, &query, top_k).await,
        Commands::Stats => run_stats(&config),
        Commands::Interactive => {
            let checker = open_checker(config)?;
            interactive::run(&checker).await
        }
    }
}

fn run_build(config: &FactCheckConfig, corpus: &Path, output: &Path, batch_size: usize) -> Result<()> {
    let documents = load_documents(corpus)
        .with_context(|| format!("reading corpus {}", corpus.display()))?;
    println!("Loaded {} documents from {}", documents.len(), corpus.display());

    let embedder = load_provider(config)?;
    let index = build_index(documents, embedder.as_ref(), batch_size)?;
    save_index(output, &index)?;

    println!("Indexed {} documents -> {}", index.len(), output.display());
    println!("\nSource distribution:");
    for entry in source_distribution(index.records()) {
        println!("  {:>5}  {}", entry.count, entry.source);
    }
    Ok(())
}

async fn run_check_file(checker: &FactChecker, input: &Path, output: &Path) -> Result<()> {
    let raw = fs::read_to_string(input).with_context(|| format!("reading {}", input.display()))?;
    let file: ClaimsFile = serde_json::from_str(&raw)
        .with_context(|| format!("{} must contain {{\"claims\": [...]}}", input.display()))?;

    let results: Vec<AggregatedResult> = checker.check_batch(&file.claims).await?;
    fs::write(output, serde_json::to_string_pretty(&results)?)
        .with_context(|| format!("writing {}", output.display()))?;

    println!("Checked {} claims -> {}", results.len(), output.display());
    Ok(())
}

async fn run_search(config: &FactCheckConfig, query: &str, top_k: Option<usize>) -> Result<()> {
    let embedder = load_provider(config)?;
    let index = open_index(config, embedder.as_ref())?;
    let retriever = EvidenceRetriever::new(
        Arc::new(RwLock::new(index)),
        embedder.clone(),
        config.retrieval,
    )?;

    let embedding = embedder.embed(query)?;
    let candidates = retriever
        .retrieve(
            &embedding,
            top_k.unwrap_or(config.retrieval.top_k),
            config.retrieval.similarity_threshold,
        )
        .await?;

    print!("{}", report::render_candidates(&candidates));
    let expansions = expand_query_terms(query);
    if !expansions.is_empty() {
        println!("Related terms: {}", expansions.join(", "));
    }
    Ok(())
}

fn run_stats(config: &FactCheckConfig) -> Result<()> {
    let index = load_index(&config.index_path)
        .with_context(|| format!("loading index {}", config.index_path.display()))?;
    let stats = index.stats();

    println!("Documents:  {}", stats.count);
    println!("Dimension:  {}", stats.dimension);
    println!("Top-k:      {}", config.retrieval.top_k);
    println!("Threshold:  {}", config.retrieval.similarity_threshold);
    println!("Model:      {}", config.llm.model);
    println!("\nSources:");
    for entry in source_distribution(index.records()) {
        println!("  {:>5}  {}", entry.count, entry.source);
    }
    Ok(())
}

/// Load the configured snapshot, checking it against the embedder.
fn open_index(config: &FactCheckConfig, embedder: &dyn EmbeddingProvider) -> Result<VectorIndex> {
    let index = load_index(&config.index_path).with_context(|| {
        format!(
            "loading index {} (run `factcheck build` first)",
            config.index_path.display()
        )
    })?;
    info!("Loaded {} documents", index.len());

    if index.dimension() != embedder.dimension() {
        bail!(
            "index dimension {} does not match embedder dimension {}",
            index.dimension(),
            embedder.dimension()
        );
    }
    Ok(index)
}

fn open_checker(config: FactCheckConfig) -> Result<FactChecker> {
    let embedder = load_provider(&config)?;
    let index = open_index(&config, embedder.as_ref())?;
    let verifier: Arc<dyn ClaimVerifier> = Arc::new(LlmVerifier::from_config(&config)?);

    Ok(FactChecker::new(
        config,
        index,
        embedder,
        Arc::new(RuleBasedExtractor::new()),
        verifier,
    )?)
}
