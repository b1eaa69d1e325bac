//! FAQ CLI - Command-line interface for the FAQ retrieval pipeline.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use clap::{Parser, Subcommand};
use serde::{Deserialize, Serialize};
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

use faq_chunk::{CharacterSplitter, Chunker};
use faq_core::{Document, FaqConfig, FaqError, Result, ScoredDocument, SearchResults};
use faq_query::{
    long_context_reorder, Bm25Retriever, EnsembleRetriever, QueryEngine, RankFusionEngine,
    RetrieverSet,
};

/// FAQ - rank-fusion retrieval over a small FAQ corpus
#[derive(Parser)]
#[command(name = "faq")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Config file (default: user config dir, then ./faq-rag.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Split a text file into chunks
    Split {
        /// Text file to split
        file: PathBuf,
    },

    /// Search a text file with the ensemble retriever
    Search {
        /// Search query
        query: String,

        /// Text file holding the FAQ corpus
        #[arg(short, long)]
        file: PathBuf,

        /// Documents returned by the lexical retriever
        #[arg(short = 'k', long)]
        top_k: Option<usize>,

        /// Rank-bias constant
        #[arg(short = 'c', long)]
        rank_bias: Option<f64>,

        /// Number of fused results to keep
        #[arg(long)]
        limit: Option<usize>,

        /// Keep every fused result, ignoring the configured limit
        #[arg(long, conflicts_with = "limit")]
        all: bool,

        /// Keep fused order instead of long-context order
        #[arg(long)]
        no_reorder: bool,
    },

    /// Fuse pre-fetched weighted ranked lists from a JSON file
    Fuse {
        /// JSON file: [{"name": ..., "weight": ..., "documents": [...]}, ...]
        input: PathBuf,

        /// Rank-bias constant
        #[arg(short = 'c', long)]
        rank_bias: Option<f64>,

        /// Number of fused results to keep
        #[arg(long)]
        limit: Option<usize>,

        /// Keep every fused result, ignoring the configured limit
        #[arg(long, conflicts_with = "limit")]
        all: bool,

        /// Keep fused order instead of long-context order
        #[arg(long)]
        no_reorder: bool,
    },
}

/// One pre-fetched retriever output.
#[derive(Debug, Deserialize)]
struct WeightedList {
    #[serde(default)]
    name: Option<String>,
    weight: f64,
    documents: Vec<Document>,
}

/// Output of the `fuse` command.
#[derive(Debug, Serialize)]
struct FuseOutput {
    results: Vec<ScoredDocument>,
    context: Vec<Document>,
}

fn setup_logging(verbose: bool) {
    let level = if verbose { Level::DEBUG } else { Level::WARN };
    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber).ok();
}

fn load_config(path: Option<&Path>) -> Result<FaqConfig> {
    match path {
        Some(path) => FaqConfig::load(path),
        None => FaqConfig::load_default(),
    }
}

#[tokio::main]
async fn main() -> std::result::Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    setup_logging(cli.verbose);

    let outcome = match load_config(cli.config.as_deref()) {
        Ok(config) => run(cli.command, config).await,
        Err(e) => Err(e),
    };

    if let Err(e) = outcome {
        eprintln!("Error [{}]: {}", e.error_code(), e);
        std::process::exit(1);
    }

    Ok(())
}

async fn run(command: Commands, mut config: FaqConfig) -> Result<()> {
    match command {
        Commands::Split { file } => split(&file, &config),
        Commands::Search {
            query,
            file,
            top_k,
            rank_bias,
            limit,
            all,
            no_reorder,
        } => {
            if let Some(k) = top_k {
                config.lexical.k = k;
            }
            if let Some(c) = rank_bias {
                config.ensemble.rank_bias_constant = c;
            }
            config.ensemble.limit = resolve_limit(limit, all, config.ensemble.limit);
            search(&query, &file, &config, !no_reorder).await
        }
        Commands::Fuse {
            input,
            rank_bias,
            limit,
            all,
            no_reorder,
        } => {
            let c = rank_bias.unwrap_or(config.ensemble.rank_bias_constant);
            let limit = resolve_limit(limit, all, config.ensemble.limit);
            fuse(&input, c, limit, !no_reorder)
        }
    }
}

/// Pick the result limit from command-line flags and configuration.
fn resolve_limit(limit: Option<usize>, all: bool, configured: Option<usize>) -> Option<usize> {
    if all {
        None
    } else {
        limit.or(configured)
    }
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// Read a corpus file and split it into chunk documents.
fn load_chunks(file: &Path, config: &FaqConfig) -> Result<Vec<Document>> {
    let content = fs::read_to_string(file)?;
    let source = Document::new(content).with_metadata("source", file.display().to_string());

    let chunks = CharacterSplitter::new().split_document(&source, &config.chunking)?;
    info!("Split {} into {} chunks", file.display(), chunks.len());
    Ok(chunks)
}

fn split(file: &Path, config: &FaqConfig) -> Result<()> {
    let chunks = load_chunks(file, config)?;
    print_json(&chunks)
}

async fn search(query: &str, file: &Path, config: &FaqConfig, reorder: bool) -> Result<()> {
    let results = search_file(query, file, config, reorder).await?;
    print_json(&results)
}

/// Run the ensemble over a corpus file.
async fn search_file(
    query: &str,
    file: &Path,
    config: &FaqConfig,
    reorder: bool,
) -> Result<SearchResults> {
    config.validate()?;
    let chunks = load_chunks(file, config)?;

    // Vector and multi-query backends need external embedding and language
    // model services; only the lexical retriever is built locally.
    let set = RetrieverSet {
        lexical: Some(Arc::new(Bm25Retriever::from_documents(chunks, &config.lexical))),
        ..RetrieverSet::default()
    };

    let ensemble = EnsembleRetriever::from_config(&config.ensemble, set)?;
    let engine = QueryEngine::new(ensemble).with_reorder(reorder);

    engine.search(query).await
}

fn fuse(input: &Path, rank_bias: f64, limit: Option<usize>, reorder: bool) -> Result<()> {
    let output = fuse_file(input, rank_bias, limit, reorder)?;
    print_json(&output)
}

/// Fuse the ranked lists stored in a JSON file.
fn fuse_file(input: &Path, rank_bias: f64, limit: Option<usize>, reorder: bool) -> Result<FuseOutput> {
    let content = fs::read_to_string(input)?;
    let lists: Vec<WeightedList> = serde_json::from_str(&content)?;
    if lists.is_empty() {
        return Err(FaqError::invalid_argument("input contains no ranked lists"));
    }

    for list in &lists {
        info!(
            "List '{}' (weight {}) has {} documents",
            list.name.as_deref().unwrap_or("unnamed"),
            list.weight,
            list.documents.len()
        );
    }

    let pairs: Vec<(Vec<Document>, f64)> = lists
        .into_iter()
        .map(|list| (list.documents, list.weight))
        .collect();

    let results = RankFusionEngine::new(rank_bias)?.fuse_scored(&pairs, limit)?;
    let documents: Vec<Document> = results.iter().map(|s| s.document.clone()).collect();
    let context = if reorder {
        long_context_reorder(documents)
    } else {
        documents
    };

    Ok(FuseOutput { results, context })
}
