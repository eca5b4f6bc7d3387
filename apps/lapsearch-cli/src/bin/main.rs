use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use lapsearch_core::catalog::Catalog;
use lapsearch_core::config::{expand_path, Config, Settings};
use lapsearch_core::traits::CorpusSource;
use lapsearch_embed::{get_default_embedder, get_default_reranker};
use lapsearch_hybrid::{HybridSearchEngine, SearchResponse};
use lapsearch_query::RegexQueryParser;
use lapsearch_text::TfIdfRetriever;
use lapsearch_vector::{provision, LanceStore, ProvisionOptions, ProvisionOutcome};

/// Hybrid semantic + lexical search over a laptop catalog.
#[derive(Parser)]
#[command(name = "lapsearch", version, about)]
struct Cli {
    /// Read settings from this TOML file instead of config.toml + environment
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Enable debug logging (RUST_LOG takes precedence)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Create the vector index and load the catalog into it if it is empty
    Ingest {
        /// Catalog CSV (default: data.catalog_csv)
        #[arg(long)]
        csv: Option<PathBuf>,
    },
    /// Search the catalog
    Query {
        text: String,
        /// Results to show (default: search.rerank_top)
        #[arg(short = 'n', long)]
        limit: Option<usize>,
        /// Weight of the re-ranker score, 0..=1 (default: search.alpha)
        #[arg(long)]
        alpha: Option<f32>,
        /// Print the response as JSON
        #[arg(long)]
        json: bool,
    },
}

fn init_logging(verbose: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(if verbose { "debug" } else { "info" }));
    tracing_subscriber::fmt().with_env_filter(filter).with_target(false).with_writer(std::io::stderr).init();
}

fn load_settings(path: Option<&PathBuf>) -> Result<Settings> {
    let config = match path {
        Some(p) => Config::from_file(p),
        None => Config::load()?,
    };
    tracing::debug!(env = config.env_name(), "loaded configuration");
    Ok(config.settings()?)
}

fn load_catalog(settings: &Settings, csv: Option<PathBuf>) -> Result<Catalog> {
    let path = csv.unwrap_or_else(|| expand_path(&settings.data.catalog_csv));
    Ok(Catalog::from_csv_path(&path)?)
}

fn open_store(settings: &Settings) -> Result<LanceStore> {
    let uri = expand_path(&settings.index.uri);
    Ok(LanceStore::open(&uri.to_string_lossy(), &settings.index.table, settings.index.dimension)?)
}

fn ingest(settings: &Settings, csv: Option<PathBuf>) -> Result<()> {
    let catalog = load_catalog(settings, csv)?;
    let store = open_store(settings)?;
    let embedder = get_default_embedder(&settings.models, settings.index.dimension)?;
    let opts = ProvisionOptions { show_progress: true, ..ProvisionOptions::from(&settings.index) };
    match provision(&store, embedder.as_ref(), catalog.documents(), &opts)? {
        ProvisionOutcome::Created { loaded } => println!("Created index '{}' and inserted {} vectors.", settings.index.table, loaded),
        ProvisionOutcome::Loaded { loaded } => println!("Index was empty. Inserted {} vectors.", loaded),
        ProvisionOutcome::Skipped { existing } => println!("Index already populated ({} vectors). Skipping upsert.", existing),
    }
    Ok(())
}

fn print_human(response: &SearchResponse) {
    println!("\nStructured Query Sentence for Embedding: {}", response.query_sentence);
    if !response.is_relevant() {
        println!("\nNo relevant results found for your query. Please try a different search.");
        return;
    }
    println!("\nTop {} Hybrid Reranked Results:", response.results.len());
    for (i, r) in response.results.iter().enumerate() {
        println!("\nResult {}", i + 1);
        println!("Final Score: {:.4}", r.final_score);
        println!("Text: {}", r.text);
    }
}

fn query(settings: &Settings, text: &str, limit: Option<usize>, alpha: Option<f32>, json: bool) -> Result<()> {
    let catalog = load_catalog(settings, None)?;
    let engine = HybridSearchEngine::new(
        TfIdfRetriever,
        open_store(settings)?,
        get_default_embedder(&settings.models, settings.index.dimension)?,
        get_default_reranker(&settings.models)?,
        Box::new(RegexQueryParser::new()?),
        Arc::new(catalog),
        settings.search.clone(),
    );
    let mut opts = engine.default_options();
    if let Some(n) = limit { opts = opts.with_limit(n); }
    if let Some(a) = alpha { opts = opts.with_alpha(a); }
    let response = engine.search(text, &opts)?;
    if json {
        println!("{}", serde_json::to_string_pretty(&response)?);
    } else {
        print_human(&response);
    }
    Ok(())
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);
    let settings = load_settings(cli.config.as_ref())?;
    match cli.command {
        Command::Ingest { csv } => ingest(&settings, csv),
        Command::Query { text, limit, alpha, json } => query(&settings, &text, limit, alpha, json),
    }
}
