use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};

use pagelens_cli::{document_name, export_outcome, load_index, log_filter, read_pages, save_index};
use pagelens_core::config::{check_smoothing, Config};
use pagelens_core::types::Aggregation;
use pagelens_embed::EmbeddingService;
use pagelens_search::{Chunker, PageSearch};

#[derive(Parser)]
#[command(name = "pagelens", about = "Score document pages against a free-text query", version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Chunk and embed page texts into an index file
    Ingest {
        /// Directory of .txt pages (numbered by natural file order, so page2 precedes page10),
        /// or one text file with form-feed page breaks
        input: PathBuf,

        /// Where to write the index JSON
        #[arg(short, long)]
        output: PathBuf,
    },

    /// Rank the pages of an index against a query
    Query {
        /// Index file written by `ingest`
        index: PathBuf,

        /// Query text
        text: String,

        /// Gaussian sigma over neighbouring pages (0 disables)
        #[arg(long)]
        smoothing: Option<f32>,

        /// Minimum smoothed score for a page to be reported
        #[arg(long)]
        threshold: Option<f32>,

        #[arg(short = 'k', long)]
        top_k: Option<usize>,

        /// Page aggregation: max or mean
        #[arg(long)]
        aggregation: Option<Aggregation>,

        /// Also write <base>.json and <base>.csv
        #[arg(long)]
        export: Option<PathBuf>,
    },

    /// Show which embedding backend is active
    Backend,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(log_filter())
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = Config::load().map_err(|e| {
        eprintln!("Error loading config: {e:#}");
        e
    })?;
    let settings = config.settings()?;
    let embeddings = EmbeddingService::build_default(&settings.embedding)?;

    match cli.command {
        Commands::Backend => {
            println!("backend: {}", embeddings.name());
            println!("dim: {}", embeddings.dim());
        }
        Commands::Ingest { input, output } => {
            let pages = read_pages(&input)?;
            let search = PageSearch::new(embeddings, Chunker::from_settings(&settings.chunking)?);

            let pb = ProgressBar::new(pages.len() as u64);
            pb.set_style(
                ProgressStyle::default_bar()
                    .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} pages ({percent}%) {msg}")?
                    .progress_chars("#>-"),
            );
            let index = search.ingest_with_progress(&document_name(&input), &pages, |_| pb.inc(1))?;
            pb.finish_with_message("done");

            save_index(&index, &output)?;
            println!(
                "Ingested {} pages ({} chunks) with backend '{}' into {}",
                index.page_count(),
                index.chunk_count(),
                index.backend,
                output.display()
            );
        }
        Commands::Query { index, text, smoothing, threshold, top_k, aggregation, export } => {
            let mut params = settings.query.clone();
            if let Some(v) = smoothing {
                params.smoothing = v;
            }
            if let Some(v) = threshold {
                params.threshold = v;
            }
            if let Some(v) = top_k {
                params.top_k = v;
            }
            if let Some(v) = aggregation {
                params.aggregation = v;
            }
            anyhow::ensure!(params.top_k > 0, "--top-k must be positive");
            anyhow::ensure!(params.threshold.is_finite(), "--threshold must be finite");
            check_smoothing(params.smoothing)?;

            let document = load_index(&index)?;
            let search = PageSearch::new(embeddings, Chunker::from_settings(&settings.chunking)?);
            let outcome = search.query(&text, &document, &params)?;
            println!("{}", serde_json::to_string_pretty(&outcome)?);

            if let Some(base) = export {
                let (json, csv) = export_outcome(&outcome, &base)?;
                eprintln!("Exported {} and {}", json.display(), csv.display());
            }
        }
    }
    Ok(())
}
