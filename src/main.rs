use std::path::PathBuf;

use anyhow::Result;
use chrono::Utc;
use clap::{Parser, Subcommand};
use colored::Colorize;
use tracing::info;

use mosaic::config::Config;
use mosaic::correlation::cluster::ClusterStrategy;
use mosaic::correlation::Correlator;
use mosaic::entities::create_extractor;
use mosaic::output::report::IntelligenceReport;
use mosaic::output::terminal;

/// Mosaic: groups near-duplicate intelligence stories into threads.
///
/// Reads a batch of collected stories, extracts entities and keywords,
/// clusters stories that describe the same event, and lists the entities
/// that connect stories across clusters.
#[derive(Parser)]
#[command(name = "mosaic", version, about)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Correlate a JSON batch of stories
    Correlate {
        /// Path to a JSON array of stories
        input: PathBuf,

        /// Minimum similarity to join a cluster (overrides MOSAIC_SIMILARITY_THRESHOLD)
        #[arg(long)]
        threshold: Option<f64>,

        /// Clustering strategy: greedy or components
        #[arg(long)]
        strategy: Option<ClusterStrategy>,

        /// Split clusters larger than this (overrides MOSAIC_MAX_CLUSTER_SIZE)
        #[arg(long)]
        max_cluster_size: Option<usize>,

        /// Keywords kept per story (overrides MOSAIC_KEYWORD_COUNT)
        #[arg(long)]
        keywords: Option<usize>,

        /// Write the JSON intelligence report to this path
        #[arg(long)]
        json: Option<PathBuf>,

        /// Also show and report single-story clusters
        #[arg(long)]
        include_singletons: bool,
    },

    /// Show the entities and keywords extracted from a piece of text
    Extract {
        /// Body text to analyze
        text: String,

        /// Optional title (weighted higher for keywords)
        #[arg(long, default_value = "")]
        title: String,
    },
}

fn main() -> Result<()> {
    // Load .env file if present (silently ignore if missing)
    let _ = dotenvy::dotenv();

    // Set up structured logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("mosaic=info")),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Correlate {
            input,
            threshold,
            strategy,
            max_cluster_size,
            keywords,
            json,
            include_singletons,
        } => {
            let mut config = Config::load()?;
            if let Some(threshold) = threshold {
                config.similarity_threshold = threshold;
            }
            if let Some(strategy) = strategy {
                config.strategy = strategy;
            }
            if max_cluster_size.is_some() {
                config.max_cluster_size = max_cluster_size;
            }
            if let Some(keywords) = keywords {
                config.keyword_count = keywords;
            }
            let config = config.validated();

            let stories = mosaic::stories::load_batch(&input)?;
            info!(stories = stories.len(), path = %input.display(), "Loaded story batch");

            let extractor = create_extractor(
                config.extractor_backend,
                config.dictionary()?,
                &config.model_dir,
            )?;
            let correlator = Correlator::new(
                extractor,
                config.keyword_extractor(),
                config.correlation_settings(),
            );
            let run = correlator.run(stories)?;

            terminal::display_clusters(&run, include_singletons);
            terminal::display_connections(&run);

            if let Some(path) = json {
                let report = IntelligenceReport::build(&run, include_singletons, Utc::now());
                report.write_json(&path)?;
                println!("{} {}", "Report written to".bold(), path.display());
            }
        }

        Commands::Extract { text, title } => {
            let config = Config::load()?.validated();
            let extractor = create_extractor(
                config.extractor_backend,
                config.dictionary()?,
                &config.model_dir,
            )?;
            let entities = extractor.extract(&title, &text)?;
            let keywords = config.keyword_extractor().extract(&title, &text);
            terminal::display_extraction(&entities, &keywords);
        }
    }

    Ok(())
}
