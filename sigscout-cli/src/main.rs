//! sigscout CLI
//!
//! Procurement signal enrichment from whitelisted public web sources.

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing::Level;
use tracing_subscriber::FmtSubscriber;

use sigscout_core::Request;
use sigscout_engine::{Engine, EngineConfig};
use sigscout_sources::DiscoveryConfig;

#[derive(Parser)]
#[command(name = "sigscout")]
#[command(author, version, about = "Procurement signal enrichment engine", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Verbosity level (0-3)
    #[arg(short, long, default_value = "1")]
    verbose: u8,

    /// Engine configuration file (TOML)
    #[arg(short, long)]
    config: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Run an enrichment request and print the response as JSON
    Enrich {
        /// Project site/location identifier
        #[arg(short, long)]
        site: String,

        /// Materials to track, comma-separated (e.g. Steel,Concrete)
        #[arg(short, long, default_value = "")]
        materials: String,

        /// Geographic region (e.g. Maharashtra)
        #[arg(short, long)]
        region: Option<String>,

        /// Time window in days (1-365)
        #[arg(long, default_value = "30")]
        window: u32,

        /// Minimum relevance score for a signal to be kept
        #[arg(long, default_value = "0.3")]
        min_relevance: f64,

        /// Serve a deterministic synthetic signal set, no network I/O
        #[arg(long)]
        mock: bool,

        /// Also query the discovery search service
        #[arg(long)]
        discovery: bool,

        /// Bypass the local fetch cache
        #[arg(long)]
        no_cache: bool,

        /// Skip the scraping adapters
        #[arg(long)]
        no_scrapers: bool,

        /// Search API key (or set GOOGLE_CSE_API_KEY env var)
        #[arg(long, env = "GOOGLE_CSE_API_KEY")]
        cse_key: Option<String>,

        /// Search engine id (or set GOOGLE_CSE_ID env var)
        #[arg(long, env = "GOOGLE_CSE_ID")]
        cse_id: Option<String>,
    },

    /// List registered source adapters
    Sources,

    /// Inspect or manage the fetch cache
    Cache {
        #[command(subcommand)]
        command: CacheCommands,
    },
}

#[derive(Subcommand)]
enum CacheCommands {
    /// Show entry count and size
    Stats,
    /// Drop every cached entry
    Clear,
    /// Remove one entry by its key
    Delete { key: String },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let log_level = match cli.verbose {
        0 => Level::ERROR,
        1 => Level::INFO,
        2 => Level::DEBUG,
        _ => Level::TRACE,
    };

    FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_target(false)
        .with_thread_ids(false)
        .compact()
        .init();

    let mut config = match &cli.config {
        Some(path) => EngineConfig::from_file(path)?,
        None => EngineConfig::default(),
    };

    match cli.command {
        Commands::Enrich {
            site,
            materials,
            region,
            window,
            min_relevance,
            mock,
            discovery,
            no_cache,
            no_scrapers,
            cse_key,
            cse_id,
        } => {
            // flags beat the config file for discovery credentials
            if let (Some(key), Some(id)) = (cse_key, cse_id) {
                config.discovery = Some(DiscoveryConfig::new(&key, &id));
            }
            let engine = Engine::new(config)?;

            let mut request = Request::new(&site, parse_materials(&materials));
            request.region = region;
            request.time_window_days = window;
            request.min_relevance = min_relevance;
            request.mock_mode = mock;
            request.use_discovery = discovery;
            request.use_cache = !no_cache;
            request.use_scrapers = !no_scrapers;

            let response = engine.enrich(&request).await?;
            println!("{}", serde_json::to_string_pretty(&response)?);
        }

        Commands::Sources => {
            let engine = Engine::new(config)?;
            println!("{}", serde_json::to_string_pretty(&engine.sources())?);
        }

        Commands::Cache { command } => {
            let engine = Engine::new(config)?;
            match command {
                CacheCommands::Stats => {
                    println!("{}", serde_json::to_string_pretty(&engine.cache_stats())?);
                }
                CacheCommands::Clear => {
                    let removed = engine.clear_cache();
                    println!("Removed {} cache entries", removed);
                }
                CacheCommands::Delete { key } => {
                    if engine.delete_cache_entry(&key) {
                        println!("Deleted {}", key);
                    } else {
                        println!("No entry for {}", key);
                    }
                }
            }
        }
    }

    Ok(())
}

fn parse_materials(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|m| m.trim())
        .filter(|m| !m.is_empty())
        .map(|m| m.to_string())
        .collect()
}
