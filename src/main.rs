//! # AI Newswire
//!
//! An AI-news aggregation pipeline that retrieves HTML pages and syndication
//! feeds from a configurable list of sources through rotating relay
//! endpoints, extracts structured article records with per-source CSS
//! selector rules, tags globally impactful items by keyword heuristic, and
//! merges everything into one chronologically ordered feed.
//!
//! ## Features
//!
//! - Selector-driven scraping of page sources and RSS/Atom parsing of feeds
//! - Relay rotation with exponential backoff retry per fetch
//! - Batched, failure-isolated aggregation across all active sources
//! - Search-engine mining for candidate new sources (`--discover`)
//! - Date-partitioned JSON snapshots for downstream presentation layers
//!
//! ## Usage
//!
//! ```sh
//! ai_newswire -o ./out --sources sources.yaml --discover
//! ```
//!
//! ## Architecture
//!
//! One run is a pipeline:
//! 1. **Load**: Read configuration and the source list (seeds by default)
//! 2. **Aggregate**: Fetch and extract all active sources in batches of 3
//! 3. **Discover** (optional): Mine search engines for new candidate sources
//! 4. **Output**: Write `feed.json` (and `sources.json`) under today's date

use chrono::{Local, Utc};
use clap::Parser;
use std::error::Error;
use tracing::{debug, error, info, warn};
use tracing_subscriber::{EnvFilter, fmt as tfmt};

mod cli;
mod config;
mod discover;
mod error;
mod extract;
mod fetch;
mod impact;
mod models;
mod outputs;
mod pipeline;
mod utils;

use cli::Cli;
use fetch::RetrievalClient;
use models::Feed;
use outputs::json;
use utils::ensure_writable_dir;

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    // --- Tracing init ---
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tfmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_file(false)
        .with_line_number(false)
        .with_timer(tracing_subscriber::fmt::time::UtcTime::rfc_3339())
        .init();

    let start_time = std::time::Instant::now();
    info!("ai_newswire starting up");

    // Parse CLI
    let args = Cli::parse();
    debug!(?args.output_dir, ?args.sources, ?args.config, args.discover, "Parsed CLI arguments");

    // Early check: ensure the output dir is writable
    if let Err(e) = ensure_writable_dir(&args.output_dir).await {
        error!(
            path = %args.output_dir,
            error = %e,
            "Output directory is not writable (fix perms or choose a different path)"
        );
        return Err(e);
    }

    // ---- Load configuration and sources ----
    let app_config = config::load_config(args.config.as_deref())?;
    let sources = match args.sources.as_deref() {
        Some(path) => config::load_sources(path)?,
        None => {
            info!("No source list given; using built-in seed sources");
            config::default_sources()
        }
    };
    let active_count = sources.iter().filter(|s| s.active).count();
    info!(
        total = sources.len(),
        active = active_count,
        "Source list ready"
    );

    let client = RetrievalClient::new(app_config.fetch.clone())?;

    // ---- Aggregate ----
    let articles = pipeline::aggregate(&client, &app_config, &sources).await;
    if articles.is_empty() {
        // Per-source failures are absorbed upstream, so this is the only
        // signal an operator gets that nothing came back at all.
        warn!("Aggregation produced no articles");
    }

    let local_date = Local::now().date_naive().to_string();
    let feed = Feed {
        generated_at: Utc::now(),
        local_date: local_date.clone(),
        articles,
    };

    if let Err(e) = json::write_feed(&feed, &args.output_dir).await {
        error!(error = %e, "Failed to write feed JSON");
        return Err(e);
    }

    // ---- Discover (optional) ----
    if args.discover {
        let candidates = discover::discover(&client, &app_config.discovery).await;
        if let Err(e) = json::write_sources(&candidates, &local_date, &args.output_dir).await {
            error!(error = %e, "Failed to write discovered sources JSON");
            return Err(e);
        }
    }

    let elapsed = start_time.elapsed();
    info!(
        ?elapsed,
        secs = elapsed.as_secs(),
        articles = feed.articles.len(),
        "Execution complete"
    );

    Ok(())
}
