//! JSON snapshot files for external consumers.
//!
//! Each run writes into a directory named for the local date, so repeated
//! runs on the same day overwrite that day's snapshot and days stay
//! separated. The files are the contract with any presentation layer:
//! it reads them, filters/slices for display, and never writes back.

use std::error::Error;

use tokio::fs;
use tracing::{error, info, instrument};

use crate::models::{Feed, Source};

/// Write the aggregated feed to `{output_dir}/{local_date}/feed.json`.
#[instrument(level = "info", skip_all, fields(output_dir = %output_dir))]
pub async fn write_feed(feed: &Feed, output_dir: &str) -> Result<(), Box<dyn Error>> {
    let json = serde_json::to_string(feed)?;
    let dir = format!("{}/{}", output_dir, feed.local_date);

    if let Err(e) = fs::create_dir_all(&dir).await {
        error!(%dir, error = %e, "Failed to create output dir");
        return Err(e.into());
    }

    let path = format!("{dir}/feed.json");
    fs::write(&path, json).await?;
    info!(%path, articles = feed.articles.len(), "Wrote feed JSON");
    Ok(())
}

/// Write discovered candidate sources to
/// `{output_dir}/{local_date}/sources.json`.
#[instrument(level = "info", skip_all, fields(output_dir = %output_dir))]
pub async fn write_sources(
    sources: &[Source],
    local_date: &str,
    output_dir: &str,
) -> Result<(), Box<dyn Error>> {
    let json = serde_json::to_string(sources)?;
    let dir = format!("{output_dir}/{local_date}");

    if let Err(e) = fs::create_dir_all(&dir).await {
        error!(%dir, error = %e, "Failed to create output dir");
        return Err(e.into());
    }

    let path = format!("{dir}/sources.json");
    fs::write(&path, json).await?;
    info!(%path, count = sources.len(), "Wrote discovered sources JSON");
    Ok(())
}
