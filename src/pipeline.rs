//! The source-aggregation pipeline: fetch, extract, stamp, merge, sort.
//!
//! Active sources are processed in fixed-size batches. Within a batch every
//! source runs concurrently; between batches the pipeline pauses for a
//! configured delay. The batch size and delay bound the number of
//! simultaneous outbound relay requests. They are rate-limiting policy, not
//! a performance tunable.
//!
//! Failures are isolated per source: a source whose fetch or extraction fails
//! (or extracts zero records) is logged and contributes nothing, without
//! aborting its batch or the run. `aggregate` itself never fails; an empty
//! result means "no successful sources", not a hard error.

use std::future::Future;
use std::time::Duration;

use futures::future::join_all;
use tokio::time::sleep;
use tracing::{debug, info, instrument, warn};

use crate::config::AppConfig;
use crate::error::SourceAggregationError;
use crate::extract;
use crate::fetch::RetrievalClient;
use crate::impact;
use crate::models::{Article, Source};

/// Run `operation` over `items` in fixed-size groups: each group runs
/// concurrently to completion, then the scheduler pauses for `delay` before
/// starting the next. Results come back in item order.
async fn in_batches<'a, T, F, Fut, R>(
    items: &'a [T],
    batch_size: usize,
    delay: Duration,
    operation: F,
) -> Vec<R>
where
    F: Fn(&'a T) -> Fut,
    Fut: Future<Output = R> + 'a,
{
    let batch_size = batch_size.max(1);
    let batch_count = items.len().div_ceil(batch_size);
    let mut results = Vec::with_capacity(items.len());

    for (batch_index, batch) in items.chunks(batch_size).enumerate() {
        if batch_index > 0 {
            sleep(delay).await;
        }
        debug!(
            batch = batch_index + 1,
            of = batch_count,
            size = batch.len(),
            "Processing batch"
        );
        results.extend(join_all(batch.iter().map(&operation)).await);
    }

    results
}

/// Run one aggregation pass over `sources`.
///
/// Returns every extracted article, stamped with its source snapshot and
/// impact verdict, sorted descending by date (most recent first). The sort
/// happens once, globally, after all batches complete.
#[instrument(level = "info", skip_all, fields(sources = sources.len()))]
pub async fn aggregate(
    client: &RetrievalClient,
    config: &AppConfig,
    sources: &[Source],
) -> Vec<Article> {
    let active: Vec<&Source> = sources.iter().filter(|s| s.active).collect();
    if active.is_empty() {
        info!("No active sources; nothing to aggregate");
        return Vec::new();
    }

    let results = in_batches(
        &active,
        config.batch_size,
        config.batch_delay(),
        |source| collect_source(client, config, source),
    )
    .await;

    let mut articles: Vec<Article> = Vec::new();
    let mut failed_sources = 0usize;
    for result in results {
        match result {
            Ok(mut from_source) => articles.append(&mut from_source),
            Err(e) => {
                failed_sources += 1;
                warn!(source = %e.source_name, error = %e, "Source contributed no articles");
            }
        }
    }

    articles.sort_by(|a, b| b.date.cmp(&a.date));

    info!(
        active = active.len(),
        failed = failed_sources,
        articles = articles.len(),
        "Aggregation run complete"
    );
    articles
}

/// Fetch and extract one source, stamping raw records into final articles.
///
/// Zero extracted records is reported as a source-level failure so the caller
/// logs it. A source contributes all of its records or none.
async fn collect_source(
    client: &RetrievalClient,
    config: &AppConfig,
    source: &Source,
) -> Result<Vec<Article>, SourceAggregationError> {
    let document = client
        .fetch_document(&source.url)
        .await
        .map_err(|e| SourceAggregationError::new(&source.name, e))?;

    let raw = extract::extract(&document, source)
        .map_err(|e| SourceAggregationError::new(&source.name, e))?;

    if raw.is_empty() {
        return Err(SourceAggregationError::new(
            &source.name,
            "no articles extracted",
        ));
    }

    Ok(raw
        .into_iter()
        .enumerate()
        .map(|(position, record)| {
            let impactful =
                impact::is_global_impact(&config.impact_terms, &record.title, &record.description);
            Article::from_raw(record, source, position, impactful)
        })
        .collect())
}
