//! Error taxonomy for the fetch-and-extract pipeline.
//!
//! Three layers, matching where failures can occur:
//! - [`RetrievalError`]: the HTTP layer, surfaced only after all retries are
//!   exhausted. Carries the failing target URL.
//! - [`ExtractionError`]: the document could not be parsed into any structured
//!   form. Parsing successfully but matching zero articles is *not* an
//!   extraction error.
//! - [`SourceAggregationError`]: either of the above wrapped with the source's
//!   display name. This is the unit the pipeline logs and swallows; a single
//!   source or search engine failing never aborts a batch or a run.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum RetrievalError {
    #[error("GET {url} failed: {source}")]
    Request {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("unexpected HTTP status {status} for {url}")]
    Status { status: u16, url: String },

    /// Relay error pages can come back as 200s with a short apology body;
    /// anything under the configured floor is treated as a failed attempt.
    #[error("response body for {url} too small ({bytes} bytes)")]
    UndersizedBody { url: String, bytes: usize },

    #[error("failed to build HTTP client: {0}")]
    Client(reqwest::Error),
}

#[derive(Debug, Error)]
pub enum ExtractionError {
    #[error("invalid selector \"{selector}\": {reason}")]
    Selector { selector: String, reason: String },

    #[error("page source \"{id}\" has no selector set")]
    MissingSelectors { id: String },

    #[error("document is neither RSS nor Atom: {reason}")]
    Feed { reason: String },
}

/// A per-source failure, carrying the source's display name and the upstream
/// message. Produced for retrieval failures, extraction failures, and the
/// zero-records-extracted case.
#[derive(Debug, Error)]
#[error("failed to gather news from {source_name}: {message}")]
pub struct SourceAggregationError {
    pub source_name: String,
    pub message: String,
}

impl SourceAggregationError {
    pub fn new(source: &str, upstream: impl std::fmt::Display) -> Self {
        SourceAggregationError {
            source_name: source.to_string(),
            message: upstream.to_string(),
        }
    }
}
