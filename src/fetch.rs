//! Relay-routed document retrieval with exponential backoff retry logic.
//!
//! Origin sites block cross-origin and datacenter traffic aggressively, so
//! every request is forwarded through a rotating pool of third-party relay
//! endpoints: attempt `k` routes through relay `k mod N`, so repeated
//! failures rotate relays rather than hammering one. Requests carry a
//! browser-like header set to reduce origin-side blocking.
//!
//! # Retry Strategy
//!
//! - Up to 5 retry attempts after the first failure
//! - Delay before retry `k` is `base_delay * 1.5^k` (base 1 second)
//! - 30 second hard timeout per attempt
//! - Non-200 statuses and bodies under 500 bytes count as failed attempts
//!
//! All of those numbers are [`FetchConfig`](crate::config::FetchConfig)
//! fields, not constants.

use once_cell::sync::Lazy;
use reqwest::header::{self, HeaderMap, HeaderValue};
use reqwest::{Client, StatusCode, redirect};
use tokio::time::sleep;
use tracing::{debug, error, instrument, warn};

use crate::config::FetchConfig;
use crate::error::RetrievalError;
use crate::utils::truncate_for_log;

/// Header set mimicking a desktop browser.
static BROWSER_HEADERS: Lazy<HeaderMap> = Lazy::new(|| {
    let mut headers = HeaderMap::new();
    headers.insert(
        header::USER_AGENT,
        HeaderValue::from_static(
            "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 \
             (KHTML, like Gecko) Chrome/91.0.4472.124 Safari/537.36",
        ),
    );
    headers.insert(
        header::ACCEPT,
        HeaderValue::from_static("text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8"),
    );
    headers.insert(
        header::ACCEPT_LANGUAGE,
        HeaderValue::from_static("en-US,en;q=0.5"),
    );
    headers.insert(header::CACHE_CONTROL, HeaderValue::from_static("no-cache"));
    headers.insert(header::PRAGMA, HeaderValue::from_static("no-cache"));
    headers.insert(
        header::REFERER,
        HeaderValue::from_static("https://www.google.com"),
    );
    headers
});

/// Pick the relay endpoint for a given attempt index.
///
/// Stateless: rotation is purely `attempt % relays.len()`. Returns `None`
/// for an empty relay list, which callers treat as "fetch directly".
pub fn relay_for(relays: &[String], attempt: usize) -> Option<&str> {
    if relays.is_empty() {
        None
    } else {
        Some(relays[attempt % relays.len()].as_str())
    }
}

/// HTTP client wrapping the relay pool and retry policy.
///
/// Purely functional from the caller's perspective: `fetch_document` either
/// returns the body text or a [`RetrievalError`] after exhausting retries,
/// with no other side effects.
pub struct RetrievalClient {
    http: Client,
    config: FetchConfig,
}

impl RetrievalClient {
    /// Build a client with the configured policy and a redirect cap of 5.
    pub fn new(config: FetchConfig) -> Result<Self, RetrievalError> {
        let http = Client::builder()
            .redirect(redirect::Policy::limited(5))
            .build()
            .map_err(RetrievalError::Client)?;
        Ok(RetrievalClient { http, config })
    }

    /// Fetch the document at `url`, retrying with exponential backoff and
    /// relay rotation until success or retries are exhausted.
    #[instrument(level = "info", skip(self), fields(%url))]
    pub async fn fetch_document(&self, url: &str) -> Result<String, RetrievalError> {
        let mut attempt = 0usize;

        loop {
            match self.attempt_fetch(url, attempt).await {
                Ok(body) => {
                    debug!(attempt, bytes = body.len(), "Fetched document");
                    return Ok(body);
                }
                Err(e) => {
                    if attempt >= self.config.max_retries {
                        error!(
                            attempt,
                            max = self.config.max_retries,
                            error = %e,
                            "fetch_document exhausted retries"
                        );
                        return Err(e);
                    }

                    // backoff calc
                    let delay = self.config.base_delay().mul_f64(1.5f64.powi(attempt as i32));
                    warn!(
                        attempt,
                        max = self.config.max_retries,
                        ?delay,
                        error = %e,
                        "fetch attempt failed; backing off"
                    );
                    sleep(delay).await;
                    attempt += 1;
                }
            }
        }
    }

    /// One GET through the relay chosen for this attempt index.
    async fn attempt_fetch(&self, url: &str, attempt: usize) -> Result<String, RetrievalError> {
        let request_url = match relay_for(&self.config.relays, attempt) {
            Some(relay) => format!("{relay}{}", urlencoding::encode(url)),
            None => url.to_string(),
        };

        let response = self
            .http
            .get(&request_url)
            .headers(BROWSER_HEADERS.clone())
            .timeout(self.config.timeout())
            .send()
            .await
            .map_err(|e| RetrievalError::Request {
                url: url.to_string(),
                source: e,
            })?;

        let status = response.status();
        if status != StatusCode::OK {
            return Err(RetrievalError::Status {
                status: status.as_u16(),
                url: url.to_string(),
            });
        }

        let body = response.text().await.map_err(|e| RetrievalError::Request {
            url: url.to_string(),
            source: e,
        })?;

        if body.len() < self.config.min_body_bytes {
            debug!(
                bytes = body.len(),
                preview = %truncate_for_log(&body, 120),
                "Body below minimum size; treating as relay error page"
            );
            return Err(RetrievalError::UndersizedBody {
                url: url.to_string(),
                bytes: body.len(),
            });
        }

        Ok(body)
    }
}
