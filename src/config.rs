//! Configuration loading and built-in defaults.
//!
//! Every policy knob in the pipeline lives here rather than in the algorithms
//! that consume it: relay endpoints, retry/backoff parameters, batch size and
//! inter-batch delay, the global-impact keyword list, and source discovery's
//! engine list and allow/deny lists. Defaults reproduce the production
//! values; a YAML file passed via `--config` may override any subset.
//!
//! The seed source list (used when no `--sources` file is given) also lives
//! here, alongside a loader that validates source-list invariants: unique
//! ids and syntactically valid absolute URLs.

use std::collections::HashSet;
use std::error::Error;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::info;
use url::Url;

use crate::models::{NewsCategory, SelectorSet, Source, SourceKind};

/// Retrieval client policy.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct FetchConfig {
    /// Ordered relay endpoints; attempt `k` routes through `relays[k % len]`.
    /// An empty list means requests go directly to the target URL.
    pub relays: Vec<String>,
    /// Hard per-attempt timeout.
    pub timeout_secs: u64,
    /// Retries after the first attempt fails.
    pub max_retries: usize,
    /// Base backoff delay; the wait before retry `k` is `base * 1.5^k`.
    pub base_delay_ms: u64,
    /// Bodies under this size are treated as relay error pages.
    pub min_body_bytes: usize,
}

impl Default for FetchConfig {
    fn default() -> Self {
        FetchConfig {
            relays: vec![
                "https://api.allorigins.win/raw?url=".to_string(),
                "https://corsproxy.io/?".to_string(),
                "https://api.codetabs.com/v1/proxy?quest=".to_string(),
                "https://cors-anywhere.herokuapp.com/".to_string(),
                "https://cors.bridged.cc/".to_string(),
            ],
            timeout_secs: 30,
            max_retries: 5,
            base_delay_ms: 1000,
            min_body_bytes: 500,
        }
    }
}

impl FetchConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn base_delay(&self) -> Duration {
        Duration::from_millis(self.base_delay_ms)
    }
}

/// One search engine queried during source discovery.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SearchEngine {
    pub name: String,
    pub url: String,
}

/// Maps keyword hits in a candidate's URL+name to a topic category.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct CategoryRule {
    pub category: NewsCategory,
    pub keywords: Vec<String>,
}

/// Source discovery policy: engines to mine and link validation lists.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct DiscoveryConfig {
    /// Queried in order; ordering makes first-occurrence dedup reproducible.
    pub engines: Vec<SearchEngine>,
    /// Pause between engines, coarser than the aggregation batch delay.
    pub engine_delay_ms: u64,
    /// A candidate hostname must end with one of these suffixes.
    pub allowed_tlds: Vec<String>,
    /// A candidate hostname must contain none of these substrings. Covers the
    /// engines' own navigation chrome and social share links.
    pub denied_hosts: Vec<String>,
    /// Checked in order against a candidate's URL+name; first hit wins.
    /// Candidates matching no rule default to Industry.
    pub category_rules: Vec<CategoryRule>,
    /// Broad selectors assigned to discovered page sources, whose real
    /// per-site selectors are unknown at discovery time.
    pub fallback_selectors: SelectorSet,
}

impl Default for DiscoveryConfig {
    fn default() -> Self {
        DiscoveryConfig {
            engines: vec![
                SearchEngine {
                    name: "google".to_string(),
                    url: "https://www.google.com/search?q=artificial+intelligence+news"
                        .to_string(),
                },
                SearchEngine {
                    name: "bing".to_string(),
                    url: "https://www.bing.com/search?q=artificial+intelligence+news"
                        .to_string(),
                },
                SearchEngine {
                    name: "duckduckgo".to_string(),
                    url: "https://duckduckgo.com/?q=artificial+intelligence+news".to_string(),
                },
            ],
            engine_delay_ms: 2000,
            allowed_tlds: [".com", ".org", ".net", ".edu", ".gov", ".io"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
            denied_hosts: ["google", "bing", "duckduckgo", "facebook", "twitter"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
            category_rules: vec![
                CategoryRule {
                    category: NewsCategory::Research,
                    keywords: ["research", "science", "study"]
                        .iter()
                        .map(|s| s.to_string())
                        .collect(),
                },
                CategoryRule {
                    category: NewsCategory::Ethics,
                    keywords: ["ethics", "policy"].iter().map(|s| s.to_string()).collect(),
                },
                CategoryRule {
                    category: NewsCategory::Applications,
                    keywords: ["application", "implementation"]
                        .iter()
                        .map(|s| s.to_string())
                        .collect(),
                },
            ],
            fallback_selectors: SelectorSet {
                title: "article h1, article h2, .article-title, .entry-title".to_string(),
                description: "article p, .article-content, .entry-content".to_string(),
                date: "time, .date, .published, .post-date".to_string(),
                image: "article img, .featured-image, .post-thumbnail".to_string(),
            },
        }
    }
}

impl DiscoveryConfig {
    pub fn engine_delay(&self) -> Duration {
        Duration::from_millis(self.engine_delay_ms)
    }
}

/// Top-level application configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct AppConfig {
    pub fetch: FetchConfig,
    /// Sources fetched concurrently per batch.
    pub batch_size: usize,
    /// Pause between batches. Together with `batch_size` this is the rate
    /// limit protecting the relays, not a performance tunable.
    pub batch_delay_ms: u64,
    /// Terms whose presence in title+description marks an article as
    /// globally impactful.
    pub impact_terms: Vec<String>,
    pub discovery: DiscoveryConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        AppConfig {
            fetch: FetchConfig::default(),
            batch_size: 3,
            batch_delay_ms: 1000,
            impact_terms: [
                "worldwide",
                "global",
                "breakthrough",
                "revolutionary",
                "milestone",
                "major advancement",
                "groundbreaking",
                "first-ever",
                "unprecedented",
                "transformation",
                "paradigm shift",
                "game-changing",
            ]
            .iter()
            .map(|s| s.to_string())
            .collect(),
            discovery: DiscoveryConfig::default(),
        }
    }
}

impl AppConfig {
    pub fn batch_delay(&self) -> Duration {
        Duration::from_millis(self.batch_delay_ms)
    }
}

/// Load configuration from a YAML file, or defaults when no path is given.
pub fn load_config(path: Option<&str>) -> Result<AppConfig, Box<dyn Error>> {
    match path {
        Some(p) => {
            let raw = std::fs::read_to_string(p)?;
            let config: AppConfig = serde_yaml::from_str(&raw)?;
            info!(path = p, "Loaded configuration");
            Ok(config)
        }
        None => Ok(AppConfig::default()),
    }
}

/// Load a source list from a YAML file and validate its invariants.
pub fn load_sources(path: &str) -> Result<Vec<Source>, Box<dyn Error>> {
    let raw = std::fs::read_to_string(path)?;
    let sources: Vec<Source> = serde_yaml::from_str(&raw)?;
    validate_sources(&sources)?;
    info!(path, count = sources.len(), "Loaded source list");
    Ok(sources)
}

/// Check that ids are unique and URLs parse as absolute URLs.
pub fn validate_sources(sources: &[Source]) -> Result<(), Box<dyn Error>> {
    let mut seen = HashSet::new();
    for source in sources {
        if !seen.insert(source.id.as_str()) {
            return Err(format!("duplicate source id: {}", source.id).into());
        }
        Url::parse(&source.url)
            .map_err(|e| format!("source {} has invalid URL {}: {e}", source.id, source.url))?;
    }
    Ok(())
}

/// Built-in seed sources, used when no `--sources` file is supplied.
pub fn default_sources() -> Vec<Source> {
    vec![
        Source {
            id: "techcrunch-ai".to_string(),
            name: "TechCrunch AI".to_string(),
            url: "https://techcrunch.com/category/artificial-intelligence/".to_string(),
            kind: SourceKind::Page,
            category: NewsCategory::Industry,
            active: true,
            selectors: Some(SelectorSet {
                title: "h2.post-block__title a".to_string(),
                description: ".post-block__content".to_string(),
                date: "time.post-block__time".to_string(),
                image: ".post-block__media img".to_string(),
            }),
        },
        Source {
            id: "mit-ai".to_string(),
            name: "MIT AI News".to_string(),
            url: "https://news.mit.edu/topic/artificial-intelligence2".to_string(),
            kind: SourceKind::Page,
            category: NewsCategory::Research,
            active: true,
            selectors: Some(SelectorSet {
                title: ".term-page--news-article--item--title".to_string(),
                description: ".term-page--news-article--item--description".to_string(),
                date: ".term-page--news-article--item--date".to_string(),
                image: ".term-page--news-article--item--image img".to_string(),
            }),
        },
        Source {
            id: "wired-ai".to_string(),
            name: "WIRED AI".to_string(),
            url: "https://www.wired.com/tag/artificial-intelligence/".to_string(),
            kind: SourceKind::Page,
            category: NewsCategory::Industry,
            active: true,
            selectors: Some(SelectorSet {
                title: ".summary-item__hed".to_string(),
                description: ".summary-item__dek".to_string(),
                date: ".summary-item__timestamp".to_string(),
                image: ".summary-item__image img".to_string(),
            }),
        },
    ]
}
