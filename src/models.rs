//! Data models for news sources and extracted articles.
//!
//! This module defines the core data structures used throughout the application:
//! - [`Source`]: A configured origin (scraped page or syndication feed)
//! - [`SelectorSet`]: Per-source CSS extraction rules for page sources
//! - [`RawArticle`]: An article record as produced by the extractor
//! - [`Article`]: A finished record stamped with its source snapshot
//! - [`Feed`]: The chronologically ordered output of one aggregation run
//!
//! Articles reference their source by name/category *snapshot*, not by a live
//! reference, so toggling or replacing a source later never invalidates
//! already-produced records.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// How a source's document should be interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceKind {
    /// An HTML page scraped with the source's [`SelectorSet`].
    Page,
    /// An RSS or Atom syndication document.
    Feed,
}

/// Topic bucket a source (and its articles) belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
pub enum NewsCategory {
    Industry,
    Research,
    Ethics,
    Applications,
}

impl NewsCategory {
    /// Human-readable label, as shown to consumers of the feed.
    pub fn as_str(&self) -> &'static str {
        match self {
            NewsCategory::Industry => "Industry",
            NewsCategory::Research => "Research",
            NewsCategory::Ethics => "Ethics",
            NewsCategory::Applications => "Applications",
        }
    }
}

/// CSS extraction rules for one page source.
///
/// Each field is an opaque selector string meaningful only to the extractor.
/// The title selector locates candidate article nodes; the remaining three are
/// resolved within each matched article's container scope.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SelectorSet {
    pub title: String,
    pub description: String,
    pub date: String,
    pub image: String,
}

/// A named retrievable origin for news articles.
///
/// Sources come from the built-in seed list, a user-supplied YAML file, or
/// [source discovery](crate::discover). The pipeline only ever reads them;
/// the single mutation an embedding UI may perform is toggling `active`,
/// which the next aggregation run honors.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Source {
    /// Stable identifier, unique across the source list.
    pub id: String,
    /// Display name, copied onto every article extracted from this source.
    pub name: String,
    /// Absolute origin URL.
    pub url: String,
    pub kind: SourceKind,
    pub category: NewsCategory,
    /// Inactive sources are skipped by the aggregation pipeline.
    pub active: bool,
    /// Extraction rules; present only for [`SourceKind::Page`] sources.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub selectors: Option<SelectorSet>,
}

/// An article record as produced by the extractor, before stamping.
///
/// Title and description are guaranteed non-empty after trimming; records
/// failing that are dropped inside the extractor. An unparsable date has
/// already been replaced by the time of extraction.
#[derive(Debug, Clone)]
pub struct RawArticle {
    pub title: String,
    pub description: String,
    pub date: DateTime<Utc>,
    pub image_url: Option<String>,
}

/// One extracted news item, stamped with its originating source's snapshot.
///
/// Created per aggregation run and held only in memory for that run; each run
/// produces a fresh set with no update semantics.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Article {
    /// Unique within a single run: `{source id}-{position}`.
    pub id: String,
    pub title: String,
    pub description: String,
    pub date: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    /// Display name of the originating source at extraction time.
    pub source_name: String,
    pub category: NewsCategory,
    /// Keyword-heuristic verdict; computed, never user-settable.
    pub is_global_impact: bool,
}

impl Article {
    /// Stamp a raw record with its source snapshot and impact verdict.
    pub fn from_raw(
        raw: RawArticle,
        source: &Source,
        position: usize,
        is_global_impact: bool,
    ) -> Self {
        Article {
            id: format!("{}-{}", source.id, position),
            title: raw.title,
            description: raw.description,
            date: raw.date,
            image_url: raw.image_url,
            source_name: source.name.clone(),
            category: source.category,
            is_global_impact,
        }
    }
}

/// The serialized output of one aggregation run.
#[derive(Debug, Deserialize, Serialize)]
pub struct Feed {
    /// When this run finished, in UTC.
    pub generated_at: DateTime<Utc>,
    /// The local date used for output partitioning, `YYYY-MM-DD`.
    pub local_date: String,
    /// Articles sorted most recent first.
    pub articles: Vec<Article>,
}
