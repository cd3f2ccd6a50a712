//! Source discovery: mine search-engine result pages for candidate sources.
//!
//! Each configured engine's result page is fetched through the retrieval
//! client (same retry policy as the aggregation pipeline) and every
//! hyperlink in it is considered. A link survives when it parses as an
//! absolute URL, its hostname ends with an allowed TLD suffix, and the
//! hostname contains no denied substring; the deny list filters out the
//! engines' own navigation chrome and social share links.
//!
//! Surviving links get a display name derived from their hostname, a kind
//! (feed-looking paths become [`SourceKind::Feed`]), and a category from
//! keyword rules. Page candidates get the broad fallback selector set, since
//! their real per-site selectors are unknown at discovery time.
//!
//! Like aggregation, discovery never fails as a whole: a failing engine is
//! logged and skipped, and whatever the other engines produced is returned.

use itertools::Itertools;
use scraper::{Html, Selector};
use tokio::time::sleep;
use tracing::{info, instrument, warn};
use url::Url;

use crate::config::DiscoveryConfig;
use crate::fetch::RetrievalClient;
use crate::models::{NewsCategory, Source, SourceKind};
use crate::utils::upcase;

/// Query every configured search engine and return deduplicated candidate
/// sources. Pauses `engine_delay` between engines; this is a separate,
/// coarser rate limit than the aggregation pipeline's batching.
#[instrument(level = "info", skip_all, fields(engines = config.engines.len()))]
pub async fn discover(client: &RetrievalClient, config: &DiscoveryConfig) -> Vec<Source> {
    let mut candidates: Vec<Source> = Vec::new();

    for (engine_index, engine) in config.engines.iter().enumerate() {
        if engine_index > 0 {
            sleep(config.engine_delay()).await;
        }

        match client.fetch_document(&engine.url).await {
            Ok(document) => {
                let mined = mine_links(&document, config, candidates.len());
                info!(engine = %engine.name, count = mined.len(), "Mined candidate sources");
                candidates.extend(mined);
            }
            Err(e) => {
                warn!(engine = %engine.name, error = %e, "Discovery engine failed; skipping");
            }
        }
    }

    // Exact-URL dedup across all engines; the first occurrence wins.
    let unique: Vec<Source> = candidates.into_iter().unique_by(|s| s.url.clone()).collect();
    info!(count = unique.len(), "Source discovery complete");
    unique
}

/// Scan every hyperlink in a result document and build candidate sources.
/// `id_offset` keeps ids unique across engines within one run.
fn mine_links(document: &str, config: &DiscoveryConfig, id_offset: usize) -> Vec<Source> {
    let anchor_sel = Selector::parse("a[href]").unwrap();
    let html = Html::parse_document(document);
    let mut sources = Vec::new();

    for element in html.select(&anchor_sel) {
        let Some(href) = element.value().attr("href") else {
            continue;
        };
        let Some(parsed) = validate_candidate_url(href, config) else {
            continue;
        };
        let Some(name) = derive_name(&parsed) else {
            continue;
        };

        let kind = classify_kind(&parsed);
        let category = classify_category(&config.category_rules, href, &name);
        let selectors = match kind {
            SourceKind::Page => Some(config.fallback_selectors.clone()),
            SourceKind::Feed => None,
        };

        sources.push(Source {
            id: format!("discovered-{}", id_offset + sources.len()),
            name,
            url: href.to_string(),
            kind,
            category,
            active: true,
            selectors,
        });
    }

    sources
}

/// Accept only absolute URLs on allowed TLDs whose host matches no deny entry.
fn validate_candidate_url(raw: &str, config: &DiscoveryConfig) -> Option<Url> {
    let parsed = Url::parse(raw).ok()?;
    let host = parsed.host_str()?;
    if !config.allowed_tlds.iter().any(|tld| host.ends_with(tld.as_str())) {
        return None;
    }
    if config.denied_hosts.iter().any(|denied| host.contains(denied.as_str())) {
        return None;
    }
    Some(parsed)
}

/// Derive a display name from the hostname: drop a leading "www.", take the
/// first dot-delimited label, title-case its hyphen-separated words.
/// Returns `None` when nothing name-like remains.
fn derive_name(url: &Url) -> Option<String> {
    let host = url.host_str()?;
    let label = host.strip_prefix("www.").unwrap_or(host).split('.').next()?;
    let name = label
        .split('-')
        .map(upcase)
        .filter(|word| !word.is_empty())
        .join(" ");
    if name.is_empty() { None } else { Some(name) }
}

/// Feed-looking URLs become feed sources; everything else is a page.
fn classify_kind(url: &Url) -> SourceKind {
    let path = url.path();
    if path.contains("/feed") || path.contains("/rss") || path.ends_with(".xml") {
        SourceKind::Feed
    } else {
        SourceKind::Page
    }
}

/// First category rule with a keyword hit in `"{url} {name}"` wins;
/// no hit means Industry.
fn classify_category(
    rules: &[crate::config::CategoryRule],
    url: &str,
    name: &str,
) -> NewsCategory {
    let content = format!("{url} {name}").to_lowercase();
    for rule in rules {
        if rule.keywords.iter().any(|k| content.contains(k.as_str())) {
            return rule.category;
        }
    }
    NewsCategory::Industry
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::FetchConfig;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn config() -> DiscoveryConfig {
        DiscoveryConfig::default()
    }

    #[test]
    fn test_feed_link_classified_as_research_feed() {
        let sources = mine_links(
            r#"<a href="https://airesearch.org/feed">AI Research</a>"#,
            &config(),
            0,
        );
        assert_eq!(sources.len(), 1);
        let candidate = &sources[0];
        assert_eq!(candidate.name, "Airesearch");
        assert_eq!(candidate.kind, SourceKind::Feed);
        assert_eq!(candidate.category, NewsCategory::Research);
        assert!(candidate.selectors.is_none());
    }

    #[test]
    fn test_search_engine_links_rejected_regardless_of_path() {
        let sources = mine_links(
            r#"<a href="https://www.google.com/search?q=ai+research+feed">more</a>"#,
            &config(),
            0,
        );
        assert!(sources.is_empty());
    }

    #[test]
    fn test_relative_and_off_tld_links_rejected() {
        let html = r#"
            <a href="/relative/path">nav</a>
            <a href="https://example.dev/news">wrong tld</a>
        "#;
        assert!(mine_links(html, &config(), 0).is_empty());
    }

    #[test]
    fn test_hyphenated_hostname_title_cased() {
        let sources = mine_links(
            r#"<a href="https://www.ai-news-hub.com/latest">hub</a>"#,
            &config(),
            0,
        );
        assert_eq!(sources.len(), 1);
        assert_eq!(sources[0].name, "Ai News Hub");
        assert_eq!(sources[0].kind, SourceKind::Page);
        // Page candidates carry the generic fallback selectors.
        assert!(sources[0].selectors.is_some());
    }

    #[test]
    fn test_category_rules_checked_in_order() {
        let cfg = config();
        assert_eq!(
            classify_category(&cfg.category_rules, "https://aipolicy.org", "Aipolicy"),
            NewsCategory::Ethics
        );
        assert_eq!(
            classify_category(
                &cfg.category_rules,
                "https://applied-ml.io/implementation",
                "Applied Ml"
            ),
            NewsCategory::Applications
        );
        assert_eq!(
            classify_category(&cfg.category_rules, "https://ainews.com", "Ainews"),
            NewsCategory::Industry
        );
    }

    #[test]
    fn test_xml_suffix_is_feed() {
        let url = Url::parse("https://example.com/exports/news.xml").unwrap();
        assert_eq!(classify_kind(&url), SourceKind::Feed);
        let url = Url::parse("https://example.com/rss").unwrap();
        assert_eq!(classify_kind(&url), SourceKind::Feed);
        let url = Url::parse("https://example.com/articles").unwrap();
        assert_eq!(classify_kind(&url), SourceKind::Page);
    }

    fn test_discovery_config(server_uri: &str) -> (FetchConfig, DiscoveryConfig) {
        let fetch = FetchConfig {
            relays: vec![],
            timeout_secs: 5,
            max_retries: 0,
            base_delay_ms: 1,
            min_body_bytes: 0,
        };
        let discovery = DiscoveryConfig {
            engines: vec![
                crate::config::SearchEngine {
                    name: "one".to_string(),
                    url: format!("{server_uri}/engine-one"),
                },
                crate::config::SearchEngine {
                    name: "two".to_string(),
                    url: format!("{server_uri}/engine-two"),
                },
            ],
            engine_delay_ms: 1,
            ..DiscoveryConfig::default()
        };
        (fetch, discovery)
    }

    #[tokio::test]
    async fn test_dedup_across_engines_first_occurrence_wins() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/engine-one"))
            .respond_with(ResponseTemplate::new(200).set_body_string(
                r#"<a href="https://airesearch.org/feed">a</a>
                   <a href="https://ml-daily.com/news">b</a>"#,
            ))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/engine-two"))
            .respond_with(ResponseTemplate::new(200).set_body_string(
                r#"<a href="https://airesearch.org/feed">same again</a>"#,
            ))
            .mount(&server)
            .await;

        let (fetch, discovery) = test_discovery_config(&server.uri());
        let client = RetrievalClient::new(fetch).unwrap();
        let sources = discover(&client, &discovery).await;

        assert_eq!(sources.len(), 2);
        let urls: Vec<&str> = sources.iter().map(|s| s.url.as_str()).collect();
        assert_eq!(
            urls,
            vec!["https://airesearch.org/feed", "https://ml-daily.com/news"]
        );
        // No two candidates share a URL.
        assert_eq!(
            sources.iter().map(|s| &s.url).unique().count(),
            sources.len()
        );
    }

    #[tokio::test]
    async fn test_failing_engine_is_skipped() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/engine-one"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/engine-two"))
            .respond_with(ResponseTemplate::new(200).set_body_string(
                r#"<a href="https://ml-daily.com/news">b</a>"#,
            ))
            .mount(&server)
            .await;

        let (fetch, discovery) = test_discovery_config(&server.uri());
        let client = RetrievalClient::new(fetch).unwrap();
        let sources = discover(&client, &discovery).await;

        assert_eq!(sources.len(), 1);
        assert_eq!(sources[0].url, "https://ml-daily.com/news");
    }
}
