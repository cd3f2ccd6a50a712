//! Document-to-article extraction for page and feed sources.
//!
//! Page sources are parsed with [`scraper`] and walked with the source's
//! [`SelectorSet`]. The title selector locates candidate article nodes; each
//! title's *container* is its nearest ancestor holding at least one match of
//! the description, date, or image selector (falling back to the title
//! element itself), and the remaining fields are resolved inside that
//! container's scope. This keeps fields paired per article even when the
//! selectors match different numbers of nodes across the page.
//!
//! Feed sources are parsed with `quick-xml`'s serde support: RSS 2.0 first,
//! then Atom. A document that parses as neither is an
//! [`ExtractionError::Feed`]; a document that parses but yields nothing is an
//! empty `Ok`, and the pipeline decides what zero records means.
//!
//! Records with an empty title or description after whitespace collapsing are
//! dropped. Unparsable dates fall back to the time of extraction rather than
//! failing the record.

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use once_cell::sync::Lazy;
use regex::Regex;
use scraper::{ElementRef, Html, Selector};
use serde::Deserialize;
use tracing::debug;

use crate::error::ExtractionError;
use crate::models::{RawArticle, SelectorSet, Source, SourceKind};
use crate::utils::collapse_whitespace;

/// Matches an ISO calendar date embedded in surrounding text, e.g.
/// "Published 2024-01-03 at noon".
static EMBEDDED_ISO_DATE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\d{4}-\d{2}-\d{2}").unwrap());

/// Extract raw article records from a fetched document.
pub fn extract(document: &str, source: &Source) -> Result<Vec<RawArticle>, ExtractionError> {
    let records = match source.kind {
        SourceKind::Page => {
            let selectors =
                source
                    .selectors
                    .as_ref()
                    .ok_or_else(|| ExtractionError::MissingSelectors {
                        id: source.id.clone(),
                    })?;
            extract_page(document, selectors)?
        }
        SourceKind::Feed => extract_feed(document)?,
    };
    debug!(source = %source.name, count = records.len(), "Extracted raw articles");
    Ok(records)
}

fn parse_selector(s: &str) -> Result<Selector, ExtractionError> {
    Selector::parse(s).map_err(|e| ExtractionError::Selector {
        selector: s.to_string(),
        reason: e.to_string(),
    })
}

/// Selector-driven extraction from an HTML page.
pub fn extract_page(
    document: &str,
    selectors: &SelectorSet,
) -> Result<Vec<RawArticle>, ExtractionError> {
    let title_sel = parse_selector(&selectors.title)?;
    let desc_sel = parse_selector(&selectors.description)?;
    let date_sel = parse_selector(&selectors.date)?;
    let image_sel = parse_selector(&selectors.image)?;

    // Lenient HTML5 parsing; malformed markup degrades, it never fails.
    let html = Html::parse_document(document);
    let now = Utc::now();
    let mut records = Vec::new();

    for title_el in html.select(&title_sel) {
        let title = collapse_whitespace(&element_text(title_el));
        if title.is_empty() {
            continue;
        }

        let container = container_for(title_el, &desc_sel, &date_sel, &image_sel);

        let description = container
            .select(&desc_sel)
            .next()
            .map(|el| collapse_whitespace(&element_text(el)))
            .unwrap_or_default();
        if description.is_empty() {
            continue;
        }

        let date = container
            .select(&date_sel)
            .next()
            .and_then(date_value)
            .and_then(|raw| parse_date(&raw))
            .unwrap_or(now);

        let image_url = container.select(&image_sel).next().and_then(image_src);

        records.push(RawArticle {
            title,
            description,
            date,
            image_url,
        });
    }

    Ok(records)
}

/// Find the article container for a matched title element: the nearest
/// ancestor containing at least one description, date, or image match.
fn container_for<'a>(
    title_el: ElementRef<'a>,
    desc_sel: &Selector,
    date_sel: &Selector,
    image_sel: &Selector,
) -> ElementRef<'a> {
    for ancestor in title_el.ancestors().filter_map(ElementRef::wrap) {
        if ancestor.select(desc_sel).next().is_some()
            || ancestor.select(date_sel).next().is_some()
            || ancestor.select(image_sel).next().is_some()
        {
            return ancestor;
        }
    }
    title_el
}

fn element_text(el: ElementRef<'_>) -> String {
    el.text().collect::<Vec<_>>().join(" ")
}

/// A `<time datetime="...">` attribute is more reliable than display text.
fn date_value(el: ElementRef<'_>) -> Option<String> {
    if let Some(dt) = el.value().attr("datetime") {
        return Some(dt.to_string());
    }
    let text = collapse_whitespace(&element_text(el));
    if text.is_empty() { None } else { Some(text) }
}

fn image_src(el: ElementRef<'_>) -> Option<String> {
    el.value()
        .attr("src")
        .or_else(|| el.value().attr("data-src"))
        .map(str::to_string)
        .filter(|s| !s.is_empty())
}

// Serde shapes for the two syndication formats. Only the handful of fields
// that map onto RawArticle are modeled; everything else is ignored.

#[derive(Debug, Deserialize)]
struct Rss {
    channel: RssChannel,
}

#[derive(Debug, Deserialize)]
struct RssChannel {
    #[serde(rename = "item", default)]
    items: Vec<RssItem>,
}

#[derive(Debug, Deserialize)]
struct RssItem {
    title: Option<String>,
    description: Option<String>,
    #[serde(rename = "pubDate")]
    pub_date: Option<String>,
    enclosure: Option<RssEnclosure>,
    #[serde(rename = "media:thumbnail")]
    thumbnail: Option<MediaThumbnail>,
}

#[derive(Debug, Deserialize)]
struct RssEnclosure {
    #[serde(rename = "@url")]
    url: Option<String>,
}

#[derive(Debug, Deserialize)]
struct MediaThumbnail {
    #[serde(rename = "@url")]
    url: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Atom {
    #[serde(rename = "entry", default)]
    entries: Vec<AtomEntry>,
}

#[derive(Debug, Deserialize)]
struct AtomEntry {
    title: Option<AtomText>,
    summary: Option<AtomText>,
    published: Option<String>,
    updated: Option<String>,
}

/// Atom text constructs may carry a `type` attribute; only the text matters.
#[derive(Debug, Deserialize)]
struct AtomText {
    #[serde(rename = "$text")]
    value: Option<String>,
}

impl AtomText {
    fn text(&self) -> &str {
        self.value.as_deref().unwrap_or_default()
    }
}

/// Parse a syndication document: RSS 2.0 first, then Atom.
pub fn extract_feed(document: &str) -> Result<Vec<RawArticle>, ExtractionError> {
    let now = Utc::now();

    if let Ok(rss) = quick_xml::de::from_str::<Rss>(document) {
        let records = rss
            .channel
            .items
            .into_iter()
            .filter_map(|item| {
                let title = collapse_whitespace(item.title.as_deref().unwrap_or_default());
                let description =
                    collapse_whitespace(item.description.as_deref().unwrap_or_default());
                if title.is_empty() || description.is_empty() {
                    return None;
                }
                let date = item
                    .pub_date
                    .as_deref()
                    .and_then(parse_date)
                    .unwrap_or(now);
                let image_url = item
                    .enclosure
                    .and_then(|e| e.url)
                    .or_else(|| item.thumbnail.and_then(|t| t.url));
                Some(RawArticle {
                    title,
                    description,
                    date,
                    image_url,
                })
            })
            .collect();
        return Ok(records);
    }

    match quick_xml::de::from_str::<Atom>(document) {
        Ok(feed) => Ok(feed
            .entries
            .into_iter()
            .filter_map(|entry| {
                let title = collapse_whitespace(
                    entry.title.as_ref().map(AtomText::text).unwrap_or_default(),
                );
                let description = collapse_whitespace(
                    entry
                        .summary
                        .as_ref()
                        .map(AtomText::text)
                        .unwrap_or_default(),
                );
                if title.is_empty() || description.is_empty() {
                    return None;
                }
                let date = entry
                    .published
                    .as_deref()
                    .or(entry.updated.as_deref())
                    .and_then(parse_date)
                    .unwrap_or(now);
                Some(RawArticle {
                    title,
                    description,
                    date,
                    image_url: None,
                })
            })
            .collect()),
        Err(e) => Err(ExtractionError::Feed {
            reason: e.to_string(),
        }),
    }
}

/// Parse a date string permissively.
///
/// Tries RFC 3339, RFC 2822, a ladder of common site formats, and finally an
/// ISO date embedded in surrounding text. Returns `None` when nothing
/// matches; callers substitute the extraction time.
pub fn parse_date(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    if let Ok(dt) = DateTime::parse_from_rfc2822(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    for fmt in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S"] {
        if let Ok(dt) = NaiveDateTime::parse_from_str(raw, fmt) {
            return Some(dt.and_utc());
        }
    }
    for fmt in ["%Y-%m-%d", "%B %d, %Y", "%b %d, %Y", "%d %B %Y"] {
        if let Ok(d) = NaiveDate::parse_from_str(raw, fmt) {
            return Some(d.and_hms_opt(0, 0, 0)?.and_utc());
        }
    }
    if let Some(m) = EMBEDDED_ISO_DATE.find(raw) {
        if let Ok(d) = NaiveDate::parse_from_str(m.as_str(), "%Y-%m-%d") {
            return Some(d.and_hms_opt(0, 0, 0)?.and_utc());
        }
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn card_selectors() -> SelectorSet {
        SelectorSet {
            title: ".card-title".to_string(),
            description: ".card-desc".to_string(),
            date: "time".to_string(),
            image: ".card img".to_string(),
        }
    }

    const CARD_PAGE: &str = r#"
        <html><body>
          <div class="card">
            <h2 class="card-title">Model beats benchmark</h2>
            <p class="card-desc">A new system tops the leaderboard.</p>
            <time datetime="2024-01-03T09:00:00Z">Jan 3</time>
            <img src="https://cdn.example.com/a.jpg">
          </div>
          <div class="card">
            <h2 class="card-title">Lab opens in Lisbon</h2>
            <p class="card-desc">Second European site.</p>
            <time datetime="2024-01-01T08:00:00Z">Jan 1</time>
          </div>
        </body></html>
    "#;

    #[test]
    fn test_page_extraction_pairs_fields_per_container() {
        let records = extract_page(CARD_PAGE, &card_selectors()).unwrap();
        assert_eq!(records.len(), 2);

        assert_eq!(records[0].title, "Model beats benchmark");
        assert_eq!(records[0].description, "A new system tops the leaderboard.");
        assert_eq!(
            records[0].date,
            Utc.with_ymd_and_hms(2024, 1, 3, 9, 0, 0).unwrap()
        );
        assert_eq!(
            records[0].image_url.as_deref(),
            Some("https://cdn.example.com/a.jpg")
        );

        assert_eq!(records[1].title, "Lab opens in Lisbon");
        assert!(records[1].image_url.is_none());
    }

    #[test]
    fn test_empty_title_dropped() {
        let page = r#"
            <div class="card">
              <h2 class="card-title">   </h2>
              <p class="card-desc">Orphaned description.</p>
            </div>
        "#;
        let records = extract_page(page, &card_selectors()).unwrap();
        assert!(records.is_empty());
    }

    #[test]
    fn test_missing_description_dropped() {
        let page = r#"
            <div class="card">
              <h2 class="card-title">Title without description</h2>
              <time datetime="2024-01-01T00:00:00Z">Jan 1</time>
            </div>
        "#;
        let records = extract_page(page, &card_selectors()).unwrap();
        assert!(records.is_empty());
    }

    #[test]
    fn test_unparsable_date_falls_back_to_now() {
        let page = r#"
            <div class="card">
              <h2 class="card-title">Undated story</h2>
              <p class="card-desc">No usable timestamp.</p>
              <time>sometime recently</time>
            </div>
        "#;
        let before = Utc::now();
        let records = extract_page(page, &card_selectors()).unwrap();
        let after = Utc::now();

        assert_eq!(records.len(), 1);
        assert!(records[0].date >= before && records[0].date <= after);
    }

    #[test]
    fn test_generic_selector_list_matches_article_markup() {
        let page = r#"
            <article>
              <h1>Policy brief released</h1>
              <p>The ministry published new guidance.</p>
              <time datetime="2024-02-10">Feb 10</time>
            </article>
        "#;
        let selectors = SelectorSet {
            title: "article h1, article h2, .article-title, .entry-title".to_string(),
            description: "article p, .article-content, .entry-content".to_string(),
            date: "time, .date, .published, .post-date".to_string(),
            image: "article img, .featured-image, .post-thumbnail".to_string(),
        };
        let records = extract_page(page, &selectors).unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].title, "Policy brief released");
    }

    #[test]
    fn test_malformed_selector_is_extraction_error() {
        let mut selectors = card_selectors();
        selectors.title = ":::not-a-selector".to_string();
        let err = extract_page("<html></html>", &selectors).unwrap_err();
        assert!(matches!(err, ExtractionError::Selector { .. }));
    }

    #[test]
    fn test_page_source_without_selectors_is_error() {
        let source = Source {
            id: "broken".to_string(),
            name: "Broken".to_string(),
            url: "https://example.com".to_string(),
            kind: SourceKind::Page,
            category: crate::models::NewsCategory::Industry,
            active: true,
            selectors: None,
        };
        let err = extract("<html></html>", &source).unwrap_err();
        assert!(matches!(err, ExtractionError::MissingSelectors { .. }));
    }

    const RSS_DOC: &str = r#"<?xml version="1.0"?>
        <rss version="2.0">
          <channel>
            <title>AI Wire</title>
            <item>
              <title>Robots ship groceries</title>
              <description>Pilot program expands.</description>
              <pubDate>Wed, 03 Jan 2024 10:00:00 GMT</pubDate>
              <enclosure url="https://cdn.example.com/r.jpg" type="image/jpeg"/>
            </item>
            <item>
              <title>Untitled follow-up</title>
              <description></description>
            </item>
          </channel>
        </rss>
    "#;

    #[test]
    fn test_rss_extraction() {
        let records = extract_feed(RSS_DOC).unwrap();
        // The empty-description item is dropped.
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].title, "Robots ship groceries");
        assert_eq!(
            records[0].date,
            Utc.with_ymd_and_hms(2024, 1, 3, 10, 0, 0).unwrap()
        );
        assert_eq!(
            records[0].image_url.as_deref(),
            Some("https://cdn.example.com/r.jpg")
        );
    }

    const ATOM_DOC: &str = r#"<?xml version="1.0"?>
        <feed xmlns="http://www.w3.org/2005/Atom">
          <title>Lab Notes</title>
          <entry>
            <title type="text">Benchmark results posted</title>
            <summary>Full tables available.</summary>
            <published>2024-01-02T12:00:00Z</published>
          </entry>
        </feed>
    "#;

    #[test]
    fn test_atom_extraction() {
        let records = extract_feed(ATOM_DOC).unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].title, "Benchmark results posted");
        assert_eq!(records[0].description, "Full tables available.");
        assert_eq!(
            records[0].date,
            Utc.with_ymd_and_hms(2024, 1, 2, 12, 0, 0).unwrap()
        );
    }

    #[test]
    fn test_unparsable_feed_is_extraction_error() {
        let err = extract_feed("not xml at all <<<").unwrap_err();
        assert!(matches!(err, ExtractionError::Feed { .. }));
    }

    #[test]
    fn test_parse_date_formats() {
        assert_eq!(
            parse_date("2024-01-03T09:30:00Z").unwrap(),
            Utc.with_ymd_and_hms(2024, 1, 3, 9, 30, 0).unwrap()
        );
        assert_eq!(
            parse_date("Wed, 03 Jan 2024 09:30:00 GMT").unwrap(),
            Utc.with_ymd_and_hms(2024, 1, 3, 9, 30, 0).unwrap()
        );
        assert_eq!(
            parse_date("January 3, 2024").unwrap(),
            Utc.with_ymd_and_hms(2024, 1, 3, 0, 0, 0).unwrap()
        );
        assert_eq!(
            parse_date("Published 2024-01-02, morning edition").unwrap(),
            Utc.with_ymd_and_hms(2024, 1, 2, 0, 0, 0).unwrap()
        );
        assert!(parse_date("sometime recently").is_none());
        assert!(parse_date("").is_none());
    }
}
