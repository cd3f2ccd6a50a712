//! Global-impact classification by keyword heuristic.
//!
//! An article is tagged as globally impactful when its title or description
//! contains any of the configured high-significance terms. The term list is
//! injected (see [`AppConfig::impact_terms`](crate::config::AppConfig)) so it
//! can be swapped or tested independently of the matching logic.

/// Pure, deterministic keyword check over `"{title} {description}"`,
/// lower-cased. Same inputs always yield the same verdict.
pub fn is_global_impact(terms: &[String], title: &str, description: &str) -> bool {
    let content = format!("{title} {description}").to_lowercase();
    terms
        .iter()
        .any(|term| content.contains(&term.to_lowercase()))
}
