//! Record and pagination-link extraction
//!
//! Extraction is a pure function of the fetched document. A page is read
//! only once its content markers are present (the pipeline re-polls until
//! they appear or its wait budget runs out); a matched item with missing
//! or malformed sub-fields is skipped individually so one bad item never
//! drops the rest of the page.

use crate::config::SourceConfig;
use crate::ConfigError;
use scraper::{Html, Selector};
use std::collections::HashSet;
use url::Url;

/// Parsed CSS selectors for one listing source
#[derive(Debug, Clone)]
pub struct Selectors {
    record: Selector,
    link: Selector,
    pagination: Selector,
}

impl Selectors {
    pub fn from_config(source: &SourceConfig) -> Result<Self, ConfigError> {
        Ok(Self {
            record: parse_selector("record-selector", &source.record_selector)?,
            link: parse_selector("link-selector", &source.link_selector)?,
            pagination: parse_selector("pagination-selector", &source.pagination_selector)?,
        })
    }
}

fn parse_selector(name: &str, selector: &str) -> Result<Selector, ConfigError> {
    Selector::parse(selector)
        .map_err(|e| ConfigError::InvalidSelector(format!("{} '{}': {:?}", name, selector, e)))
}

/// One extracted (name, url) pair before dedup and timestamping
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Candidate {
    pub name: String,
    pub url: String,
}

/// Extraction result for one page
#[derive(Debug, Clone, Default)]
pub struct Extraction {
    /// Candidates in document order
    pub records: Vec<Candidate>,

    /// Items matched by the record selector but skipped as malformed
    pub malformed: usize,
}

/// Whether the expected content markers are present in the document
pub fn has_markers(html: &str, selectors: &Selectors) -> bool {
    let document = Html::parse_document(html);
    document.select(&selectors.record).next().is_some()
}

/// Extracts candidate records from a page, preserving document order
pub fn extract_records(html: &str, base: &Url, selectors: &Selectors) -> Extraction {
    let document = Html::parse_document(html);
    let mut extraction = Extraction::default();

    for element in document.select(&selectors.record) {
        let name = element.text().collect::<String>().trim().to_string();
        if name.is_empty() {
            tracing::warn!("Skipping record with empty name");
            extraction.malformed += 1;
            continue;
        }

        let href = element
            .select(&selectors.link)
            .next()
            .and_then(|a| a.value().attr("href"));

        let url = match href.and_then(|h| resolve_link(h, base)) {
            Some(url) => url,
            None => {
                tracing::warn!("Skipping record '{}' without a usable link", name);
                extraction.malformed += 1;
                continue;
            }
        };

        extraction.records.push(Candidate { name, url });
    }

    extraction
}

/// Extracts pagination links from a page
///
/// Order of first appearance is preserved; duplicate hrefs are dropped.
pub fn pagination_links(html: &str, base: &Url, selectors: &Selectors) -> Vec<String> {
    let document = Html::parse_document(html);
    let mut links = Vec::new();
    let mut seen = HashSet::new();

    for element in document.select(&selectors.pagination) {
        if let Some(url) = element
            .value()
            .attr("href")
            .and_then(|h| resolve_link(h, base))
        {
            if seen.insert(url.clone()) {
                links.push(url);
            }
        }
    }

    links
}

/// Resolves an href to an absolute http(s) URL
///
/// Returns None for empty hrefs, fragments, non-web schemes, and hrefs
/// that do not resolve against the base.
fn resolve_link(href: &str, base: &Url) -> Option<String> {
    let href = href.trim();

    if href.is_empty() || href.starts_with('#') {
        return None;
    }

    if href.starts_with("javascript:")
        || href.starts_with("mailto:")
        || href.starts_with("tel:")
        || href.starts_with("data:")
    {
        return None;
    }

    match base.join(href) {
        Ok(absolute) if absolute.scheme() == "http" || absolute.scheme() == "https" => {
            Some(absolute.to_string())
        }
        _ => None,
    }
}
