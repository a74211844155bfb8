//! Injury category catalog
//!
//! The search form exposes a select control whose option values are the
//! category codes accepted by a search. Searching each code in turn covers
//! the whole incident space.

use crate::config::SourceConfig;
use crate::crawler::request::UpstreamRequest;
use crate::{HarvestError, Result};
use scraper::{Html, Selector};
use url::Url;

const CATEGORY_SELECT: &str = "select#injuryType";
const OPTION_SELECTOR: &str = "option";

/// Request that retrieves the search form
pub fn catalog_request(source: &SourceConfig) -> Result<UpstreamRequest> {
    Ok(UpstreamRequest::get(Url::parse(&source.search_url)?))
}

/// Extracts the category codes from the search form
///
/// Returns the non-empty option values in page order, without repeats.
///
/// # Errors
///
/// `CatalogFormat` when the category select control is absent or offers no
/// category at all.
pub fn extract_categories(html: &str) -> Result<Vec<String>> {
    let document = Html::parse_document(html);
    let select_selector = parse_selector(CATEGORY_SELECT)?;
    let option_selector = parse_selector(OPTION_SELECTOR)?;

    let select = document.select(&select_selector).next().ok_or_else(|| {
        HarvestError::CatalogFormat(format!("no '{}' control on search form", CATEGORY_SELECT))
    })?;

    let mut categories: Vec<String> = Vec::new();
    for option in select.select(&option_selector) {
        let Some(value) = option.value().attr("value") else {
            continue;
        };
        let value = value.trim();
        if value.is_empty() || categories.iter().any(|c| c == value) {
            continue;
        }
        categories.push(value.to_string());
    }

    if categories.is_empty() {
        return Err(HarvestError::CatalogFormat(format!(
            "'{}' control offers no categories",
            CATEGORY_SELECT
        )));
    }

    Ok(categories)
}

fn parse_selector(css: &str) -> Result<Selector> {
    Selector::parse(css)
        .map_err(|e| HarvestError::CatalogFormat(format!("bad selector '{}': {:?}", css, e)))
}
