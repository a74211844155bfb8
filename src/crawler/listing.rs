//! Category listings and incident identifier extraction

use crate::config::SourceConfig;
use crate::crawler::request::UpstreamRequest;
use crate::incident::IncidentId;
use crate::{HarvestError, Result};
use scraper::{Html, Selector};
use std::collections::BTreeSet;
use url::Url;

const RESULTS_TABLE: &str = "table";
const ROW_SELECTOR: &str = "tr";
const LINK_SELECTOR: &str = "td a[href]";

/// Request that searches one category
///
/// Failures are not retried here; the coordinator owns the retry policy.
pub fn listing_request(source: &SourceConfig, category: &str) -> Result<UpstreamRequest> {
    Ok(UpstreamRequest::post_form(Url::parse(&source.search_url)?)
        .param(source.category_field.clone(), category))
}

/// Extracts the incident identifiers linked from a listing page
///
/// Each result row links to a detail page whose query string carries the
/// identifier under `id_param`. Relative links are resolved against
/// `base_url`. Rows without such a link (headers, notices) are ignored and
/// duplicates collapse.
///
/// # Errors
///
/// `ListingFormat` when the page has no results table. A table with no
/// result rows is an empty set, not an error.
pub fn extract_ids(html: &str, base_url: &Url, id_param: &str) -> Result<BTreeSet<IncidentId>> {
    let document = Html::parse_document(html);
    let table_selector = parse_selector(RESULTS_TABLE)?;
    let row_selector = parse_selector(ROW_SELECTOR)?;
    let link_selector = parse_selector(LINK_SELECTOR)?;

    let table = document
        .select(&table_selector)
        .next()
        .ok_or_else(|| HarvestError::ListingFormat("no results table on listing page".to_string()))?;

    let mut ids = BTreeSet::new();
    for row in table.select(&row_selector) {
        let Some(link) = row.select(&link_selector).next() else {
            continue;
        };
        let Some(href) = link.value().attr("href") else {
            continue;
        };

        match id_from_href(href, base_url, id_param) {
            Some(id) => {
                ids.insert(id);
            }
            None => tracing::debug!("Result link without {}: {}", id_param, href),
        }
    }

    Ok(ids)
}

/// Reads the identifier query parameter of a result link
fn id_from_href(href: &str, base_url: &Url, id_param: &str) -> Option<IncidentId> {
    let url = base_url.join(href.trim()).ok()?;
    url.query_pairs()
        .find(|(name, _)| name == id_param)
        .and_then(|(_, value)| IncidentId::new(value))
}

fn parse_selector(css: &str) -> Result<Selector> {
    Selector::parse(css)
        .map_err(|e| HarvestError::ListingFormat(format!("bad selector '{}': {:?}", css, e)))
}
