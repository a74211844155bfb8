//! Crawler module for harvesting incident reports
//!
//! This module contains the core harvesting logic, including:
//! - Upstream request description and signing
//! - HTTP fetching through the response cache
//! - Category catalog, listing and detail page handling
//! - Request pacing
//! - Overall run coordination

mod catalog;
mod coordinator;
mod detail;
mod fetcher;
mod listing;
mod pacer;
mod request;

pub use catalog::{catalog_request, extract_categories};
pub use coordinator::{run_harvest, Coordinator};
pub use detail::report_request;
pub use fetcher::{build_http_client, Fetcher};
pub use listing::{extract_ids, listing_request};
pub use pacer::Pacer;
pub use request::{Method, UpstreamRequest};

use crate::config::Config;
use crate::output::RunSummary;
use crate::Result;

/// Runs one complete harvest
///
/// This is the main entry point for a run. It will:
/// 1. Open the record store and response cache
/// 2. List the injury categories
/// 3. Search each category and collect incident identifiers
/// 4. Fetch, parse and store every incident not stored yet
/// 5. Record and return the run's counts
///
/// # Arguments
///
/// * `config` - The harvest configuration
/// * `config_hash` - Hash of the configuration file, recorded with the run
///
/// # Returns
///
/// * `Ok(RunSummary)` - The run completed, possibly with per-item failures
/// * `Err(HarvestError)` - The run could not start or the catalog was unusable
pub async fn crawl(config: Config, config_hash: &str) -> Result<RunSummary> {
    run_harvest(config, config_hash).await
}
