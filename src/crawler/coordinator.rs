//! Crawl coordinator - main harvest orchestration logic
//!
//! One run walks the catalog in order, searches each category, and for every
//! listed incident either skips it (already stored) or fetches, parses and
//! persists it. The walk is strictly sequential:
//! - Categories are processed in catalog order
//! - Network requests are spaced by the configured delay, cache hits are not
//! - A failure scoped to one incident or one category never aborts the run
//! - Only a missing catalog is fatal

use crate::cache::ResponseCache;
use crate::config::Config;
use crate::crawler::catalog::{catalog_request, extract_categories};
use crate::crawler::detail::report_request;
use crate::crawler::fetcher::{build_http_client, Fetcher};
use crate::crawler::listing::{extract_ids, listing_request};
use crate::crawler::pacer::Pacer;
use crate::crawler::request::UpstreamRequest;
use crate::incident::IncidentId;
use crate::output::{IncidentOutcome, RunSummary};
use crate::report::parse_report;
use crate::storage::{RecordStore, RunStatus, SqliteStorage};
use crate::{HarvestError, Result};
use std::path::Path;
use std::time::Duration;
use url::Url;

/// Main harvest coordinator structure
///
/// The store and fetcher are handed in already constructed, so tests can run
/// a coordinator against an in-memory store and a mock upstream.
pub struct Coordinator<S: RecordStore> {
    config: Config,
    config_hash: String,
    storage: S,
    fetcher: Fetcher,
    pacer: Pacer,
}

impl Coordinator<SqliteStorage> {
    /// Opens the record store and response cache named by the configuration
    ///
    /// # Returns
    ///
    /// * `Ok(Coordinator)` - Successfully created coordinator
    /// * `Err(HarvestError)` - A database could not be opened or the HTTP
    ///   client could not be built
    pub fn from_config(config: Config, config_hash: impl Into<String>) -> Result<Self> {
        let storage = SqliteStorage::new(Path::new(&config.output.database_path))?;
        let cache = ResponseCache::new(Path::new(&config.cache.path), config.cache.ttl_hours)?;
        let client = build_http_client(&config.client)?;

        Ok(Self::new(
            config,
            config_hash,
            storage,
            Fetcher::new(client, cache),
        ))
    }
}

impl<S: RecordStore> Coordinator<S> {
    pub fn new(config: Config, config_hash: impl Into<String>, storage: S, fetcher: Fetcher) -> Self {
        let pacer = Pacer::from_millis(config.crawler.request_delay_ms);
        Self {
            config,
            config_hash: config_hash.into(),
            storage,
            fetcher,
            pacer,
        }
    }

    pub fn storage(&self) -> &S {
        &self.storage
    }

    /// Runs one complete harvest
    ///
    /// 1. Opens a run record and drops expired cache entries
    /// 2. Lists the categories (fatal on failure)
    /// 3. Harvests every category in order
    /// 4. Closes the run record with the final counts
    pub async fn run(&mut self) -> Result<RunSummary> {
        let run_id = self.storage.create_run(&self.config_hash)?;
        tracing::info!("Starting harvest run {}", run_id);

        match self.fetcher.cache().purge_stale() {
            Ok(0) => {}
            Ok(purged) => tracing::debug!("Purged {} stale cache entries", purged),
            Err(e) => tracing::warn!("Failed to purge response cache: {}", e),
        }

        let mut summary = RunSummary::default();

        let categories = match self.list_categories().await {
            Ok(categories) => categories,
            Err(e) => {
                tracing::error!("Cannot list injury categories: {}", e);
                self.note_failure(run_id, None, None, &e);
                self.storage.finish_run(run_id, &summary, RunStatus::Failed)?;
                return Err(e);
            }
        };
        tracing::info!("Found {} injury categories", categories.len());

        for category in &categories {
            if let Err(e) = self.harvest_category(run_id, category, &mut summary).await {
                tracing::warn!("Category {} aborted: {}", category, e);
                self.note_failure(run_id, None, Some(category), &e);
                summary.failed_categories.push(category.clone());
            }
        }

        self.storage.finish_run(run_id, &summary, RunStatus::Completed)?;
        tracing::info!(
            "Harvest run {} finished, {} incidents listed: {}",
            run_id,
            summary.total(),
            summary
        );

        Ok(summary)
    }

    /// Fetches the search form and reads its category codes
    pub async fn list_categories(&mut self) -> Result<Vec<String>> {
        let request = catalog_request(&self.config.source)?;
        let page = self.fetch_paced(&request).await?;
        extract_categories(&page)
    }

    /// Fetches the raw listing page of one category
    pub async fn fetch_listing(&mut self, category: &str) -> Result<String> {
        let request = listing_request(&self.config.source, category)?;
        self.fetch_paced(&request).await
    }

    /// Fetches the raw detail page of one incident
    pub async fn fetch_report(&mut self, id: &IncidentId) -> Result<String> {
        let request = report_request(&self.config.source, id)?;
        self.fetch_paced(&request).await
    }

    async fn harvest_category(
        &mut self,
        run_id: i64,
        category: &str,
        summary: &mut RunSummary,
    ) -> Result<()> {
        let listing = self.fetch_listing(category).await?;
        let base_url = Url::parse(&self.config.source.search_url)?;
        let ids = extract_ids(&listing, &base_url, &self.config.source.id_param)?;
        tracing::info!("Category {}: {} incidents listed", category, ids.len());

        for id in &ids {
            let outcome = self.process_incident(run_id, category, id).await;
            summary.record(outcome);
        }

        Ok(())
    }

    /// Handles one listed incident, containing any failure to it
    async fn process_incident(
        &mut self,
        run_id: i64,
        category: &str,
        id: &IncidentId,
    ) -> IncidentOutcome {
        match self.harvest_incident(id).await {
            Ok(outcome) => outcome,
            Err(HarvestError::DuplicateIncident(_)) => {
                tracing::debug!("Incident {} stored concurrently, skipping", id);
                IncidentOutcome::Skipped
            }
            Err(e) => {
                if matches!(e, HarvestError::Storage(_)) {
                    tracing::error!("Failed to store incident {}: {}", id, e);
                } else {
                    tracing::warn!("Incident {} failed: {}", id, e);
                }
                self.note_failure(run_id, Some(id), Some(category), &e);
                IncidentOutcome::Failed
            }
        }
    }

    async fn harvest_incident(&mut self, id: &IncidentId) -> Result<IncidentOutcome> {
        if self.storage.exists(id)? {
            tracing::debug!("Incident {} already stored, skipping", id);
            return Ok(IncidentOutcome::Skipped);
        }

        let page = self.fetch_report(id).await?;
        let report = parse_report(&page)?;
        if report.crash.incident_num != id.as_str() {
            tracing::warn!(
                "Incident {} reports number '{}' on its detail page",
                id,
                report.crash.incident_num
            );
        }

        self.storage
            .persist_incident(id, &report.crash, &report.vehicles, &report.injuries)?;
        tracing::info!(
            "Stored incident {} ({} vehicles, {} injuries)",
            id,
            report.vehicles.len(),
            report.injuries.len()
        );

        Ok(IncidentOutcome::Persisted)
    }

    /// Serves a request from the cache, or sends it once the pacer allows
    ///
    /// Transient failures are retried `retry-attempts` times with a linear
    /// backoff. Every request that reaches the network starts a new pacing
    /// interval, failed or not.
    async fn fetch_paced(&mut self, request: &UpstreamRequest) -> Result<String> {
        if let Some(body) = self.fetcher.cached(request)? {
            return Ok(body);
        }

        let retry_attempts = self.config.crawler.retry_attempts;
        let mut attempt = 0;
        loop {
            self.pacer.wait().await;
            let result = self.fetcher.send(request).await;
            self.pacer.record_request();

            match result {
                Ok(body) => {
                    self.fetcher.store(request, &body);
                    return Ok(body);
                }
                Err(e) if e.is_transient() && attempt < retry_attempts => {
                    attempt += 1;
                    let backoff = Duration::from_millis(
                        self.config
                            .crawler
                            .retry_delay_ms
                            .saturating_mul(u64::from(attempt)),
                    );
                    tracing::warn!(
                        "{} (attempt {}/{}), retrying in {:?}",
                        e,
                        attempt,
                        retry_attempts,
                        backoff
                    );
                    tokio::time::sleep(backoff).await;
                }
                Err(e) => return Err(e),
            }
        }
    }

    fn note_failure(
        &mut self,
        run_id: i64,
        incident: Option<&IncidentId>,
        category: Option<&str>,
        error: &HarvestError,
    ) {
        if let Err(e) = self
            .storage
            .record_failure(run_id, incident, category, &error.to_string())
        {
            tracing::warn!("Failed to record failure ({}): {}", error, e);
        }
    }
}

/// Runs a complete harvest with stores opened from the configuration
///
/// # Example
///
/// ```no_run
/// use crash_harvest::config::load_config_with_hash;
/// use crash_harvest::crawler::run_harvest;
/// use std::path::Path;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let (config, hash) = load_config_with_hash(Path::new("harvest.toml"))?;
/// let summary = run_harvest(config, &hash).await?;
/// println!("{}", summary);
/// # Ok(())
/// # }
/// ```
pub async fn run_harvest(config: Config, config_hash: &str) -> Result<RunSummary> {
    let mut coordinator = Coordinator::from_config(config, config_hash)?;
    coordinator.run().await
}
