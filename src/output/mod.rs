//! Output module for run summaries and store statistics
//!
//! This module handles:
//! - The per-run summary of persisted, skipped and failed incidents
//! - Statistics about what the record store currently holds

pub mod stats;

pub use stats::{load_statistics, print_statistics, StoreStatistics};

use std::fmt;

/// What happened to one incident during a run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IncidentOutcome {
    /// Fetched, parsed and written
    Persisted,
    /// Already stored, nothing fetched
    Skipped,
    /// Fetch, parse or write failed; recorded and left for a later run
    Failed,
}

/// Counts produced by one crawl run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub persisted: u64,
    pub skipped: u64,
    pub failed: u64,
    /// Categories whose listing could not be fetched or read
    pub failed_categories: Vec<String>,
}

impl RunSummary {
    /// Adds one incident outcome to the counts
    pub fn record(&mut self, outcome: IncidentOutcome) {
        match outcome {
            IncidentOutcome::Persisted => self.persisted += 1,
            IncidentOutcome::Skipped => self.skipped += 1,
            IncidentOutcome::Failed => self.failed += 1,
        }
    }

    /// Number of incidents visited
    pub fn total(&self) -> u64 {
        self.persisted + self.skipped + self.failed
    }

    /// True when no incident or category failed
    pub fn is_clean(&self) -> bool {
        self.failed == 0 && self.failed_categories.is_empty()
    }
}

impl fmt::Display for RunSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} persisted, {} skipped, {} failed",
            self.persisted, self.skipped, self.failed
        )?;
        if !self.failed_categories.is_empty() {
            write!(
                f,
                " ({} categories failed: {})",
                self.failed_categories.len(),
                self.failed_categories.join(", ")
            )?;
        }
        Ok(())
    }
}
