//! Storage traits and error types
//!
//! This module defines the trait interface for record stores and
//! associated error types.

use crate::incident::IncidentId;
use crate::output::RunSummary;
use crate::report::{CrashFields, InjuryFields, VehicleFields};
use crate::storage::{
    CrashRecord, FailureRecord, InjuryRecord, RunRecord, RunStatus, VehicleRecord,
};
use thiserror::Error;

/// Errors that can occur during storage operations
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Incident {0} is already stored")]
    DuplicateIncident(String),

    #[error("Run not found: {0}")]
    RunNotFound(i64),

    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Trait for record store implementations
///
/// A crash row is the root of an incident: vehicles and injuries are only
/// ever written together with it, and its presence is the authoritative
/// "already processed" signal.
pub trait RecordStore {
    // ===== Incidents =====

    /// Whether a crash record exists for `id`
    fn exists(&self, id: &IncidentId) -> StorageResult<bool>;

    /// Writes one crash record with its vehicles and injuries as a unit
    ///
    /// Vehicles are numbered 1.. in slice order. Either every row becomes
    /// visible or none does.
    ///
    /// # Errors
    ///
    /// * `StorageError::DuplicateIncident` - a crash record for `id` exists
    /// * `StorageError::Sqlite` - the write failed and was rolled back
    fn persist_incident(
        &mut self,
        id: &IncidentId,
        crash: &CrashFields,
        vehicles: &[VehicleFields],
        injuries: &[InjuryFields],
    ) -> StorageResult<()>;

    /// Gets the crash record of an incident
    fn get_crash(&self, id: &IncidentId) -> StorageResult<Option<CrashRecord>>;

    /// Gets the vehicles of an incident ordered by vehicle number
    fn get_vehicles(&self, id: &IncidentId) -> StorageResult<Vec<VehicleRecord>>;

    /// Gets the injuries of an incident in insertion order
    fn get_injuries(&self, id: &IncidentId) -> StorageResult<Vec<InjuryRecord>>;

    /// Gets every stored incident id, sorted
    fn incident_ids(&self) -> StorageResult<Vec<IncidentId>>;

    // ===== Statistics =====

    fn count_crashes(&self) -> StorageResult<u64>;

    fn count_vehicles(&self) -> StorageResult<u64>;

    fn count_injuries(&self) -> StorageResult<u64>;

    // ===== Run Management =====

    /// Creates a new crawl run and returns its ID
    fn create_run(&mut self, config_hash: &str) -> StorageResult<i64>;

    /// Stores the final counts and status of a run
    fn finish_run(
        &mut self,
        run_id: i64,
        summary: &RunSummary,
        status: RunStatus,
    ) -> StorageResult<()>;

    /// Gets a run by ID
    fn get_run(&self, run_id: i64) -> StorageResult<RunRecord>;

    /// Gets the most recent run
    fn get_latest_run(&self) -> StorageResult<Option<RunRecord>>;

    /// Records a failure scoped to an incident or a category
    fn record_failure(
        &mut self,
        run_id: i64,
        incident: Option<&IncidentId>,
        category: Option<&str>,
        error: &str,
    ) -> StorageResult<()>;

    /// Gets the failures recorded for a run
    fn get_failures(&self, run_id: i64) -> StorageResult<Vec<FailureRecord>>;
}
