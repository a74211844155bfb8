//! Statistics generation from the record database
//!
//! This module provides functionality for extracting and displaying
//! what the record store holds.

use crate::storage::{RecordStore, RunRecord, StorageResult};

/// Record store statistics summary
#[derive(Debug, Clone)]
pub struct StoreStatistics {
    /// Number of stored incidents (crash records)
    pub crashes: u64,

    /// Number of stored vehicle records
    pub vehicles: u64,

    /// Number of stored injury records
    pub injuries: u64,

    /// The most recent crawl run, if any
    pub latest_run: Option<RunRecord>,
}

/// Loads statistics from storage
pub fn load_statistics(storage: &dyn RecordStore) -> StorageResult<StoreStatistics> {
    Ok(StoreStatistics {
        crashes: storage.count_crashes()?,
        vehicles: storage.count_vehicles()?,
        injuries: storage.count_injuries()?,
        latest_run: storage.get_latest_run()?,
    })
}

/// Prints statistics to stdout in a formatted manner
pub fn print_statistics(stats: &StoreStatistics) {
    println!("=== Record Statistics ===\n");

    println!("Stored records:");
    println!("  Crashes: {}", stats.crashes);
    println!("  Vehicles: {}", stats.vehicles);
    println!("  Injuries: {}", stats.injuries);
    println!();

    if stats.crashes > 0 {
        println!(
            "Averages: {:.2} vehicles, {:.2} injuries per crash",
            stats.vehicles as f64 / stats.crashes as f64,
            stats.injuries as f64 / stats.crashes as f64
        );
        println!();
    }

    match &stats.latest_run {
        Some(run) => {
            println!("Latest run (#{}):", run.id);
            println!("  Status: {}", run.status.to_db_string());
            println!("  Started: {}", run.started_at);
            println!(
                "  Finished: {}",
                run.finished_at.as_deref().unwrap_or("(not finished)")
            );
            println!(
                "  Persisted: {}, Skipped: {}, Failed: {}",
                run.persisted, run.skipped, run.failed
            );
        }
        None => println!("No crawl runs recorded yet"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::incident::IncidentId;
    use crate::report::{CrashFields, InjuryFields, VehicleFields};
    use crate::storage::SqliteStorage;

    #[test]
    fn test_load_statistics() {
        let mut storage = SqliteStorage::new_in_memory().unwrap();
        let id = IncidentId::new("AB123").unwrap();
        storage
            .persist_incident(
                &id,
                &CrashFields::default(),
                &[VehicleFields::default(), VehicleFields::default()],
                &[InjuryFields::default()],
            )
            .unwrap();

        let stats = load_statistics(&storage).unwrap();
        assert_eq!(stats.crashes, 1);
        assert_eq!(stats.vehicles, 2);
        assert_eq!(stats.injuries, 1);
        assert!(stats.latest_run.is_none());
    }
}
