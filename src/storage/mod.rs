//! Storage module for persisting harvested records
//!
//! This module handles all database operations, including:
//! - SQLite database initialization and schema management
//! - Atomic per-incident writes of crash, vehicle and injury rows
//! - Existence queries used to skip stored incidents
//! - Run and failure tracking

mod schema;
mod sqlite;
mod traits;

pub use sqlite::SqliteStorage;
pub use traits::{RecordStore, StorageError, StorageResult};

use std::path::Path;

/// Initializes or opens a record database
pub fn open_storage(path: &Path) -> StorageResult<SqliteStorage> {
    SqliteStorage::new(path)
}

/// A stored crash record
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CrashRecord {
    pub incident_num: String,
    pub investigated_by: String,
    pub gps_latitude: String,
    pub gps_longitude: String,
    pub date: String,
    pub time: String,
    pub county: String,
    pub location: String,
    pub troop: String,
    pub misc_info: String,
}

/// A stored vehicle record
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VehicleRecord {
    pub incident_num: String,
    /// 1-based position in the source vehicle table
    pub vehicle_num: u32,
    pub description: String,
    pub damage: String,
    pub disposition: String,
    pub driver_name: String,
    pub driver_gender: String,
    pub driver_age: String,
    pub safety_device: String,
    pub driver_city_state: String,
    pub driver_insurance: String,
    pub direction: String,
}

/// A stored injury record
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InjuryRecord {
    pub incident_num: String,
    pub vehicle_num: String,
    pub name: String,
    pub gender: String,
    pub age: String,
    pub injury_type: String,
    pub safety_device: String,
    pub city_state: String,
    pub involvement: String,
    pub disposition: String,
}

/// Represents a crawl run
#[derive(Debug, Clone)]
pub struct RunRecord {
    pub id: i64,
    pub started_at: String,
    pub finished_at: Option<String>,
    pub config_hash: String,
    pub status: RunStatus,
    pub persisted: u64,
    pub skipped: u64,
    pub failed: u64,
}

/// A failure recorded during a run
#[derive(Debug, Clone)]
pub struct FailureRecord {
    pub run_id: i64,
    pub incident_num: Option<String>,
    pub category: Option<String>,
    pub error: String,
    pub recorded_at: String,
}

/// Status of a crawl run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunStatus {
    Running,
    Completed,
    Failed,
}

impl RunStatus {
    pub fn to_db_string(&self) -> &'static str {
        match self {
            Self::Running => "running",
            Self::Completed => "completed",
            Self::Failed => "failed",
        }
    }

    pub fn from_db_string(s: &str) -> Option<Self> {
        match s {
            "running" => Some(Self::Running),
            "completed" => Some(Self::Completed),
            "failed" => Some(Self::Failed),
            _ => None,
        }
    }
}
