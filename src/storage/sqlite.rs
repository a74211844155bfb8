//! SQLite storage implementation
//!
//! This module provides a SQLite-based implementation of the RecordStore trait.

use crate::incident::IncidentId;
use crate::output::RunSummary;
use crate::report::{CrashFields, InjuryFields, VehicleFields};
use crate::storage::schema::initialize_schema;
use crate::storage::traits::{RecordStore, StorageError, StorageResult};
use crate::storage::{
    CrashRecord, FailureRecord, InjuryRecord, RunRecord, RunStatus, VehicleRecord,
};
use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension, Row, TransactionBehavior};
use std::path::Path;

/// SQLite storage backend
pub struct SqliteStorage {
    conn: Connection,
}

impl SqliteStorage {
    /// Creates a new SqliteStorage instance
    ///
    /// # Arguments
    ///
    /// * `path` - Path to the SQLite database file
    pub fn new(path: &Path) -> StorageResult<Self> {
        let conn = Connection::open(path)?;

        conn.execute_batch(
            "
            PRAGMA journal_mode = WAL;
            PRAGMA synchronous = NORMAL;
            PRAGMA foreign_keys = ON;
            PRAGMA temp_store = MEMORY;
        ",
        )?;

        initialize_schema(&conn)?;

        Ok(Self { conn })
    }

    /// Creates an in-memory database
    pub fn new_in_memory() -> StorageResult<Self> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch("PRAGMA foreign_keys = ON;")?;
        initialize_schema(&conn)?;
        Ok(Self { conn })
    }

    fn count(&self, sql: &str) -> StorageResult<u64> {
        let count: i64 = self.conn.query_row(sql, [], |row| row.get(0))?;
        Ok(count as u64)
    }
}

fn run_from_row(row: &Row<'_>) -> rusqlite::Result<RunRecord> {
    Ok(RunRecord {
        id: row.get(0)?,
        started_at: row.get(1)?,
        finished_at: row.get(2)?,
        config_hash: row.get(3)?,
        status: RunStatus::from_db_string(&row.get::<_, String>(4)?)
            .unwrap_or(RunStatus::Failed),
        persisted: row.get::<_, i64>(5)? as u64,
        skipped: row.get::<_, i64>(6)? as u64,
        failed: row.get::<_, i64>(7)? as u64,
    })
}

const RUN_COLUMNS: &str =
    "id, started_at, finished_at, config_hash, status, persisted, skipped, failed";

impl RecordStore for SqliteStorage {
    // ===== Incidents =====

    fn exists(&self, id: &IncidentId) -> StorageResult<bool> {
        let found: Option<i64> = self
            .conn
            .query_row(
                "SELECT 1 FROM crashes WHERE incident_num = ?1",
                params![id.as_str()],
                |row| row.get(0),
            )
            .optional()?;
        Ok(found.is_some())
    }

    fn persist_incident(
        &mut self,
        id: &IncidentId,
        crash: &CrashFields,
        vehicles: &[VehicleFields],
        injuries: &[InjuryFields],
    ) -> StorageResult<()> {
        // IMMEDIATE takes the write lock up front, so the existence check and
        // the inserts cannot interleave with another writer
        let tx = self
            .conn
            .transaction_with_behavior(TransactionBehavior::Immediate)?;

        let already: Option<i64> = tx
            .query_row(
                "SELECT 1 FROM crashes WHERE incident_num = ?1",
                params![id.as_str()],
                |row| row.get(0),
            )
            .optional()?;
        if already.is_some() {
            return Err(StorageError::DuplicateIncident(id.to_string()));
        }

        tx.execute(
            "INSERT INTO crashes (incident_num, investigated_by, gps_latitude, gps_longitude,
             date, time, county, location, troop, misc_info)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
            params![
                id.as_str(),
                crash.investigated_by,
                crash.gps_latitude,
                crash.gps_longitude,
                crash.date,
                crash.time,
                crash.county,
                crash.location,
                crash.troop,
                crash.misc_info,
            ],
        )?;

        {
            let mut stmt = tx.prepare(
                "INSERT INTO vehicles (incident_num, vehicle_num, description, damage, disposition,
                 driver_name, driver_gender, driver_age, safety_device, driver_city_state,
                 driver_insurance, direction)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)",
            )?;
            for (i, vehicle) in vehicles.iter().enumerate() {
                stmt.execute(params![
                    id.as_str(),
                    (i + 1) as i64,
                    vehicle.description,
                    vehicle.damage,
                    vehicle.disposition,
                    vehicle.driver_name,
                    vehicle.driver_gender,
                    vehicle.driver_age,
                    vehicle.safety_device,
                    vehicle.driver_city_state,
                    vehicle.driver_insurance,
                    vehicle.direction,
                ])?;
            }

            let mut stmt = tx.prepare(
                "INSERT INTO injuries (incident_num, vehicle_num, name, gender, age, injury_type,
                 safety_device, city_state, involvement, disposition)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
            )?;
            for injury in injuries {
                stmt.execute(params![
                    id.as_str(),
                    injury.vehicle_num,
                    injury.name,
                    injury.gender,
                    injury.age,
                    injury.injury_type,
                    injury.safety_device,
                    injury.city_state,
                    injury.involvement,
                    injury.disposition,
                ])?;
            }
        }

        tx.commit()?;
        Ok(())
    }

    fn get_crash(&self, id: &IncidentId) -> StorageResult<Option<CrashRecord>> {
        let crash = self
            .conn
            .query_row(
                "SELECT incident_num, investigated_by, gps_latitude, gps_longitude, date, time,
                 county, location, troop, misc_info
                 FROM crashes WHERE incident_num = ?1",
                params![id.as_str()],
                |row| {
                    Ok(CrashRecord {
                        incident_num: row.get(0)?,
                        investigated_by: row.get(1)?,
                        gps_latitude: row.get(2)?,
                        gps_longitude: row.get(3)?,
                        date: row.get(4)?,
                        time: row.get(5)?,
                        county: row.get(6)?,
                        location: row.get(7)?,
                        troop: row.get(8)?,
                        misc_info: row.get(9)?,
                    })
                },
            )
            .optional()?;

        Ok(crash)
    }

    fn get_vehicles(&self, id: &IncidentId) -> StorageResult<Vec<VehicleRecord>> {
        let mut stmt = self.conn.prepare(
            "SELECT incident_num, vehicle_num, description, damage, disposition, driver_name,
             driver_gender, driver_age, safety_device, driver_city_state, driver_insurance,
             direction
             FROM vehicles WHERE incident_num = ?1 ORDER BY vehicle_num ASC",
        )?;

        let vehicles = stmt
            .query_map(params![id.as_str()], |row| {
                Ok(VehicleRecord {
                    incident_num: row.get(0)?,
                    vehicle_num: row.get(1)?,
                    description: row.get(2)?,
                    damage: row.get(3)?,
                    disposition: row.get(4)?,
                    driver_name: row.get(5)?,
                    driver_gender: row.get(6)?,
                    driver_age: row.get(7)?,
                    safety_device: row.get(8)?,
                    driver_city_state: row.get(9)?,
                    driver_insurance: row.get(10)?,
                    direction: row.get(11)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(vehicles)
    }

    fn get_injuries(&self, id: &IncidentId) -> StorageResult<Vec<InjuryRecord>> {
        let mut stmt = self.conn.prepare(
            "SELECT incident_num, vehicle_num, name, gender, age, injury_type, safety_device,
             city_state, involvement, disposition
             FROM injuries WHERE incident_num = ?1 ORDER BY id ASC",
        )?;

        let injuries = stmt
            .query_map(params![id.as_str()], |row| {
                Ok(InjuryRecord {
                    incident_num: row.get(0)?,
                    vehicle_num: row.get(1)?,
                    name: row.get(2)?,
                    gender: row.get(3)?,
                    age: row.get(4)?,
                    injury_type: row.get(5)?,
                    safety_device: row.get(6)?,
                    city_state: row.get(7)?,
                    involvement: row.get(8)?,
                    disposition: row.get(9)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(injuries)
    }

    fn incident_ids(&self) -> StorageResult<Vec<IncidentId>> {
        let mut stmt = self
            .conn
            .prepare("SELECT incident_num FROM crashes ORDER BY incident_num")?;

        let ids = stmt
            .query_map([], |row| row.get::<_, String>(0))?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(ids.into_iter().filter_map(IncidentId::new).collect())
    }

    // ===== Statistics =====

    fn count_crashes(&self) -> StorageResult<u64> {
        self.count("SELECT COUNT(*) FROM crashes")
    }

    fn count_vehicles(&self) -> StorageResult<u64> {
        self.count("SELECT COUNT(*) FROM vehicles")
    }

    fn count_injuries(&self) -> StorageResult<u64> {
        self.count("SELECT COUNT(*) FROM injuries")
    }

    // ===== Run Management =====

    fn create_run(&mut self, config_hash: &str) -> StorageResult<i64> {
        let now = Utc::now().to_rfc3339();
        self.conn.execute(
            "INSERT INTO runs (started_at, config_hash, status) VALUES (?1, ?2, ?3)",
            params![now, config_hash, RunStatus::Running.to_db_string()],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    fn finish_run(
        &mut self,
        run_id: i64,
        summary: &RunSummary,
        status: RunStatus,
    ) -> StorageResult<()> {
        let now = Utc::now().to_rfc3339();
        let updated = self.conn.execute(
            "UPDATE runs SET status = ?1, finished_at = ?2, persisted = ?3, skipped = ?4,
             failed = ?5 WHERE id = ?6",
            params![
                status.to_db_string(),
                now,
                summary.persisted as i64,
                summary.skipped as i64,
                summary.failed as i64,
                run_id
            ],
        )?;

        if updated == 0 {
            return Err(StorageError::RunNotFound(run_id));
        }
        Ok(())
    }

    fn get_run(&self, run_id: i64) -> StorageResult<RunRecord> {
        let sql = format!("SELECT {} FROM runs WHERE id = ?1", RUN_COLUMNS);
        self.conn
            .query_row(&sql, params![run_id], run_from_row)
            .optional()?
            .ok_or(StorageError::RunNotFound(run_id))
    }

    fn get_latest_run(&self) -> StorageResult<Option<RunRecord>> {
        let sql = format!("SELECT {} FROM runs ORDER BY id DESC LIMIT 1", RUN_COLUMNS);
        let run = self.conn.query_row(&sql, [], run_from_row).optional()?;
        Ok(run)
    }

    fn record_failure(
        &mut self,
        run_id: i64,
        incident: Option<&IncidentId>,
        category: Option<&str>,
        error: &str,
    ) -> StorageResult<()> {
        let now = Utc::now().to_rfc3339();
        self.conn.execute(
            "INSERT INTO crawl_failures (run_id, incident_num, category, error, recorded_at)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![run_id, incident.map(|id| id.as_str()), category, error, now],
        )?;
        Ok(())
    }

    fn get_failures(&self, run_id: i64) -> StorageResult<Vec<FailureRecord>> {
        let mut stmt = self.conn.prepare(
            "SELECT run_id, incident_num, category, error, recorded_at
             FROM crawl_failures WHERE run_id = ?1 ORDER BY id ASC",
        )?;

        let failures = stmt
            .query_map(params![run_id], |row| {
                Ok(FailureRecord {
                    run_id: row.get(0)?,
                    incident_num: row.get(1)?,
                    category: row.get(2)?,
                    error: row.get(3)?,
                    recorded_at: row.get(4)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(failures)
    }
}
