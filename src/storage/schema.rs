//! Database schema definitions
//!
//! This module contains all SQL schema definitions for the record database.

/// SQL schema for the database
pub const SCHEMA_SQL: &str = r#"
-- Track crawl runs
CREATE TABLE IF NOT EXISTS runs (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    started_at TEXT NOT NULL,
    finished_at TEXT,
    config_hash TEXT NOT NULL,
    status TEXT NOT NULL,
    persisted INTEGER NOT NULL DEFAULT 0,
    skipped INTEGER NOT NULL DEFAULT 0,
    failed INTEGER NOT NULL DEFAULT 0
);

-- One row per incident; presence means the incident is processed
CREATE TABLE IF NOT EXISTS crashes (
    incident_num TEXT PRIMARY KEY,
    investigated_by TEXT NOT NULL,
    gps_latitude TEXT NOT NULL,
    gps_longitude TEXT NOT NULL,
    date TEXT NOT NULL,
    time TEXT NOT NULL,
    county TEXT NOT NULL,
    location TEXT NOT NULL,
    troop TEXT NOT NULL,
    misc_info TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS vehicles (
    incident_num TEXT NOT NULL REFERENCES crashes(incident_num),
    vehicle_num INTEGER NOT NULL,
    description TEXT NOT NULL,
    damage TEXT NOT NULL,
    disposition TEXT NOT NULL,
    driver_name TEXT NOT NULL,
    driver_gender TEXT NOT NULL,
    driver_age TEXT NOT NULL,
    safety_device TEXT NOT NULL,
    driver_city_state TEXT NOT NULL,
    driver_insurance TEXT NOT NULL,
    direction TEXT NOT NULL,
    PRIMARY KEY (incident_num, vehicle_num)
);

CREATE TABLE IF NOT EXISTS injuries (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    incident_num TEXT NOT NULL REFERENCES crashes(incident_num),
    vehicle_num TEXT NOT NULL,
    name TEXT NOT NULL,
    gender TEXT NOT NULL,
    age TEXT NOT NULL,
    injury_type TEXT NOT NULL,
    safety_device TEXT NOT NULL,
    city_state TEXT NOT NULL,
    involvement TEXT NOT NULL,
    disposition TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_injuries_incident ON injuries(incident_num);

-- Failures recorded per run so none are dropped silently
CREATE TABLE IF NOT EXISTS crawl_failures (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    run_id INTEGER NOT NULL REFERENCES runs(id),
    incident_num TEXT,
    category TEXT,
    error TEXT NOT NULL,
    recorded_at TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_crawl_failures_run ON crawl_failures(run_id);
"#;

/// Initializes the database schema
pub fn initialize_schema(conn: &rusqlite::Connection) -> Result<(), rusqlite::Error> {
    conn.execute_batch(SCHEMA_SQL)?;
    Ok(())
}
