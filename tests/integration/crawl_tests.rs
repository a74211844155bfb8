//! Integration tests for the harvester
//!
//! These tests use wiremock to stand in for the reporting portal and run
//! complete harvests end-to-end against temporary databases.

use crash_harvest::config::{
    CacheConfig, ClientConfig, Config, CrawlerConfig, OutputConfig, SourceConfig,
};
use crash_harvest::crawler::crawl;
use crash_harvest::storage::{RecordStore, RunStatus, SqliteStorage};
use crash_harvest::{HarvestError, IncidentId, RunSummary};
use std::path::{Path, PathBuf};
use tempfile::TempDir;
use wiremock::matchers::{body_string_contains, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Creates a test configuration pointing at the mock portal
fn create_test_config(base_url: &str, db_path: &Path, cache_path: &Path) -> Config {
    Config {
        source: SourceConfig {
            search_url: format!("{}/HP68/SearchAction", base_url),
            detail_url: format!("{}/HP68/AccidentDetailsAction", base_url),
            id_param: "ACC_RPT_NUM".to_string(),
            category_field: "searchInjury".to_string(),
        },
        client: ClientConfig {
            user_agent: "TestBot/1.0".to_string(),
            timeout_secs: 5,
        },
        crawler: CrawlerConfig {
            request_delay_ms: 0, // No pacing in tests
            retry_attempts: 0,
            retry_delay_ms: 10,
        },
        cache: CacheConfig {
            path: cache_path.to_string_lossy().into_owned(),
            ttl_hours: 24,
        },
        output: OutputConfig {
            database_path: db_path.to_string_lossy().into_owned(),
        },
    }
}

struct Workspace {
    _dir: TempDir,
    db_path: PathBuf,
    cache_path: PathBuf,
}

fn workspace() -> Workspace {
    let dir = TempDir::new().expect("Failed to create temp dir");
    let db_path = dir.path().join("crashes.db");
    let cache_path = dir.path().join("http_cache.db");
    Workspace {
        _dir: dir,
        db_path,
        cache_path,
    }
}

fn catalog_page(categories: &[&str]) -> String {
    let options: String = categories
        .iter()
        .map(|c| format!(r#"<option value="{c}">{c}</option>"#))
        .collect();
    format!(
        r#"<html><body><form action="SearchAction" method="post">
        <select id="injuryType" name="searchInjury"><option value="">-- Select --</option>{}</select>
        </form></body></html>"#,
        options
    )
}

fn listing_page(ids: &[&str]) -> String {
    let rows: String = ids
        .iter()
        .map(|id| {
            format!(
                r#"<tr><td><a href="AccidentDetailsAction?ACC_RPT_NUM={id}">{id}</a></td><td>DOE, JOHN</td></tr>"#
            )
        })
        .collect();
    format!(
        "<html><body><table><tr><th>Report</th><th>Name</th></tr>{}</table></body></html>",
        rows
    )
}

fn vehicle_row(num: usize) -> String {
    format!(
        "<tr><td>{num}</td><td>2010 FORD F150</td><td>EXTENSIVE</td><td>TOWED</td>\
         <td>DRIVER {num}</td><td>MALE</td><td>45</td><td>YES</td>\
         <td>SPRINGFIELD, MO</td><td>STATE FARM</td><td>EASTBOUND</td></tr>"
    )
}

fn injury_row(vehicle: usize) -> String {
    format!(
        "<tr><td>{vehicle}</td><td>JANE ROE</td><td>FEMALE</td><td>33</td><td>MINOR</td>\
         <td>YES</td><td>COLUMBIA, MO</td><td>DRIVER</td><td>BY EMS TO HOSPITAL</td></tr>"
    )
}

fn report_page(id: &str, vehicles: usize, injuries: usize, with_injury_section: bool) -> String {
    let vehicle_rows: String = (1..=vehicles).map(vehicle_row).collect();
    let injury_rows: String = (1..=injuries).map(injury_row).collect();
    let injury_section = if with_injury_section {
        format!(
            r#"<table class="accidentOutput"><caption>Injury Information</caption>
            <tr><th>Veh.</th><th>Name</th><th>Gender</th><th>Age</th><th>Injury</th>
            <th>Safety Device</th><th>City/State</th><th>Involvement</th><th>Disposition</th></tr>
            {}</table>"#,
            injury_rows
        )
    } else {
        String::new()
    };

    format!(
        r#"<html><body>
        <table class="accidentOutput"><caption>Crash Information</caption>
            <tr><th>Report</th><th>Investigated By</th><th>Lat</th><th>Long</th><th>Date</th>
            <th>Time</th><th>County</th><th>Location</th><th>Troop</th></tr>
            <tr><td>{id}</td><td>TPR J SMITH</td><td>38.5767</td><td>-92.1735</td>
            <td>01/02/2021</td><td>7:15AM</td><td>COLE</td><td>US 50</td><td>F</td></tr>
        </table>
        <table class="accidentOutput"><caption>Vehicle Information</caption>
            <tr><th>Veh.</th><th>Description</th><th>Damage</th><th>Disposition</th>
            <th>Driver</th><th>Gender</th><th>Age</th><th>Safety Device</th>
            <th>City/State</th><th>Insurance</th><th>Direction</th></tr>
            {vehicle_rows}
        </table>
        {injury_section}
        <table class="accidentOutput"><caption>Misc Information</caption>
            <tr><td>Dry pavement</td></tr>
        </table>
        </body></html>"#
    )
}

async fn mount_catalog(server: &MockServer, categories: &[&str]) {
    Mock::given(method("GET"))
        .and(path("/HP68/SearchAction"))
        .respond_with(ResponseTemplate::new(200).set_body_string(catalog_page(categories)))
        .mount(server)
        .await;
}

async fn mount_listing(server: &MockServer, category: &str, ids: &[&str]) {
    Mock::given(method("POST"))
        .and(path("/HP68/SearchAction"))
        .and(body_string_contains(format!("searchInjury={}", category)))
        .respond_with(ResponseTemplate::new(200).set_body_string(listing_page(ids)))
        .mount(server)
        .await;
}

/// Mounts a detail page that must be requested exactly `expected` times
async fn mount_report(server: &MockServer, id: &str, body: String, expected: u64) {
    Mock::given(method("GET"))
        .and(path("/HP68/AccidentDetailsAction"))
        .and(query_param("ACC_RPT_NUM", id))
        .respond_with(ResponseTemplate::new(200).set_body_string(body))
        .expect(expected)
        .mount(server)
        .await;
}

fn open_store(ws: &Workspace) -> SqliteStorage {
    SqliteStorage::new(&ws.db_path).expect("Failed to open record store")
}

fn id(raw: &str) -> IncidentId {
    IncidentId::new(raw).unwrap()
}

#[tokio::test]
async fn test_example_incident_is_stored() {
    let server = MockServer::start().await;
    mount_catalog(&server, &["FATAL"]).await;
    mount_listing(&server, "FATAL", &["AB123", "AB123", "CD456"]).await;
    mount_report(&server, "AB123", report_page("AB123", 2, 1, true), 1).await;
    mount_report(&server, "CD456", report_page("CD456", 1, 0, true), 1).await;

    let ws = workspace();
    let config = create_test_config(&server.uri(), &ws.db_path, &ws.cache_path);
    let summary = crawl(config, "hash").await.unwrap();

    assert_eq!(summary.persisted, 2);
    assert_eq!(summary.skipped, 0);
    assert_eq!(summary.failed, 0);

    let store = open_store(&ws);
    let crash = store.get_crash(&id("AB123")).unwrap().unwrap();
    assert_eq!(crash.misc_info, "Dry pavement");
    assert_eq!(crash.county, "COLE");

    let vehicles = store.get_vehicles(&id("AB123")).unwrap();
    let keys: Vec<(String, u32)> = vehicles
        .iter()
        .map(|v| (v.incident_num.clone(), v.vehicle_num))
        .collect();
    assert_eq!(
        keys,
        vec![("AB123".to_string(), 1), ("AB123".to_string(), 2)]
    );
    assert_eq!(vehicles[1].driver_name, "DRIVER 2");

    let injuries = store.get_injuries(&id("AB123")).unwrap();
    assert_eq!(injuries.len(), 1);
    assert_eq!(injuries[0].vehicle_num, "1");

    assert!(store.get_injuries(&id("CD456")).unwrap().is_empty());

    let run = store.get_latest_run().unwrap().unwrap();
    assert_eq!(run.status, RunStatus::Completed);
    assert_eq!(run.config_hash, "hash");
    assert_eq!((run.persisted, run.skipped, run.failed), (2, 0, 0));
}

#[tokio::test]
async fn test_second_run_skips_everything() {
    let server = MockServer::start().await;
    mount_catalog(&server, &["FATAL"]).await;
    mount_listing(&server, "FATAL", &["AB123", "CD456"]).await;
    mount_report(&server, "AB123", report_page("AB123", 2, 1, true), 1).await;
    mount_report(&server, "CD456", report_page("CD456", 1, 1, true), 1).await;

    let ws = workspace();
    let config = create_test_config(&server.uri(), &ws.db_path, &ws.cache_path);

    let first = crawl(config.clone(), "hash").await.unwrap();
    assert_eq!(first.persisted, 2);
    let (ids_after_first, vehicles_after_first) = {
        let store = open_store(&ws);
        (store.incident_ids().unwrap(), store.count_vehicles().unwrap())
    };

    let second = crawl(config, "hash").await.unwrap();
    assert_eq!(
        second,
        RunSummary {
            persisted: 0,
            skipped: 2,
            failed: 0,
            failed_categories: vec![],
        }
    );

    let store = open_store(&ws);
    assert_eq!(store.incident_ids().unwrap(), ids_after_first);
    assert_eq!(store.count_vehicles().unwrap(), vehicles_after_first);
    assert_eq!(store.count_crashes().unwrap(), 2);
}

#[tokio::test]
async fn test_incident_in_two_categories_is_stored_once() {
    let server = MockServer::start().await;
    mount_catalog(&server, &["FATAL", "SERIOUS"]).await;
    mount_listing(&server, "FATAL", &["AB123", "CD456"]).await;
    mount_listing(&server, "SERIOUS", &["AB123"]).await;
    mount_report(&server, "AB123", report_page("AB123", 1, 1, true), 1).await;
    mount_report(&server, "CD456", report_page("CD456", 1, 1, true), 1).await;

    let ws = workspace();
    let config = create_test_config(&server.uri(), &ws.db_path, &ws.cache_path);
    let summary = crawl(config, "hash").await.unwrap();

    assert_eq!(summary.persisted, 2);
    assert_eq!(summary.skipped, 1);
    assert_eq!(summary.failed, 0);

    let store = open_store(&ws);
    assert_eq!(store.incident_ids().unwrap(), vec![id("AB123"), id("CD456")]);
    assert_eq!(store.count_crashes().unwrap(), 2);
}

#[tokio::test]
async fn test_malformed_report_fails_only_that_incident() {
    let server = MockServer::start().await;
    mount_catalog(&server, &["FATAL"]).await;
    mount_listing(&server, "FATAL", &["AB123", "CD456", "EF789"]).await;
    mount_report(&server, "AB123", report_page("AB123", 1, 1, true), 1).await;
    mount_report(&server, "CD456", report_page("CD456", 1, 1, false), 1).await;
    mount_report(&server, "EF789", report_page("EF789", 2, 0, true), 1).await;

    let ws = workspace();
    let config = create_test_config(&server.uri(), &ws.db_path, &ws.cache_path);
    let summary = crawl(config, "hash").await.unwrap();

    assert_eq!(summary.persisted, 2);
    assert_eq!(summary.failed, 1);
    assert!(!summary.is_clean());

    let store = open_store(&ws);
    assert!(!store.exists(&id("CD456")).unwrap());
    assert!(store.get_vehicles(&id("CD456")).unwrap().is_empty());

    let run = store.get_latest_run().unwrap().unwrap();
    assert_eq!(run.status, RunStatus::Completed);
    let failures = store.get_failures(run.id).unwrap();
    assert_eq!(failures.len(), 1);
    assert_eq!(failures[0].incident_num.as_deref(), Some("CD456"));
    assert_eq!(failures[0].category.as_deref(), Some("FATAL"));
    assert!(failures[0].error.contains("injury"));
}

#[tokio::test]
async fn test_catalog_without_categories_is_fatal() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/HP68/SearchAction"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string("<html><body><p>Down for maintenance</p></body></html>"),
        )
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_string(listing_page(&[])))
        .expect(0)
        .mount(&server)
        .await;

    let ws = workspace();
    let config = create_test_config(&server.uri(), &ws.db_path, &ws.cache_path);
    let err = crawl(config, "hash").await.unwrap_err();
    assert!(matches!(err, HarvestError::CatalogFormat(_)));

    let store = open_store(&ws);
    let run = store.get_latest_run().unwrap().unwrap();
    assert_eq!(run.status, RunStatus::Failed);
    assert_eq!(store.count_crashes().unwrap(), 0);
}

#[tokio::test]
async fn test_empty_listing_is_not_an_error() {
    let server = MockServer::start().await;
    mount_catalog(&server, &["FATAL"]).await;
    mount_listing(&server, "FATAL", &[]).await;

    let ws = workspace();
    let config = create_test_config(&server.uri(), &ws.db_path, &ws.cache_path);
    let summary = crawl(config, "hash").await.unwrap();

    assert_eq!(summary, RunSummary::default());
    assert!(summary.is_clean());
}

#[tokio::test]
async fn test_unavailable_listing_fails_only_that_category() {
    let server = MockServer::start().await;
    mount_catalog(&server, &["FATAL", "SERIOUS"]).await;
    Mock::given(method("POST"))
        .and(path("/HP68/SearchAction"))
        .and(body_string_contains("searchInjury=FATAL"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;
    mount_listing(&server, "SERIOUS", &["AB123"]).await;
    mount_report(&server, "AB123", report_page("AB123", 1, 1, true), 1).await;

    let ws = workspace();
    let config = create_test_config(&server.uri(), &ws.db_path, &ws.cache_path);
    let summary = crawl(config, "hash").await.unwrap();

    assert_eq!(summary.persisted, 1);
    assert_eq!(summary.failed_categories, vec!["FATAL".to_string()]);

    let store = open_store(&ws);
    let run = store.get_latest_run().unwrap().unwrap();
    let failures = store.get_failures(run.id).unwrap();
    assert_eq!(failures.len(), 1);
    assert_eq!(failures[0].incident_num, None);
    assert_eq!(failures[0].category.as_deref(), Some("FATAL"));
}

#[tokio::test]
async fn test_cached_responses_are_not_requested_again() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/HP68/SearchAction"))
        .respond_with(ResponseTemplate::new(200).set_body_string(catalog_page(&["FATAL"])))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/HP68/SearchAction"))
        .and(body_string_contains("searchInjury=FATAL"))
        .respond_with(ResponseTemplate::new(200).set_body_string(listing_page(&["AB123"])))
        .expect(1)
        .mount(&server)
        .await;
    mount_report(&server, "AB123", report_page("AB123", 1, 1, true), 1).await;

    // Two record databases sharing one response cache
    let ws = workspace();
    let other_db = ws.db_path.with_file_name("other.db");

    let first = crawl(
        create_test_config(&server.uri(), &ws.db_path, &ws.cache_path),
        "hash",
    )
    .await
    .unwrap();
    let second = crawl(
        create_test_config(&server.uri(), &other_db, &ws.cache_path),
        "hash",
    )
    .await
    .unwrap();

    assert_eq!(first.persisted, 1);
    assert_eq!(second.persisted, 1);
    let other = SqliteStorage::new(&other_db).unwrap();
    assert_eq!(other.get_vehicles(&id("AB123")).unwrap().len(), 1);
}
