//! SQLite end-to-end scan tests.
//!
//! This test suite covers:
//! - A full scan of an in-memory database through the SQLite connector
//! - Key constraints and type mapping in emitted schemas
//! - Profiling with the bundled SQLite profiler
//! - JSON-lines output and file-backed run state
//!
//! Note: SQLite tests use in-memory databases, so no containers needed.

#![cfg(feature = "sqlite")]

use lakescout_core::adapters::sqlite::SqliteConnector;
use lakescout_core::config::{ProfilingConfig, ScanConfig, StatefulIngestionConfig};
use lakescout_core::models::CanonicalType;
use lakescout_core::scanner::ScannerBuilder;
use lakescout_core::sink::JsonLinesSink;
use lakescout_core::state::{FileStateStore, StateStore};
use lakescout_core::workunit::{Aspect, DatasetSnapshot, WorkUnit};
use lakescout_core::{Connector, Result};
use sqlx::SqlitePool;
use std::sync::Arc;

const LIBRARY: &[&str] = &[
    "CREATE TABLE authors (
        id INTEGER PRIMARY KEY,
        name TEXT NOT NULL
    )",
    "CREATE TABLE books (
        id INTEGER,
        edition INTEGER,
        title VARCHAR(200) NOT NULL,
        author_id INTEGER REFERENCES authors (id),
        notes,
        PRIMARY KEY (id, edition)
    )",
    "CREATE VIEW recent_books AS SELECT id, title FROM books WHERE edition > 1",
    "INSERT INTO authors (id, name) VALUES (1, 'Ada'), (2, 'Grace')",
    "INSERT INTO books VALUES (1, 1, 'Notes', 1, NULL), (1, 2, 'Notes', 1, NULL)",
];

/// Helper function to create an in-memory database holding the library schema
async fn library_pool() -> Result<SqlitePool> {
    let pool = sqlx::sqlite::SqlitePoolOptions::new()
        .max_connections(1)
        .idle_timeout(None)
        .max_lifetime(None)
        .connect("sqlite::memory:")
        .await
        .unwrap();
    for statement in LIBRARY {
        sqlx::query(statement).execute(&pool).await.unwrap();
    }
    Ok(pool)
}

async fn library_connector() -> Result<Box<dyn Connector>> {
    Ok(Box::new(SqliteConnector::from_pool(
        library_pool().await?,
        "library.db",
    )))
}

fn dataset_urn(name: &str) -> String {
    format!("urn:li:dataset:(urn:li:dataPlatform:sqlite,{name},PROD)")
}

fn snapshot<'a>(units: &'a [WorkUnit], urn: &str) -> &'a DatasetSnapshot {
    units
        .iter()
        .find_map(|u| match &u.aspect {
            Aspect::DatasetSnapshot(s) if u.entity_urn == urn => Some(s),
            _ => None,
        })
        .unwrap()
}

// =============================================================================
// Scan Tests
// =============================================================================

#[tokio::test]
async fn test_sqlite_full_scan() -> Result<()> {
    let mut scanner = ScannerBuilder::new(library_connector().await?, ScanConfig::new()).build()?;
    let units = scanner.collect_work_units().await?;

    let containers: Vec<&str> = units
        .iter()
        .filter_map(|u| match &u.aspect {
            Aspect::ContainerProperties { name, .. } => Some(name.as_str()),
            _ => None,
        })
        .collect();
    assert_eq!(containers, vec!["library.db", "main"]);

    let books = snapshot(&units, &dataset_urn("main.books"));
    let schema = books.schema.as_ref().unwrap();
    let columns: Vec<(&str, CanonicalType, bool)> = schema
        .columns
        .iter()
        .map(|c| (c.name.as_str(), c.canonical_type, c.is_part_of_key))
        .collect();
    assert_eq!(
        columns,
        vec![
            ("id", CanonicalType::Number, true),
            ("edition", CanonicalType::Number, true),
            ("title", CanonicalType::String, false),
            ("author_id", CanonicalType::Number, false),
            ("notes", CanonicalType::Unknown, false),
        ]
    );
    assert_eq!(schema.columns[2].native_data_type(), "VARCHAR(200)");

    assert_eq!(schema.foreign_keys.len(), 1);
    let fk = &schema.foreign_keys[0];
    assert_eq!(fk.foreign_dataset, dataset_urn("main.authors"));
    assert_eq!(
        fk.source_fields,
        vec![format!(
            "urn:li:schemaField:({},author_id)",
            dataset_urn("main.books")
        )]
    );
    assert_eq!(
        fk.foreign_fields,
        vec![format!("urn:li:schemaField:({},id)", dataset_urn("main.authors"))]
    );

    let view = snapshot(&units, &dataset_urn("main.recent_books"));
    assert_eq!(
        view.properties.custom_properties.get("is_view").map(String::as_str),
        Some("True")
    );
    assert!(
        view.properties.custom_properties["view_definition"].starts_with("CREATE VIEW recent_books")
    );

    let report = scanner.report();
    assert_eq!(report.tables_scanned, 2);
    assert_eq!(report.views_scanned, 1);
    // Untyped columns are known-unknown and do not warn
    assert!(report.warnings.get("main.books").is_none());
    Ok(())
}

#[tokio::test]
async fn test_sqlite_profiling() -> Result<()> {
    let config = ScanConfig::new().with_profiling(ProfilingConfig::new().with_enabled(true));
    let mut scanner = ScannerBuilder::new(library_connector().await?, config).build()?;
    let units = scanner.collect_work_units().await?;

    let mut profiles: Vec<(&str, Option<u64>)> = units
        .iter()
        .filter_map(|u| match &u.aspect {
            Aspect::DatasetProfile(p) => Some((u.entity_urn.as_str(), p.row_count)),
            _ => None,
        })
        .collect();
    profiles.sort();

    let authors = dataset_urn("main.authors");
    let books = dataset_urn("main.books");
    assert_eq!(
        profiles,
        vec![(authors.as_str(), Some(2)), (books.as_str(), Some(2))]
    );
    assert_eq!(scanner.report().entities_profiled, 2);
    Ok(())
}

#[tokio::test]
async fn test_sqlite_scan_to_jsonl_with_file_state() -> Result<()> {
    let dir = tempfile::tempdir().unwrap();
    let store = Arc::new(FileStateStore::new(dir.path().join("state")));
    let output = dir.path().join("units.jsonl");
    let config = ScanConfig::new().with_stateful_ingestion(StatefulIngestionConfig {
        enabled: true,
        remove_stale_metadata: true,
    });

    let mut scanner = ScannerBuilder::new(library_connector().await?, config)
        .with_state_store(store.clone())
        .build()?;
    let units = scanner.collect_work_units().await?;

    let mut sink = JsonLinesSink::create(&output).await?;
    for unit in &units {
        sink.write(unit).await?;
    }
    assert_eq!(sink.finish().await?, units.len() as u64);

    let content = std::fs::read_to_string(&output).unwrap();
    assert_eq!(content.lines().count(), units.len());
    let first: serde_json::Value = serde_json::from_str(content.lines().next().unwrap()).unwrap();
    assert_eq!(first["aspect"], "containerProperties");
    assert_eq!(first["value"]["name"], "library.db");

    let saved = store.load(scanner.state_key()).await?.unwrap();
    assert!(saved.contains(&dataset_urn("main.books")));
    assert!(saved.contains(&dataset_urn("main.recent_books")));
    assert!(store.path_for(scanner.state_key()).exists());
    Ok(())
}
