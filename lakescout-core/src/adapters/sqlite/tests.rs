//! Unit tests for the SQLite dialect.
//!
//! These tests verify:
//! - Schema, table and view enumeration
//! - Column, primary key and foreign key introspection
//! - The basic profiler

use super::{SqliteConnector, SqliteInspector, SqliteProfiler, quote_identifier};
use crate::adapters::{Connector, Inspector};
use crate::identity::IdentityContext;
use crate::profiling::{ProfileRequest, Profiler};
use sqlx::SqlitePool;

async fn memory_pool(statements: &[&str]) -> SqlitePool {
    let pool = sqlx::sqlite::SqlitePoolOptions::new()
        .max_connections(1)
        .connect("sqlite::memory:")
        .await
        .unwrap();
    for statement in statements {
        sqlx::query(statement).execute(&pool).await.unwrap();
    }
    pool
}

const LIBRARY: &[&str] = &[
    "CREATE TABLE authors (
        id INTEGER PRIMARY KEY,
        name TEXT NOT NULL
    )",
    "CREATE TABLE books (
        id INTEGER,
        edition INTEGER,
        title VARCHAR(200) NOT NULL,
        author_id INTEGER,
        notes,
        PRIMARY KEY (id, edition),
        FOREIGN KEY (author_id) REFERENCES authors
    )",
    "CREATE VIEW recent_books AS SELECT id, title FROM books WHERE edition > 1",
    "INSERT INTO authors (id, name) VALUES (1, 'Ada'), (2, 'Grace')",
    "INSERT INTO books VALUES (1, 1, 'Notes', 1, NULL), (1, 2, 'Notes', 1, NULL), (2, 1, 'Compilers', 2, 'x')",
];

// =============================================================================
// Connector Tests
// =============================================================================

#[tokio::test]
async fn test_memory_connector() {
    let connector = SqliteConnector::new(":memory:").await.unwrap();
    assert!(connector.is_in_memory());
    assert_eq!(connector.platform(), "sqlite");
    assert_eq!(connector.source_id(), ":memory:");
    connector.test_connection().await.unwrap();

    let inspectors = connector.inspectors().await.unwrap();
    assert_eq!(inspectors.len(), 1);
    assert_eq!(inspectors[0].database_name().await.unwrap(), ":memory:");
    assert!(connector.profiler().is_some());
}

#[test]
fn test_identifier_escaping() {
    assert_eq!(quote_identifier("plain"), "\"plain\"");
    assert_eq!(quote_identifier("we\"ird"), "\"we\"\"ird\"");
}

// =============================================================================
// Inspector Tests
// =============================================================================

#[tokio::test]
async fn test_schemas_tables_and_views() {
    let inspector = SqliteInspector::new(memory_pool(LIBRARY).await, "library.db");

    assert_eq!(inspector.schema_names().await.unwrap(), vec!["main"]);
    assert_eq!(
        inspector.table_names("main").await.unwrap(),
        vec!["authors", "books"]
    );
    assert_eq!(
        inspector.view_names("main").await.unwrap(),
        vec!["recent_books"]
    );
}

#[tokio::test]
async fn test_columns_and_nullability() {
    let inspector = SqliteInspector::new(memory_pool(LIBRARY).await, "library.db");
    let columns = inspector.columns("books", "main").await.unwrap();

    let names: Vec<_> = columns.iter().map(|c| c.name.as_str()).collect();
    assert_eq!(names, vec!["id", "edition", "title", "author_id", "notes"]);

    let id = &columns[0];
    assert!(!id.nullable);

    let title = &columns[2];
    assert_eq!(title.full_type.as_deref(), Some("VARCHAR(200)"));
    assert!(!title.nullable);

    let notes = &columns[4];
    assert_eq!(notes.native_type, "");
    assert!(notes.full_type.is_none());
    assert!(notes.nullable);
}

#[tokio::test]
async fn test_composite_primary_key_is_ordered() {
    let inspector = SqliteInspector::new(memory_pool(LIBRARY).await, "library.db");
    let pk = inspector.primary_key("books", "main").await.unwrap().unwrap();
    assert_eq!(pk.columns, vec!["id", "edition"]);

    assert!(
        inspector
            .primary_key("recent_books", "main")
            .await
            .unwrap()
            .is_none()
    );
}

#[tokio::test]
async fn test_bare_reference_resolves_to_primary_key() {
    let inspector = SqliteInspector::new(memory_pool(LIBRARY).await, "library.db");
    let fks = inspector.foreign_keys("books", "main").await.unwrap();

    assert_eq!(fks.len(), 1);
    let fk = &fks[0];
    assert_eq!(fk.columns, vec!["author_id"]);
    assert_eq!(fk.referred_table, "authors");
    assert_eq!(fk.referred_columns, vec!["id"]);
    assert_eq!(fk.referred_schema.as_deref(), Some("main"));
}

#[tokio::test]
async fn test_view_definition_and_missing_view() {
    let inspector = SqliteInspector::new(memory_pool(LIBRARY).await, "library.db");
    let definition = inspector
        .view_definition("recent_books", "main")
        .await
        .unwrap();
    assert!(definition.starts_with("CREATE VIEW recent_books"));

    assert_eq!(inspector.view_definition("nope", "main").await.unwrap(), "");
}

#[tokio::test]
async fn test_table_properties_are_unsupported() {
    let inspector = SqliteInspector::new(memory_pool(LIBRARY).await, "library.db");
    let err = inspector
        .table_comment_and_properties("books", "main")
        .await
        .unwrap_err();
    assert!(err.is_unsupported());
}

#[tokio::test]
async fn test_database_properties() {
    let inspector = SqliteInspector::new(memory_pool(&[]).await, "library.db");
    let properties = inspector.database_properties("library.db").await.unwrap();
    assert!(properties.contains_key("version"));
    assert_eq!(properties.get("encoding").map(String::as_str), Some("UTF-8"));
}

// =============================================================================
// Profiler Tests
// =============================================================================

fn request(table: &str, custom_sql: Option<&str>) -> ProfileRequest {
    let ctx = IdentityContext::new("sqlite", None, "PROD");
    ProfileRequest {
        identity: ctx.dataset("library.db", "main", &format!("main.{table}")),
        schema: "main".to_string(),
        table: table.to_string(),
        partition: None,
        custom_sql: custom_sql.map(str::to_string),
    }
}

#[tokio::test]
async fn test_profiler_counts() {
    let profiler = SqliteProfiler::new(memory_pool(LIBRARY).await);
    let profile = profiler.profile(&request("books", None)).await.unwrap().unwrap();

    assert_eq!(profile.row_count, Some(3));
    assert_eq!(profile.column_count, Some(5));

    let notes = profile
        .field_profiles
        .iter()
        .find(|f| f.field_path == "notes")
        .unwrap();
    assert_eq!(notes.null_count, Some(2));
    assert_eq!(notes.distinct_count, Some(1));

    let id = profile
        .field_profiles
        .iter()
        .find(|f| f.field_path == "id")
        .unwrap();
    assert_eq!(id.distinct_count, Some(2));
}

#[tokio::test]
async fn test_profiler_uses_custom_sql() {
    let profiler = SqliteProfiler::new(memory_pool(LIBRARY).await);
    let profile = profiler
        .profile(&request("books", Some("SELECT * FROM books WHERE edition = 2")))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(profile.row_count, Some(1));
}

#[tokio::test]
async fn test_profiler_skips_unknown_table() {
    let profiler = SqliteProfiler::new(memory_pool(&[]).await);
    assert!(profiler.profile(&request("missing", None)).await.unwrap().is_none());
}
