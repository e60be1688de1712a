use crate::app_state::AppState;
use crate::db::Database;

use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::SqlitePool;
use std::path::Path;
use std::str::FromStr;
use std::sync::Arc;

/// Small biodiversity dataset.
///
/// * `BB_940` holds counts `[5, 0, 3, 2]` for OTUs 1 to 4.
/// * `BB_941` has a tie between OTUs 2 and 3.
/// * `BB_999` has no counts above 1 and no metadata row.
/// * `BB_943` holds a real and a text count despite its INTEGER affinity.
/// * Sample 941 has a real `AGE` and a NULL `WFREQ`.
/// * Sample 943 has a text `AGE`.
const FIXTURE: &str = r#"
CREATE TABLE otu (
    otu_id INTEGER PRIMARY KEY,
    lowest_taxonomic_unit_found TEXT
);
INSERT INTO otu VALUES
    (1, 'Bacteria'),
    (2, 'Bacteria;Firmicutes'),
    (3, 'Bacteria'),
    (4, NULL);

CREATE TABLE samples (
    otu_id INTEGER PRIMARY KEY,
    BB_940 INTEGER,
    BB_941 INTEGER,
    BB_999 INTEGER,
    BB_943 INTEGER
);
INSERT INTO samples VALUES
    (1, 5, 0, 1, 4),
    (2, 0, 3, NULL, 2.5),
    (3, 3, 3, 0, 'n/a'),
    (4, 2, 1, 0, NULL);

CREATE TABLE samples_metadata (
    SAMPLEID INTEGER,
    EVENT TEXT,
    ETHNICITY TEXT,
    GENDER TEXT,
    AGE INTEGER,
    BBTYPE TEXT,
    LOCATION TEXT,
    WFREQ REAL
);
INSERT INTO samples_metadata VALUES
    (940, 'BellyButtonsScience', 'Caucasian', 'F', 24, 'tap', 'Beaufort/NC', 2),
    (941, 'BellyButtonsScience', 'Asian', 'M', 34.5, 'I', 'Chicago/IL', NULL),
    (942, 'BellyButtonsScience', 'Hispanic', 'F', 40, 'O', 'Raleigh/NC', 3.7),
    (943, 'BellyButtonsScience', 'Asian', 'F', 'unknown', 'I', 'Durham/NC', 1);
"#;

/// Create a pool over a fresh, empty in-memory database.
///
/// The pool holds its single connection for its whole lifetime so the database is not dropped.
pub(crate) async fn empty_pool() -> SqlitePool {
    let options = SqliteConnectOptions::from_str("sqlite::memory:").unwrap();
    SqlitePoolOptions::new()
        .max_connections(1)
        .idle_timeout(None)
        .max_lifetime(None)
        .connect_with(options)
        .await
        .unwrap()
}

/// Create a [Database] over the fixture dataset.
pub(crate) async fn database() -> Database {
    let pool = empty_pool().await;
    sqlx::raw_sql(FIXTURE).execute(&pool).await.unwrap();
    Database::from_pool(pool).await.unwrap()
}

/// Create shared application state over the fixture dataset.
pub(crate) async fn app_state() -> Arc<AppState> {
    Arc::new(AppState::new(database().await))
}

/// Write the fixture dataset to a new SQLite file at `path`.
pub(crate) async fn write_fixture(path: &Path) {
    let options = SqliteConnectOptions::new()
        .filename(path)
        .create_if_missing(true);
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect_with(options)
        .await
        .unwrap();
    sqlx::raw_sql(FIXTURE).execute(&pool).await.unwrap();
    pool.close().await;
}
