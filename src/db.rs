//! Read-only access to the biodiversity SQLite store.
//!
//! The store is opened once at startup behind a connection pool. Every query method borrows a
//! pooled connection for the duration of one request and returns it when the method returns.

use crate::cli::CommandLineArgs;
use crate::error::BiodiversityError;
use crate::models::{Number, SampleMetadata};
use crate::schema::{self, ColumnInfo, OTU_ID};

use expanduser::expanduser;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions, SqliteRow};
use sqlx::{FromRow, Row, SqliteConnection, SqlitePool, TypeInfo, ValueRef};
use std::time::Duration;
use tracing::info;

/// Database handle with connection pool.
#[derive(Clone, Debug)]
pub struct Database {
    pool: SqlitePool,
}

impl Database {
    /// Open the database named on the command line in read-only mode and check its schema.
    pub async fn open(args: &CommandLineArgs) -> Result<Self, BiodiversityError> {
        let path = expanduser(&args.database).map_err(sqlx::Error::Io)?;

        let options = SqliteConnectOptions::new()
            .filename(&path)
            .read_only(true)
            .create_if_missing(false);

        let pool = SqlitePoolOptions::new()
            .max_connections(args.connection_limit)
            .acquire_timeout(Duration::from_secs(args.acquire_timeout))
            .test_before_acquire(true)
            .connect_with(options)
            .await?;

        info!(path = %path.display(), "Database connected");

        Self::from_pool(pool).await
    }

    /// Wrap an existing pool, checking the store against the schema contract.
    pub async fn from_pool(pool: SqlitePool) -> Result<Self, BiodiversityError> {
        let database = Self { pool };
        database.validate_schema().await?;
        Ok(database)
    }

    /// Check store integrity and compare every table against its contract.
    async fn validate_schema(&self) -> Result<(), BiodiversityError> {
        let mut conn = self.pool.acquire().await?;

        let integrity: String = sqlx::query_scalar("PRAGMA quick_check")
            .fetch_one(&mut *conn)
            .await?;
        if integrity != "ok" {
            tracing::error!(integrity_check = %integrity, "Database integrity check failed");
            return Err(sqlx::Error::Io(std::io::Error::new(
                std::io::ErrorKind::InvalidData,
                format!("Database integrity check failed: {}", integrity),
            ))
            .into());
        }

        for table in schema::TABLES {
            let columns = table_columns(&mut conn, table.name).await?;
            schema::check(table, &columns)?;
        }

        info!("Database schema checked");
        Ok(())
    }

    /// Columns of the count matrix in declaration order.
    pub async fn sample_columns(&self) -> Result<Vec<ColumnInfo>, BiodiversityError> {
        let mut conn = self.pool.acquire().await?;
        table_columns(&mut conn, schema::SAMPLES.name).await
    }

    /// Description of every taxonomic unit in storage order.
    pub async fn otu_descriptions(&self) -> Result<Vec<Option<String>>, BiodiversityError> {
        let descriptions: Vec<Option<String>> =
            sqlx::query_scalar("SELECT lowest_taxonomic_unit_found FROM otu")
                .fetch_all(&self.pool)
                .await?;
        Ok(descriptions)
    }

    /// `(otu_id, description)` for every taxonomic unit in storage order.
    pub async fn otu_catalog(&self) -> Result<Vec<(i64, Option<String>)>, BiodiversityError> {
        let catalog = sqlx::query_as::<_, (i64, Option<String>)>(
            "SELECT otu_id, lowest_taxonomic_unit_found FROM otu",
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(catalog)
    }

    /// `(otu_id, count)` for every row of the count matrix, for one sample column.
    ///
    /// Counts keep their storage class. A value that is not numeric reads as NULL.
    ///
    /// # Arguments
    ///
    /// * `sample`: Sample name, which must exactly match a sample column
    pub async fn sample_counts(
        &self,
        sample: &str,
    ) -> Result<Vec<(i64, Option<Number>)>, BiodiversityError> {
        let mut conn = self.pool.acquire().await?;

        let columns = table_columns(&mut conn, schema::SAMPLES.name).await?;
        if sample == OTU_ID || !columns.iter().any(|column| column.name == sample) {
            return Err(BiodiversityError::SampleNotFound {
                sample: sample.to_string(),
            });
        }

        // The identifier is a known column name, so quoting it is sufficient.
        let query = format!(
            "SELECT {}, \"{}\" AS count FROM {}",
            OTU_ID,
            sample.replace('"', "\"\""),
            schema::SAMPLES.name
        );
        let rows = sqlx::query(&query)
            .try_map(|row: SqliteRow| Ok((row.try_get(OTU_ID)?, number(&row, "count")?)))
            .fetch_all(&mut *conn)
            .await?;
        Ok(rows)
    }

    /// Metadata rows whose `SAMPLEID` equals `sample_id`, in storage order.
    pub async fn sample_metadata(
        &self,
        sample_id: i64,
    ) -> Result<Vec<SampleMetadata>, BiodiversityError> {
        let rows = sqlx::query_as::<_, SampleMetadata>(
            r#"
            SELECT SAMPLEID, ETHNICITY, GENDER, AGE, LOCATION, BBTYPE
            FROM samples_metadata
            WHERE SAMPLEID = ?
            "#,
        )
        .bind(sample_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    /// `WFREQ` of each metadata row whose `SAMPLEID` equals `sample_id`, truncated to an integer.
    pub async fn wash_frequencies(
        &self,
        sample_id: i64,
    ) -> Result<Vec<Option<i64>>, BiodiversityError> {
        let values: Vec<Option<i64>> = sqlx::query_scalar(
            "SELECT CAST(WFREQ AS INTEGER) FROM samples_metadata WHERE SAMPLEID = ?",
        )
        .bind(sample_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(values)
    }
}

/// Columns of a table as reported by SQLite, in declaration order.
///
/// Returns an empty vector if the table does not exist.
async fn table_columns(
    conn: &mut SqliteConnection,
    table: &str,
) -> Result<Vec<ColumnInfo>, BiodiversityError> {
    let columns = sqlx::query_as::<_, ColumnInfo>(
        "SELECT name, type FROM pragma_table_info(?) ORDER BY cid",
    )
    .bind(table)
    .fetch_all(conn)
    .await?;
    Ok(columns)
}

/// Read a numeric column by the storage class of its value.
///
/// Integers stay integers and reals stay reals. SQLite keeps text or blobs it cannot convert
/// even in a numeric column; those read as NULL and are logged.
fn number(row: &SqliteRow, column: &str) -> Result<Option<Number>, sqlx::Error> {
    let class = {
        let value = row.try_get_raw(column)?;
        if value.is_null() {
            return Ok(None);
        }
        value.type_info().name().to_string()
    };
    match class.as_str() {
        "INTEGER" => Ok(Some(Number::Integer(row.try_get(column)?))),
        "REAL" => Ok(Some(Number::Real(row.try_get(column)?))),
        _ => {
            tracing::warn!(column, storage_class = %class, "non-numeric value read as null");
            Ok(None)
        }
    }
}

impl<'r> FromRow<'r, SqliteRow> for SampleMetadata {
    fn from_row(row: &'r SqliteRow) -> Result<Self, sqlx::Error> {
        Ok(SampleMetadata {
            sample_id: row.try_get("SAMPLEID")?,
            ethnicity: row.try_get("ETHNICITY")?,
            gender: row.try_get("GENDER")?,
            age: number(row, "AGE")?,
            location: row.try_get("LOCATION")?,
            bb_type: row.try_get("BBTYPE")?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::test_utils;

    #[tokio::test]
    async fn columns_in_declaration_order() {
        let db = test_utils::database().await;
        let names: Vec<String> = db
            .sample_columns()
            .await
            .unwrap()
            .into_iter()
            .map(|column| column.name)
            .collect();
        assert_eq!(vec!["otu_id", "BB_940", "BB_941", "BB_999", "BB_943"], names);
    }

    #[tokio::test]
    async fn descriptions_in_storage_order() {
        let db = test_utils::database().await;
        let descriptions = db.otu_descriptions().await.unwrap();
        assert_eq!(
            vec![
                Some("Bacteria".to_string()),
                Some("Bacteria;Firmicutes".to_string()),
                Some("Bacteria".to_string()),
                None,
            ],
            descriptions
        );
    }

    #[tokio::test]
    async fn counts_for_sample() {
        let db = test_utils::database().await;
        let rows = db.sample_counts("BB_940").await.unwrap();
        assert_eq!(
            vec![
                (1, Some(Number::Integer(5))),
                (2, Some(Number::Integer(0))),
                (3, Some(Number::Integer(3))),
                (4, Some(Number::Integer(2))),
            ],
            rows
        );
    }

    #[tokio::test]
    async fn counts_keep_storage_class() {
        let db = test_utils::database().await;
        let rows = db.sample_counts("BB_943").await.unwrap();
        assert_eq!(
            vec![
                (1, Some(Number::Integer(4))),
                (2, Some(Number::Real(2.5))),
                (3, None),
                (4, None),
            ],
            rows
        );
    }

    #[tokio::test]
    async fn catalog_pairs_ids_and_descriptions() {
        let db = test_utils::database().await;
        let catalog = db.otu_catalog().await.unwrap();
        assert_eq!(
            vec![
                (1, Some("Bacteria".to_string())),
                (2, Some("Bacteria;Firmicutes".to_string())),
                (3, Some("Bacteria".to_string())),
                (4, None),
            ],
            catalog
        );
    }

    #[tokio::test]
    async fn counts_unknown_sample() {
        let db = test_utils::database().await;
        for sample in ["BB_1", "otu_id", "bb_940", "BB_940\" FROM otu --"] {
            match db.sample_counts(sample).await {
                Err(BiodiversityError::SampleNotFound { sample: s }) => assert_eq!(sample, s),
                other => panic!("unexpected result {:?}", other),
            }
        }
    }

    #[tokio::test]
    async fn metadata_integer_and_real_age() {
        let db = test_utils::database().await;
        let rows = db.sample_metadata(940).await.unwrap();
        assert_eq!(1, rows.len());
        assert_eq!(Some(Number::Integer(24)), rows[0].age);
        let rows = db.sample_metadata(941).await.unwrap();
        assert_eq!(Some(Number::Real(34.5)), rows[0].age);
        assert!(db.sample_metadata(999).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn metadata_text_age_reads_as_null() {
        let db = test_utils::database().await;
        let rows = db.sample_metadata(943).await.unwrap();
        assert_eq!(1, rows.len());
        assert_eq!(None, rows[0].age);
        assert_eq!(Some("Asian".to_string()), rows[0].ethnicity);
    }

    #[tokio::test]
    async fn wash_frequency_values() {
        let db = test_utils::database().await;
        assert_eq!(vec![Some(2)], db.wash_frequencies(940).await.unwrap());
        assert_eq!(vec![None], db.wash_frequencies(941).await.unwrap());
        assert_eq!(vec![Some(3)], db.wash_frequencies(942).await.unwrap());
        assert_eq!(vec![Some(1)], db.wash_frequencies(943).await.unwrap());
        assert!(db.wash_frequencies(999).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn schema_mismatch_rejected() {
        let pool = test_utils::empty_pool().await;
        sqlx::query("CREATE TABLE otu (otu_id INTEGER PRIMARY KEY)")
            .execute(&pool)
            .await
            .unwrap();
        match Database::from_pool(pool).await {
            Err(BiodiversityError::SchemaMismatch { table, reason }) => {
                assert_eq!("otu", table);
                assert_eq!("column lowest_taxonomic_unit_found is missing", reason);
            }
            other => panic!("unexpected result {:?}", other),
        }
    }

    fn args(database: &str) -> CommandLineArgs {
        use clap::Parser;
        CommandLineArgs::try_parse_from([
            "bellybutton",
            "--database",
            database,
            "--acquire-timeout",
            "1",
        ])
        .unwrap()
    }

    #[tokio::test]
    async fn open_file_read_only() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("biodiversity.sqlite");
        test_utils::write_fixture(&path).await;

        let db = Database::open(&args(path.to_str().unwrap())).await.unwrap();
        assert_eq!(5, db.sample_columns().await.unwrap().len());
        let result = sqlx::query("DELETE FROM otu").execute(&db.pool).await;
        assert!(result.is_err());
        assert_eq!(4, db.otu_descriptions().await.unwrap().len());
    }

    #[tokio::test]
    async fn open_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing.sqlite");
        let result = Database::open(&args(path.to_str().unwrap())).await;
        assert!(matches!(result, Err(BiodiversityError::Database(_))));
        assert!(!path.exists());
    }
}
