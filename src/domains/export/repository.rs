use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::SqlitePool;

use crate::errors::{DomainError, DomainResult};

use super::types::{Exposure, NewExportFile};

/// Persistence seam for the export pipeline: watermark derivation, batch
/// reads, export bookkeeping and retention deletes.
#[async_trait]
pub trait ExposureExportRepository: Send + Sync {
    /// Greatest `last_exposure_id` across all recorded export files, or 0
    /// when nothing has been exported yet. Re-derived from persisted history
    /// on every run; never cached.
    async fn fetch_watermark(&self) -> DomainResult<i64>;

    /// All exposures with `id > since`, ordered byte-lexicographically by
    /// `key_data`. The ordering is a requirement of the export format, not
    /// an optimization.
    async fn fetch_batch(&self, since: i64) -> DomainResult<Vec<Exposure>>;

    /// Record a produced archive. The row's `last_exposure_id` becomes the
    /// watermark for the next run.
    async fn record_export(&self, file: &NewExportFile) -> DomainResult<()>;

    /// Delete exposures created before `cutoff`, returning how many were
    /// removed.
    async fn purge_expired_exposures(&self, cutoff: DateTime<Utc>) -> DomainResult<u64>;

    /// Delete export-file rows created before `cutoff`, returning the storage
    /// paths whose backing objects the caller must remove. The row delete and
    /// the object delete are not transactional with each other.
    async fn purge_expired_files(&self, cutoff: DateTime<Utc>) -> DomainResult<Vec<String>>;
}

pub struct SqliteExposureExportRepository {
    pool: SqlitePool,
}

impl SqliteExposureExportRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

fn parse_timestamp(value: &str) -> DomainResult<DateTime<Utc>> {
    chrono::DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| DomainError::Internal(format!("Bad timestamp {}: {}", value, e)))
}

#[async_trait]
impl ExposureExportRepository for SqliteExposureExportRepository {
    async fn fetch_watermark(&self) -> DomainResult<i64> {
        sqlx::query_scalar::<_, i64>(
            "SELECT COALESCE(MAX(last_exposure_id), 0) FROM exposure_export_files",
        )
        .fetch_one(&self.pool)
        .await
        .map_err(|e| DomainError::Database(e.into()))
    }

    async fn fetch_batch(&self, since: i64) -> DomainResult<Vec<Exposure>> {
        #[derive(sqlx::FromRow)]
        struct Row {
            id: i64,
            created_at: String,
            key_data: Vec<u8>,
            rolling_start_number: i32,
            rolling_period: i32,
            transmission_risk_level: i32,
        }

        let rows: Vec<Row> = sqlx::query_as(
            "SELECT id, created_at, key_data, rolling_start_number, rolling_period, transmission_risk_level
             FROM exposures
             WHERE id > ?
             ORDER BY key_data ASC",
        )
        .bind(since)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| DomainError::Database(e.into()))?;

        rows.into_iter()
            .map(|row| {
                Ok(Exposure {
                    id: row.id,
                    created_at: parse_timestamp(&row.created_at)?,
                    key_data: row.key_data,
                    rolling_start_number: row.rolling_start_number,
                    rolling_period: row.rolling_period,
                    transmission_risk_level: row.transmission_risk_level,
                })
            })
            .collect()
    }

    async fn record_export(&self, file: &NewExportFile) -> DomainResult<()> {
        sqlx::query(
            "INSERT INTO exposure_export_files (path, exposure_count, last_exposure_id, created_at)
             VALUES (?, ?, ?, ?)",
        )
        .bind(&file.path)
        .bind(file.exposure_count)
        .bind(file.last_exposure_id)
        .bind(Utc::now().to_rfc3339())
        .execute(&self.pool)
        .await
        .map_err(|e| DomainError::Database(e.into()))?;
        Ok(())
    }

    async fn purge_expired_exposures(&self, cutoff: DateTime<Utc>) -> DomainResult<u64> {
        let result = sqlx::query("DELETE FROM exposures WHERE created_at < ?")
            .bind(cutoff.to_rfc3339())
            .execute(&self.pool)
            .await
            .map_err(|e| DomainError::Database(e.into()))?;
        Ok(result.rows_affected())
    }

    async fn purge_expired_files(&self, cutoff: DateTime<Utc>) -> DomainResult<Vec<String>> {
        let rows: Vec<(String,)> =
            sqlx::query_as("DELETE FROM exposure_export_files WHERE created_at < ? RETURNING path")
                .bind(cutoff.to_rfc3339())
                .fetch_all(&self.pool)
                .await
                .map_err(|e| DomainError::Database(e.into()))?;
        Ok(rows.into_iter().map(|(path,)| path).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db_migration;
    use chrono::Duration;
    use sqlx::sqlite::SqlitePoolOptions;

    async fn test_pool() -> SqlitePool {
        // A single connection keeps every query on the same in-memory database.
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .expect("in-memory pool");
        db_migration::initialize_database(&pool).await.expect("migrations");
        pool
    }

    async fn insert_exposure(pool: &SqlitePool, created_at: DateTime<Utc>, key_data: &[u8]) -> i64 {
        sqlx::query(
            "INSERT INTO exposures (created_at, key_data, rolling_start_number, rolling_period, transmission_risk_level)
             VALUES (?, ?, ?, ?, ?)",
        )
        .bind(created_at.to_rfc3339())
        .bind(key_data)
        .bind(2650000)
        .bind(144)
        .bind(4)
        .execute(pool)
        .await
        .expect("insert exposure")
        .last_insert_rowid()
    }

    async fn insert_export_file(pool: &SqlitePool, path: &str, last_exposure_id: i64, created_at: DateTime<Utc>) {
        sqlx::query(
            "INSERT INTO exposure_export_files (path, exposure_count, last_exposure_id, created_at)
             VALUES (?, 1, ?, ?)",
        )
        .bind(path)
        .bind(last_exposure_id)
        .bind(created_at.to_rfc3339())
        .execute(pool)
        .await
        .expect("insert export file");
    }

    #[tokio::test]
    async fn test_watermark_defaults_to_zero() {
        let pool = test_pool().await;
        let repo = SqliteExposureExportRepository::new(pool);
        assert_eq!(repo.fetch_watermark().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_watermark_is_max_last_exposure_id() {
        let pool = test_pool().await;
        insert_export_file(&pool, "exports/1.zip", 7, Utc::now()).await;
        insert_export_file(&pool, "exports/2.zip", 3, Utc::now()).await;

        let repo = SqliteExposureExportRepository::new(pool);
        assert_eq!(repo.fetch_watermark().await.unwrap(), 7);
    }

    #[tokio::test]
    async fn test_batch_filters_by_id_and_orders_by_key_data() {
        let pool = test_pool().await;
        let now = Utc::now();
        let skipped = insert_exposure(&pool, now, b"z-old").await;
        insert_exposure(&pool, now, b"b").await;
        insert_exposure(&pool, now, b"a").await;

        let repo = SqliteExposureExportRepository::new(pool);
        let batch = repo.fetch_batch(skipped).await.unwrap();

        assert_eq!(batch.len(), 2);
        assert_eq!(batch[0].key_data, b"a");
        assert_eq!(batch[1].key_data, b"b");
    }

    #[tokio::test]
    async fn test_purge_expired_exposures_boundary() {
        let pool = test_pool().await;
        let now = Utc::now();
        insert_exposure(&pool, now - Duration::days(15), b"expired").await;
        let kept = insert_exposure(&pool, now - Duration::days(13), b"fresh").await;

        let repo = SqliteExposureExportRepository::new(pool.clone());
        let purged = repo.purge_expired_exposures(now - Duration::days(14)).await.unwrap();
        assert_eq!(purged, 1);

        let remaining: Vec<(i64,)> = sqlx::query_as("SELECT id FROM exposures")
            .fetch_all(&pool)
            .await
            .unwrap();
        assert_eq!(remaining, vec![(kept,)]);
    }

    #[tokio::test]
    async fn test_purge_expired_files_returns_paths() {
        let pool = test_pool().await;
        let now = Utc::now();
        insert_export_file(&pool, "exports/old.zip", 1, now - Duration::days(15)).await;
        insert_export_file(&pool, "exports/new.zip", 2, now - Duration::days(13)).await;

        let repo = SqliteExposureExportRepository::new(pool.clone());
        let paths = repo.purge_expired_files(now - Duration::days(14)).await.unwrap();
        assert_eq!(paths, vec!["exports/old.zip".to_string()]);

        let remaining: Vec<(String,)> = sqlx::query_as("SELECT path FROM exposure_export_files")
            .fetch_all(&pool)
            .await
            .unwrap();
        assert_eq!(remaining, vec![("exports/new.zip".to_string(),)]);
    }
}
