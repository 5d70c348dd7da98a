use log::{debug, info};
use sqlx::SqlitePool;

use crate::errors::{DbError, DbResult};

// Embed all migration SQL files at compile time
const MIGRATION_EXPOSURES: &str = include_str!("../migrations/20260601000000_exposures.sql");

// List of migrations with their names and SQL content
const MIGRATIONS: &[(&str, &str)] = &[
    ("20260601000000_exposures.sql", MIGRATION_EXPOSURES),
];

/// Initialize the database with migrations. Safe to call on every start;
/// already-applied migrations are skipped.
pub async fn initialize_database(pool: &SqlitePool) -> DbResult<()> {
    create_migrations_table(pool).await?;

    let last_migration = get_last_migration(pool).await?;
    match &last_migration {
        Some(name) => debug!("last applied migration: {}", name),
        None => debug!("no migrations applied yet"),
    }

    apply_pending_migrations(pool, last_migration).await
}

/// Create migrations table if it doesn't exist
async fn create_migrations_table(pool: &SqlitePool) -> DbResult<()> {
    sqlx::query(
        "CREATE TABLE IF NOT EXISTS migrations (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            name TEXT NOT NULL,
            applied_at TEXT NOT NULL
        )",
    )
    .execute(pool)
    .await
    .map_err(|e| DbError::Migration(format!("Failed to create migrations table: {}", e)))?;

    Ok(())
}

/// Get the last applied migration
async fn get_last_migration(pool: &SqlitePool) -> DbResult<Option<String>> {
    sqlx::query_scalar::<_, String>("SELECT name FROM migrations ORDER BY id DESC LIMIT 1")
        .fetch_optional(pool)
        .await
        .map_err(|e| DbError::Migration(format!("Failed to get last migration: {}", e)))
}

/// Apply every migration that sorts after the last applied one, in a single
/// transaction.
async fn apply_pending_migrations(pool: &SqlitePool, last_migration: Option<String>) -> DbResult<()> {
    let pending: Vec<(&str, &str)> = MIGRATIONS
        .iter()
        .filter(|(name, _)| match &last_migration {
            Some(last) => *name > last.as_str(),
            None => true,
        })
        .copied()
        .collect();

    if pending.is_empty() {
        debug!("no pending migrations to apply");
        return Ok(());
    }

    let mut tx = pool
        .begin()
        .await
        .map_err(|e| DbError::Migration(format!("Failed to begin transaction: {}", e)))?;

    for (name, sql) in pending {
        sqlx::raw_sql(sql)
            .execute(&mut *tx)
            .await
            .map_err(|e| DbError::Migration(format!("Failed to apply migration {}: {}", name, e)))?;

        sqlx::query("INSERT INTO migrations (name, applied_at) VALUES (?, ?)")
            .bind(name)
            .bind(chrono::Utc::now().to_rfc3339())
            .execute(&mut *tx)
            .await
            .map_err(|e| DbError::Migration(format!("Failed to record migration {}: {}", name, e)))?;

        info!("applied migration {}", name);
    }

    tx.commit()
        .await
        .map_err(|e| DbError::Migration(format!("Failed to commit migrations: {}", e)))
}
