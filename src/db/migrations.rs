//! Schema versioning for the auction database.
//!
//! The applied version lives in SQLite's `user_version`. Each step runs in
//! its own transaction together with the version bump, so a crash mid-step
//! leaves the previous version in place. After migrating, the tables the
//! service depends on are checked before the pool is handed out.

use sqlx::sqlite::{SqliteConnection, SqlitePool, SqlitePoolOptions};
use sqlx::Row;
use std::path::Path;
use thiserror::Error;
use tracing::{debug, info};

/// Ordered schema steps; a step's index + 1 is the version it produces.
const MIGRATIONS: &[&str] = &[
    include_str!("schema.sql"),
    // v2: dispatcher lease so an in-flight send is visible to retractions.
    "ALTER TABLE notifications ADD COLUMN claimed_at INTEGER",
];

/// Tables every auction command touches.
pub const REQUIRED_TABLES: [&str; 6] = [
    "managers",
    "players",
    "slots",
    "nominations",
    "bids",
    "notifications",
];

#[derive(Debug, Error)]
pub enum MigrationError {
    #[error(transparent)]
    Sqlx(#[from] sqlx::Error),
    #[error("Database schema version {found} is newer than this build supports ({supported})")]
    TooNew { found: i64, supported: i64 },
    #[error("Database is missing table {0}")]
    MissingTable(&'static str),
}

pub fn latest_version() -> i64 {
    MIGRATIONS.len() as i64
}

/// Open (creating if needed) the auction database and bring it up to date.
pub async fn init_db(db_path: &str) -> Result<SqlitePool, MigrationError> {
    if let Some(parent) = Path::new(db_path).parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent).ok();
        }
    }

    // Concurrent writers queue on busy_timeout; a failed transaction rolls back whole.
    let pool = SqlitePoolOptions::new()
        .max_connections(5)
        .after_connect(|conn, _meta| Box::pin(async move { configure_connection(conn).await }))
        .connect(&format!("sqlite:{}?mode=rwc", db_path))
        .await?;

    let version = run_migrations(&pool).await?;
    verify_schema(&pool).await?;

    info!(schema_version = version, "Auction database ready at {}", db_path);
    Ok(pool)
}

pub async fn schema_version(pool: &SqlitePool) -> Result<i64, sqlx::Error> {
    let (version,): (i64,) = sqlx::query_as("PRAGMA user_version").fetch_one(pool).await?;
    Ok(version)
}

/// Apply every step newer than the stored version. Returns the final version.
async fn run_migrations(pool: &SqlitePool) -> Result<i64, MigrationError> {
    let current = schema_version(pool).await?;
    let latest = latest_version();
    if current > latest {
        return Err(MigrationError::TooNew {
            found: current,
            supported: latest,
        });
    }

    for (index, step) in MIGRATIONS.iter().enumerate().skip(current as usize) {
        let version = index as i64 + 1;
        let mut tx = pool.begin().await?;
        for statement in step.split(';').map(str::trim).filter(|s| !s.is_empty()) {
            sqlx::query(statement).execute(&mut *tx).await?;
        }
        // PRAGMA does not take bind parameters.
        sqlx::query(&format!("PRAGMA user_version = {}", version))
            .execute(&mut *tx)
            .await?;
        tx.commit().await?;
        info!(schema_version = version, "Applied schema migration");
    }

    Ok(latest)
}

async fn verify_schema(pool: &SqlitePool) -> Result<(), MigrationError> {
    for table in REQUIRED_TABLES {
        let found: Option<(String,)> =
            sqlx::query_as("SELECT name FROM sqlite_master WHERE type = 'table' AND name = ?")
                .bind(table)
                .fetch_optional(pool)
                .await?;
        if found.is_none() {
            return Err(MigrationError::MissingTable(table));
        }
    }
    Ok(())
}

/// Per-connection settings. Foreign keys back the bid cascade on nomination
/// delete; busy_timeout makes racing writers wait instead of failing fast.
async fn configure_connection(conn: &mut SqliteConnection) -> Result<(), sqlx::Error> {
    for pragma in [
        "PRAGMA foreign_keys = ON",
        "PRAGMA busy_timeout = 5000",
        "PRAGMA synchronous = NORMAL",
    ] {
        sqlx::query(pragma).execute(&mut *conn).await?;
    }

    // journal_mode answers with the mode actually in effect.
    let row = sqlx::query("PRAGMA journal_mode = WAL")
        .fetch_one(&mut *conn)
        .await?;
    let journal_mode: String = row.try_get(0)?;
    debug!(journal_mode = %journal_mode, "Configured SQLite connection");
    Ok(())
}
