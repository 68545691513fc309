pub mod pool;

use sqlx::sqlite::SqliteConnectOptions;
use sqlx::SqlitePool;
use std::str::FromStr;

use crate::error::Result;

pub use pool::create_pool;

/// Database handle type (the pool is internally reference counted)
pub type Db = SqlitePool;

/// Open or create the SQLite database at the given URL
///
/// Creates the parent directory of the database file and applies all
/// pending migrations.
pub async fn open_database(database_url: &str) -> Result<Db> {
    tracing::info!("Opening database at: {}", database_url);

    let options = SqliteConnectOptions::from_str(database_url)?;

    // Create parent directory if it doesn't exist
    if let Some(parent) = options.clone().get_filename().parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            std::fs::create_dir_all(parent).map_err(|e| {
                tracing::error!("Failed to create database directory: {}", e);
                e
            })?;
        }
    }

    let pool = create_pool(options).await?;

    tracing::info!("Running database migrations...");
    sqlx::migrate!("./migrations").run(&pool).await?;
    tracing::info!("Database initialized successfully");

    Ok(pool)
}

/// Open a migrated database in a fresh temporary directory
///
/// The directory is removed when the returned guard is dropped.
#[cfg(test)]
pub(crate) async fn open_test_database() -> (tempfile::TempDir, Db) {
    let temp_dir = tempfile::TempDir::new().unwrap();
    let url = format!("sqlite://{}", temp_dir.path().join("test.db").display());
    let db = open_database(&url).await.unwrap();
    (temp_dir, db)
}
