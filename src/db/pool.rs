use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::SqlitePool;
use std::time::Duration;

/// Create a SQLite connection pool
///
/// The database file is created if it does not exist and foreign key
/// enforcement is switched on for every connection.
pub async fn create_pool(options: SqliteConnectOptions) -> Result<SqlitePool, sqlx::Error> {
    tracing::info!("Creating database connection pool...");

    let options = options.create_if_missing(true).foreign_keys(true);

    let pool = SqlitePoolOptions::new()
        .max_connections(10)
        .min_connections(1)
        .acquire_timeout(Duration::from_secs(10))
        .idle_timeout(Duration::from_secs(600))
        .max_lifetime(Duration::from_secs(1800))
        .connect_with(options)
        .await?;

    tracing::info!("Database connection pool created successfully");

    Ok(pool)
}
