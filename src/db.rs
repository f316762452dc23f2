//! Connection pool construction and schema migrations.

use std::str::FromStr;
use std::time::Duration;

use sqlx::SqlitePool;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions};

use crate::DataStoreError;

fn is_memory(url: &str) -> bool {
    url.contains(":memory:") || url.contains("mode=memory")
}

/// Opens a pool on `url`, creating the database file if it is missing.
///
/// An in-memory database lives only as long as its connection, so a memory
/// URL is always served by a single connection that never idles out.  A file
/// database runs in WAL mode so readers never wait on the writer.
pub async fn connect(url: &str, max_connections: u32) -> Result<SqlitePool, DataStoreError> {
    let mut options = SqliteConnectOptions::from_str(url)?
        .create_if_missing(true)
        .foreign_keys(true)
        .busy_timeout(Duration::from_secs(5));
    let mut pool = SqlitePoolOptions::new();
    if is_memory(url) {
        pool = pool
            .max_connections(1)
            .idle_timeout(None::<Duration>)
            .max_lifetime(None::<Duration>);
    } else {
        options = options.journal_mode(SqliteJournalMode::Wal);
        pool = pool.max_connections(max_connections.max(1));
    }
    pool.connect_with(options).await.map_err(|e| {
        tracing::error!(error = %e, url, "could not open database");
        DataStoreError::Internal(format!("could not open {}: {}", url, e))
    })
}

/// Applies every pending migration.
pub async fn migrate(pool: &SqlitePool) -> Result<(), DataStoreError> {
    sqlx::migrate!("./migrations").run(pool).await?;
    Ok(())
}
