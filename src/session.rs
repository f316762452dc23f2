//! One transaction per request, committed or rolled back by the dispatcher.

use sqlx::{Sqlite, SqlitePool, Transaction};

use crate::DataStoreError;
use crate::sql::classify;

/// The unit of work for one request.
///
/// Handles borrow the transaction; the dispatcher decides whether to commit or
/// roll back once the request is answered.  Dropping a session without
/// committing rolls it back.
pub struct Session {
    tx: Transaction<'static, Sqlite>,
}

impl Session {
    /// Opens a transaction on `pool`.
    pub async fn begin(pool: &SqlitePool) -> Result<Self, DataStoreError> {
        let tx = pool
            .begin()
            .await
            .map_err(|e| classify("beginning transaction", e))?;
        Ok(Self { tx })
    }

    /// The open transaction.
    pub fn tx(&mut self) -> &mut Transaction<'static, Sqlite> {
        &mut self.tx
    }

    /// Makes every write of the request durable.
    pub async fn commit(self) -> Result<(), DataStoreError> {
        self.tx
            .commit()
            .await
            .map_err(|e| classify("committing transaction", e))
    }

    /// Discards every write of the request.
    pub async fn rollback(self) -> Result<(), DataStoreError> {
        self.tx
            .rollback()
            .await
            .map_err(|e| classify("rolling back transaction", e))
    }
}
