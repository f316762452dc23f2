//! SQLite operations for the catalog.
//!
//! This module provides functions for reading and writing the catalog tables,
//! organized by stored type.  Every function takes the caller's transaction so
//! that one request is one unit of work.

use sqlx::{QueryBuilder, Sqlite, Transaction};

use crate::DataStoreError;
use crate::change::Change;

/// Credit rows shared by people and films.
pub mod credit;

/// Film rows.
pub mod film;

/// Person rows.
pub mod person;

/// Result type for database operations.
pub type SqlResult<T> = Result<T, DataStoreError>;

/// Logs `err` and converts it, keeping uniqueness conflicts distinguishable.
pub(crate) fn classify(context: &str, err: sqlx::Error) -> DataStoreError {
    match err {
        sqlx::Error::Database(db_err) if db_err.is_unique_violation() => {
            DataStoreError::AlreadyExists
        }
        e => {
            tracing::error!(error = %e, "database error {}", context);
            DataStoreError::Internal(e.to_string())
        }
    }
}

/////////////////////////////////////////////// Match //////////////////////////////////////////////

/// One per-column constraint in a listing query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Match {
    /// Case-insensitive substring match on a text column.
    Contains(&'static str, String),
    /// Exact match on a text column.
    Equals(&'static str, String),
    /// Exact match on an integer column.
    EqualsInteger(&'static str, i64),
}

/// Escapes the `LIKE` wildcards in `needle` so that it matches literally.
pub fn escape_like(needle: &str) -> String {
    let mut escaped = String::with_capacity(needle.len());
    for c in needle.chars() {
        if matches!(c, '\\' | '%' | '_') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

/// Appends ` AND <constraint>` to a query that already has a `WHERE` clause.
pub fn push_match(qb: &mut QueryBuilder<'_, Sqlite>, constraint: Match) {
    qb.push(" AND ");
    match constraint {
        Match::Contains(column, needle) => {
            qb.push(column)
                .push(" LIKE '%' || ")
                .push_bind(escape_like(&needle))
                .push(" || '%' ESCAPE '\\'");
        }
        Match::Equals(column, value) => {
            qb.push(column).push(" = ").push_bind(value);
        }
        Match::EqualsInteger(column, value) => {
            qb.push(column).push(" = ").push_bind(value);
        }
    }
}

/// Appends `, <column> = <value>` to an `UPDATE ... SET` clause for a text column.
pub(crate) fn push_text_change(
    qb: &mut QueryBuilder<'_, Sqlite>,
    column: &'static str,
    change: &Change<String>,
) {
    match change {
        Change::Keep => {}
        Change::Clear => {
            qb.push(", ").push(column).push(" = NULL");
        }
        Change::Set(value) => {
            qb.push(", ").push(column).push(" = ").push_bind(value.clone());
        }
    }
}

/// Appends `, <column> = <value>` to an `UPDATE ... SET` clause for an integer column.
pub(crate) fn push_integer_change(
    qb: &mut QueryBuilder<'_, Sqlite>,
    column: &'static str,
    change: &Change<i64>,
) {
    match change {
        Change::Keep => {}
        Change::Clear => {
            qb.push(", ").push(column).push(" = NULL");
        }
        Change::Set(value) => {
            qb.push(", ").push(column).push(" = ").push_bind(*value);
        }
    }
}

/// Runs a query built to select a single `id` column.
pub async fn select_ids(
    tx: &mut Transaction<'_, Sqlite>,
    mut qb: QueryBuilder<'_, Sqlite>,
) -> SqlResult<Vec<i64>> {
    qb.build_query_scalar::<i64>()
        .fetch_all(&mut **tx)
        .await
        .map_err(|e| classify("selecting ids", e))
}
