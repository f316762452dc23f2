//! # ncmdb: a catalog of films, people, and their credits
//!
//! ncmdb serves a small relational catalog over HTTP.  People and films are
//! stored in SQLite; credits link them under six roles (producer, director,
//! writer, editor, cast, musician).  Every request is resolved by walking the
//! URL one segment at a time through a registry of named nodes, validated by a
//! declarative schema, executed inside a single transaction, and serialized
//! through an explicit per-entity projection.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────┐
//! │ HTTP (Axum router, params extractor)    │
//! ├─────────────────────────────────────────┤
//! │ Traversal (ResourceTree::resolve)       │
//! ├─────────────────────────────────────────┤
//! │ Views (per-verb handlers, schemas)      │
//! ├─────────────────────────────────────────┤
//! │ Handles (Collection, Row over a Session)│
//! ├─────────────────────────────────────────┤
//! │ SQL (sqlx over SQLite)                  │
//! └─────────────────────────────────────────┘
//! ```
//!
//! ## Resolving paths
//!
//! ```rust
//! # use ncmdb::traversal::{Located, ResourceTree, TableKind};
//! let tree = ResourceTree::catalog();
//! match tree.resolve_path("/api/v1/films/42/").unwrap() {
//!     Located::Row(TableKind::Films, node, id) => {
//!         assert_eq!(id, 42);
//!         assert_eq!(node.path(), "/api/v1/films/42/");
//!     }
//!     _ => panic!("expected a film row"),
//! }
//! assert!(tree.resolve_path("/api/v1/films/forty-two/").is_err());
//! ```
//!
//! ## Validating parameters
//!
//! ```rust
//! # use ncmdb::schema::{CreateFilmSchema, Params, Schema};
//! # use serde_json::json;
//! let mut params = Params::new();
//! params.insert("title".to_string(), json!("Face/Off"));
//! params.insert("year".to_string(), json!("-1997"));
//! let errors = CreateFilmSchema::deserialize(&params).unwrap_err();
//! assert!(errors.contains("year"));
//! ```
//!
//! ## Serving
//!
//! ```rust,no_run
//! # async fn serve() -> Result<(), Box<dyn std::error::Error>> {
//! let pool = ncmdb::db::connect("sqlite://ncmdb.db", 5).await?;
//! ncmdb::db::migrate(&pool).await?;
//! let app = ncmdb::create_router(ncmdb::AppState::new(pool)?);
//! let listener = tokio::net::TcpListener::bind("127.0.0.1:8080").await?;
//! axum::serve(listener, app).await?;
//! # Ok(())
//! # }
//! ```

#![deny(missing_docs)]
mod change;
mod credit;
mod errors;
mod film;
mod person;
mod projection;
mod validators;

/// The HTTP application: shared state, parameter extraction, and dispatch.
pub mod app;

/// Command-line interface utilities for program termination and output formatting.
///
/// This module provides common CLI utilities for ncmdb binaries, including
/// error handling, formatted output, and program termination functions.
pub mod cli_utils;

/// Command-line interface command handlers.
///
/// This module contains organized command handlers for the ncmdbctl CLI application,
/// with each command type implemented in a dedicated submodule.
pub mod commands;

/// Daemon configuration loaded from YAML and overridden by flags.
pub mod config;

/// Connection pool construction and migrations.
pub mod db;

/// HTTP client utilities for interacting with an ncmdb service.
///
/// This module provides a standardized HTTP client for communicating with
/// the catalog API, handling requests, responses, and error conditions.
pub mod http_utils;

/// Collection and row handles.
pub mod resources;

/// Parameter schemas.
pub mod schema;

/// The per-request unit of work.
pub mod session;

/// SQLite operations.
pub mod sql;

/// URL traversal.
pub mod traversal;

/// Per-verb view handlers.
pub mod views;

pub use app::{AppState, create_router};
pub use change::Change;
pub use config::{ConfigError, ServerConfig};
pub use credit::{CreditNames, Credits, Role};
pub use errors::DataStoreError;
pub use film::{Film, FilmChanges, FilmField, FilmFilter, NewFilm};
pub use person::{NewPerson, Person, PersonChanges, PersonField, PersonFilter};
pub use projection::{FieldName, Record};
pub use validators::{FieldError, NonNegative, Uri, UriValidator, check_min, validate_uri};
