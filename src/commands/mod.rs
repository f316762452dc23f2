//! # Command Handlers
//!
//! This module contains the command handlers for the ncmdbctl CLI application.
//!
//! ## Structure
//!
//! - `person` - Person commands (create, list, get, update, delete)
//! - `film` - Film commands (create, list, get, update, delete)
//! - `shared` - Argument parsing and request helpers
//! - `errors` - User-facing error extraction

/// User-facing error extraction.
pub mod errors;
/// `ncmdbctl film ...`
pub mod film;
/// `ncmdbctl person ...`
pub mod person;
/// Argument parsing and request helpers.
pub mod shared;

pub use film::handle_film_command;
pub use person::handle_person_command;
