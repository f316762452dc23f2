//! # Command Error Handling
//!
//! This module provides error handling utilities for ncmdbctl commands
//! using the handled crate for consistent error property extraction.

use handled::Handle;

/// User-friendly error information that can be extracted from various error types
#[derive(Debug, Clone)]
pub struct UserError {
    /// The main error message to display to the user
    pub message: String,
    /// Optional usage hint to help the user correct the error
    pub usage_hint: Option<String>,
}

impl std::fmt::Display for UserError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl Handle<UserError> for UserError {
    fn handle(&self) -> Option<UserError> {
        Some(self.clone())
    }
}

/// A row id argument that is not a positive integer.
#[derive(Debug)]
pub struct IdParseError {
    /// The argument as given.
    pub input: String,
}

impl std::fmt::Display for IdParseError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Invalid id '{}'", self.input)
    }
}

impl std::error::Error for IdParseError {}

impl Handle<UserError> for IdParseError {
    fn handle(&self) -> Option<UserError> {
        Some(UserError {
            message: format!("Invalid id '{}': expected a positive integer", self.input),
            usage_hint: Some("Ids are the numbers returned by create and list".to_string()),
        })
    }
}

/// A parameter argument not written as `key=value`.
#[derive(Debug)]
pub struct PairParseError {
    /// The argument as given.
    pub input: String,
}

impl std::fmt::Display for PairParseError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Invalid parameter '{}'", self.input)
    }
}

impl std::error::Error for PairParseError {}

impl Handle<UserError> for PairParseError {
    fn handle(&self) -> Option<UserError> {
        Some(UserError {
            message: format!("Invalid parameter '{}': expected key=value", self.input),
            usage_hint: Some(
                "Repeat a key to pass a list, e.g. cast=1 cast=2; use key= to clear a field"
                    .to_string(),
            ),
        })
    }
}

/// Enhanced error formatting for CLI output
pub fn format_cli_error<E>(error: &E) -> String
where
    E: Handle<UserError> + std::fmt::Display,
{
    if let Some(user_error) = error.handle() {
        let mut output = format!("Error: {}", user_error.message);
        if let Some(hint) = user_error.usage_hint {
            output.push_str(&format!("\nHint: {}", hint));
        }
        output
    } else {
        format!("Error: {}", error)
    }
}
