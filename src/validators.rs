//! Syntactic validators for catalog fields.
//!
//! Nothing here touches the network: a URI is well-formed when its scheme is
//! one of `http`, `https`, `ftp`, or `ftps` and the remainder names a domain,
//! `localhost`, or an IPv4/IPv6 literal with an optional port and path.
//!
//! ```rust
//! use ncmdb::validate_uri;
//!
//! assert!(validate_uri("https://upload.wikimedia.org/wikipedia/en/8/8e/Matchstick_Men.jpg").is_some());
//! assert!(validate_uri("nodomain").is_none());
//! ```

use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};
use thiserror::Error;

const URI_SCHEMES: &[&str] = &["http", "https", "ftp", "ftps"];

static URI_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(concat!(
        r"(?i)^(?:[a-z0-9.\-]*)://",
        r"(?:(?:[A-Z0-9](?:[A-Z0-9-]{0,61}[A-Z0-9])?\.)+(?:[A-Z]{2,6}\.?|[A-Z0-9-]+[A-Z0-9]\.?)|",
        r"localhost|",
        r"\d{1,3}\.\d{1,3}\.\d{1,3}\.\d{1,3}|",
        r"\[?[A-F0-9]*:[A-F0-9:]+\]?)",
        r"(?::\d+)?",
        r"(?:/?|[/?]\S+)$",
    ))
    .expect("URI pattern is a valid regex")
});

/// Returns `candidate` unchanged when it is a well-formed URI, `None` otherwise.
pub fn validate_uri(candidate: &str) -> Option<&str> {
    let scheme = candidate
        .split("://")
        .next()
        .unwrap_or_default()
        .to_lowercase();
    if URI_SCHEMES.contains(&scheme.as_str()) && URI_REGEX.is_match(candidate) {
        Some(candidate)
    } else {
        None
    }
}

//////////////////////////////////////////// FieldError ////////////////////////////////////////////

/// A validation failure scoped to one input field.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{field}: {message}")]
pub struct FieldError {
    /// The field (or `field.index` for list items) that failed.
    pub field: String,
    /// Human-readable reason.
    pub message: String,
}

impl FieldError {
    /// Creates a new field error.
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

/// Checks that `value` is at least `min`.
pub fn check_min(field: &str, value: i64, min: i64) -> Result<i64, FieldError> {
    if value < min {
        return Err(FieldError::new(
            field,
            format!("{} is less than minimum value {}", value, min),
        ));
    }
    Ok(value)
}

/// Adapter that turns a failed URI check into a [`FieldError`].
#[derive(Debug, Clone)]
pub struct UriValidator {
    message: String,
}

impl UriValidator {
    /// Creates a validator with a custom failure message.
    pub fn with_message(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    /// Validates `value`, reporting failures against `field`.
    pub fn check(&self, field: &str, value: &str) -> Result<(), FieldError> {
        match validate_uri(value) {
            Some(_) => Ok(()),
            None => Err(FieldError::new(field, self.message.clone())),
        }
    }
}

impl Default for UriValidator {
    fn default() -> Self {
        Self::with_message("Invalid URL")
    }
}

/////////////////////////////////////////////// Uri ////////////////////////////////////////////////

/// A string that passed [`validate_uri`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Uri(String);

impl Uri {
    /// Wraps `value` if it is a well-formed URI.
    pub fn parse(value: impl Into<String>) -> Option<Uri> {
        let value = value.into();
        if validate_uri(&value).is_some() {
            Some(Uri(value))
        } else {
            None
        }
    }

    /// Returns the URI as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Consumes the Uri and returns the inner String.
    pub fn into_string(self) -> String {
        self.0
    }
}

impl TryFrom<String> for Uri {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Uri::parse(value.clone()).ok_or_else(|| format!("invalid URI: {}", value))
    }
}

impl From<Uri> for String {
    fn from(uri: Uri) -> Self {
        uri.0
    }
}

impl std::fmt::Display for Uri {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/////////////////////////////////////////// NonNegative ////////////////////////////////////////////

/// An integer known to be zero or greater, such as a release year or a running time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(transparent)]
pub struct NonNegative(i64);

impl NonNegative {
    /// Validates `value` for `field`.
    pub fn new(field: &str, value: i64) -> Result<Self, FieldError> {
        check_min(field, value, 0).map(NonNegative)
    }

    /// Returns the wrapped value.
    pub fn get(self) -> i64 {
        self.0
    }
}
