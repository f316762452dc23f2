//! Daemon configuration.
//!
//! Settings come from an optional YAML file and are then overridden by
//! command-line flags.  Every field has a default, so an empty file (or no
//! file at all) is a valid configuration.
//!
//! ```yaml
//! database_url: sqlite://ncmdb.db
//! max_connections: 5
//! host: 127.0.0.1
//! port: 8080
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors loading a configuration file.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The file could not be read.
    #[error("could not read {path}: {source}")]
    Read {
        /// The file that was requested.
        path: String,
        /// The underlying I/O error.
        source: std::io::Error,
    },
    /// The file is not valid configuration YAML.
    #[error("could not parse {path}: {source}")]
    Parse {
        /// The file that was requested.
        path: String,
        /// The underlying YAML error.
        source: serde_yml::Error,
    },
}

/// Settings for `ncmdbd`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ServerConfig {
    /// SQLite URL of the catalog database.
    pub database_url: String,
    /// Upper bound on pooled connections.
    pub max_connections: u32,
    /// Address to bind.
    pub host: String,
    /// Port to bind.
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            database_url: "sqlite://ncmdb.db".to_string(),
            max_connections: 5,
            host: "127.0.0.1".to_string(),
            port: 8080,
        }
    }
}

impl ServerConfig {
    /// Parses YAML text; missing keys take their defaults.
    pub fn from_yaml(text: &str) -> Result<Self, serde_yml::Error> {
        if text.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_yml::from_str(text)
    }

    /// Reads and parses the file at `path`.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_yaml(&text).map_err(|source| ConfigError::Parse {
            path: path.display().to_string(),
            source,
        })
    }

    /// Replaces each field for which an override is present.
    pub fn with_overrides(
        mut self,
        database_url: Option<String>,
        max_connections: Option<u32>,
        host: Option<String>,
        port: Option<u16>,
    ) -> Self {
        if let Some(database_url) = database_url {
            self.database_url = database_url;
        }
        if let Some(max_connections) = max_connections {
            self.max_connections = max_connections;
        }
        if let Some(host) = host {
            self.host = host;
        }
        if let Some(port) = port {
            self.port = port;
        }
        self
    }

    /// `host:port`, ready for binding.
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
