//! Error handling for `trigger-config`.
//!
//! Everything that can go wrong before the server starts serving lives here.
//! All of these are fatal at startup.

use std::path::PathBuf;

use thiserror::Error;

/// Result alias for the whole crate.
pub type Result<T> = std::result::Result<T, ConfigError>;

/// Configuration load/validation failures.
#[non_exhaustive]
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The config file could not be read from disk.
    #[error("Read YAML file error: {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The file was read but is not a valid config document.
    #[error("YAML unmarshal error: {0}")]
    Parse(#[from] serde_yml::Error),

    /// A mandatory field is missing or empty, e.g. `GitLab host`.
    #[error("{0} is required")]
    MissingField(&'static str),

    /// A value is present but has the wrong shape.
    #[error("invalid format in {field}: {reason}")]
    InvalidFormat {
        /// Logical field name (e.g. `Jira host`).
        field: &'static str,
        /// Explanation (e.g. `must start with http:// or https://`).
        reason: &'static str,
    },

    /// One of `Trigger.regex` does not compile.
    #[error("invalid issue pattern #{index} `{pattern}`: {source}")]
    InvalidPattern {
        index: usize,
        pattern: String,
        #[source]
        source: regex::Error,
    },
}
