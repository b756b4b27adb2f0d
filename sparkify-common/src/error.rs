//! Common error types for the Sparkify warehouse tooling

use thiserror::Error;

use crate::db::StatementKind;

/// Common result type for warehouse operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error taxonomy shared by the reset and load sequences
#[derive(Error, Debug)]
pub enum Error {
    /// Cannot reach or authenticate to the warehouse (no statement executed)
    #[error("Failed to connect to {url}: {source}")]
    Connect {
        /// Connection URL with the password redacted
        url: String,
        #[source]
        source: sqlx::Error,
    },

    /// A statement in the sequence was rejected by the store
    ///
    /// Bulk-copy source problems (missing path, access denied, malformed
    /// records) surface here as a failed `Copy` statement.
    #[error("{kind} statement on {table} failed: {source}")]
    Statement {
        kind: StatementKind,
        table: &'static str,
        #[source]
        source: sqlx::Error,
    },

    /// Other database driver error (wraps sqlx::Error)
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// I/O operation error (wraps std::io::Error)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration file could not be parsed
    #[error("Invalid configuration file: {0}")]
    Toml(#[from] toml::de::Error),

    /// Configuration loading or validation error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Operation the selected SQL dialect cannot express
    #[error("Unsupported operation: {0}")]
    Unsupported(String),
}
