//! Error types for verdant-core

use thiserror::Error;

/// Result type alias using verdant-core's Error
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in verdant-core operations
#[derive(Error, Debug)]
pub enum Error {
    /// libSQL error
    #[error("Database error: {0}")]
    LibSql(#[from] libsql::Error),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// A record with the same identity already exists in the store
    #[error("Record already exists: {0}")]
    DuplicateRecord(String),

    /// Invalid input
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// HTTP transport error talking to the collector
    #[error("Transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// The collector returned something other than the expected record array
    #[error("Unexpected collector response: {0}")]
    InvalidResponseShape(String),
}

impl Error {
    /// Whether this error means a local store write did not complete.
    ///
    /// Persistence failures are fatal to the capture flow: the operator must
    /// be told the observation was NOT saved. Network failures never are —
    /// the record stays pending and is retried later.
    pub const fn is_persistence_failure(&self) -> bool {
        matches!(self, Self::LibSql(_) | Self::Io(_))
    }
}
