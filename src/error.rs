/// Error types for the catalogue
///
/// Only the storage and favorites layers return these to callers.
/// The collection loader logs them and degrades to an empty collection.

use thiserror::Error;

/// Everything that can go wrong inside the catalogue core
#[derive(Debug, Error)]
pub enum CatalogueError {
    /// SQLite failure in the local store
    #[error("storage error: {0}")]
    Storage(#[from] rusqlite::Error),

    /// Filesystem failure (creating the data directory)
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// A value could not be serialized or deserialized
    #[error("serialization error: {0}")]
    Serde(#[from] serde_json::Error),

    /// Transport-level HTTP failure
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    /// The backend answered with a non-success status
    #[error("request to {table} failed with status {status}: {body}")]
    Status {
        table: String,
        status: u16,
        body: String,
    },

    /// A required setting is missing
    #[error("missing configuration: {0}")]
    Config(String),

    /// The store's lock was poisoned by a panicking writer
    #[error("store lock poisoned")]
    Poisoned,
}

pub type Result<T> = std::result::Result<T, CatalogueError>;
