//! Error taxonomy for a load run.

use std::path::PathBuf;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, LoadError>;

#[derive(Error, Debug)]
pub enum LoadError {
    /// No connection string could be resolved.
    #[error("MONGODB_URI not found; check {}", env_file.display())]
    Configuration { env_file: PathBuf },

    /// The input CSV does not exist.
    #[error("source file '{}' not found; check the path", path.display())]
    SourceNotFound { path: PathBuf },

    /// The input CSV exists but could not be parsed.
    #[error("failed to read '{}': {message}", path.display())]
    Source { path: PathBuf, message: String },

    /// Connecting to the store (or the initial ping) failed.
    #[error("could not connect to MongoDB: {message}")]
    Connection { message: String },

    /// A delete, insert or rename against the store failed.
    #[error("MongoDB {operation} failed: {message}")]
    StoreOperation {
        operation: &'static str,
        message: String,
    },
}

impl LoadError {
    pub fn store(operation: &'static str, err: impl std::fmt::Display) -> Self {
        LoadError::StoreOperation {
            operation,
            message: err.to_string(),
        }
    }

    pub fn connection(err: impl std::fmt::Display) -> Self {
        LoadError::Connection {
            message: err.to_string(),
        }
    }

    /// True for failures that happen inside the store, connect included.
    pub fn is_store_error(&self) -> bool {
        matches!(
            self,
            LoadError::Connection { .. } | LoadError::StoreOperation { .. }
        )
    }
}
