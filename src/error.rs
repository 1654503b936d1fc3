//! Error types for StrataKV
//!
//! Provides a unified error type for all operations.

use std::fmt;
use std::path::PathBuf;

use thiserror::Error;

/// Result type alias using StrataError
pub type Result<T> = std::result::Result<T, StrataError>;

/// Unified error type for StrataKV operations
#[derive(Debug, Error)]
pub enum StrataError {
    // -------------------------------------------------------------------------
    // I/O Errors
    // -------------------------------------------------------------------------
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    // -------------------------------------------------------------------------
    // Lookup Errors
    // -------------------------------------------------------------------------
    /// Key is absent or its newest version is a tombstone
    #[error("Key not found")]
    KeyNotFound,

    // -------------------------------------------------------------------------
    // Storage Errors
    // -------------------------------------------------------------------------
    #[error("Corrupt SSTable format: {0}")]
    CorruptFormat(String),

    #[error("SSTable too large: {0}")]
    TableTooLarge(String),

    /// Mutation attempted on an immutable table
    #[error("Unsupported operation: {0}")]
    Unsupported(String),

    /// Entry that cannot be written: unencodable timestamp or out-of-order key
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Strict open found one or more unreadable table files
    #[error("Failed to open {} SSTable file(s): {}", .0.len(), FailureList(.0))]
    OpenFailed(Vec<TableOpenFailure>),

    // -------------------------------------------------------------------------
    // Configuration Errors
    // -------------------------------------------------------------------------
    #[error("Configuration error: {0}")]
    Config(String),
}

impl StrataError {
    /// True if this is the "key absent or deleted" outcome
    pub fn is_not_found(&self) -> bool {
        matches!(self, StrataError::KeyNotFound)
    }
}

/// One table file that could not be opened
#[derive(Debug)]
pub struct TableOpenFailure {
    pub path: PathBuf,
    pub error: Box<StrataError>,
}

impl fmt::Display for TableOpenFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.path.display(), self.error)
    }
}

struct FailureList<'a>(&'a [TableOpenFailure]);

impl fmt::Display for FailureList<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, failure) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str("; ")?;
            }
            write!(f, "{}", failure)?;
        }
        Ok(())
    }
}
