//! Error taxonomy for table loading and rate lookup
//!
//! Every variant names the file and table number it concerns so a failure
//! can be diagnosed without re-running the calculation.

use std::io;
use std::path::{Path, PathBuf};

use crate::table::ReentryMethod;

/// Result alias used throughout the crate
pub type Result<T> = std::result::Result<T, TableError>;

/// Errors raised while locating, decoding or querying an actuarial table
#[derive(Debug, thiserror::Error)]
pub enum TableError {
    /// The caller asked for a table number that can never exist.
    #[error("table number must be positive, got {table_number} (file '{}')", path.display())]
    Configuration { path: PathBuf, table_number: i32 },

    /// A file is missing, or the index holds no record for the table.
    #[error("table {table_number} not found: {detail} (file '{}')", path.display())]
    NotFound {
        path: PathBuf,
        table_number: i32,
        detail: String,
    },

    /// The bytes on disk do not describe a well-formed table.
    #[error("table {table_number} is corrupt: {detail} (file '{}')", path.display())]
    CorruptFormat {
        path: PathBuf,
        table_number: i32,
        detail: String,
    },

    /// Lookup arguments fall outside the table's valid range.
    #[error("invalid lookup in table {table_number}: {detail} (file '{}')", path.display())]
    Precondition {
        path: PathBuf,
        table_number: i32,
        detail: String,
    },

    /// The reentry method has no elaborated lookup.
    #[error("reentry method '{method}' is not supported for elaborated lookup in table {table_number} (file '{}')", path.display())]
    UnsupportedMode {
        path: PathBuf,
        table_number: i32,
        method: ReentryMethod,
    },

    /// Reading failed for a reason other than running out of bytes.
    #[error("I/O error reading table {table_number} (file '{}')", path.display())]
    Io {
        path: PathBuf,
        table_number: i32,
        #[source]
        source: io::Error,
    },

    /// An invariant that well-formed input always satisfies did not hold.
    #[error("internal inconsistency in table {table_number}: {detail} (file '{}')", path.display())]
    Internal {
        path: PathBuf,
        table_number: i32,
        detail: String,
    },

    /// A configuration file could not be read or deserialized.
    #[error("invalid table configuration '{}': {detail}", path.display())]
    ConfigFile { path: PathBuf, detail: String },
}

impl TableError {
    pub(crate) fn not_found(path: &Path, table_number: i32, detail: impl Into<String>) -> Self {
        TableError::NotFound {
            path: path.to_path_buf(),
            table_number,
            detail: detail.into(),
        }
    }

    pub(crate) fn corrupt(path: &Path, table_number: i32, detail: impl Into<String>) -> Self {
        TableError::CorruptFormat {
            path: path.to_path_buf(),
            table_number,
            detail: detail.into(),
        }
    }

    pub(crate) fn precondition(path: &Path, table_number: i32, detail: impl Into<String>) -> Self {
        TableError::Precondition {
            path: path.to_path_buf(),
            table_number,
            detail: detail.into(),
        }
    }

    pub(crate) fn internal(path: &Path, table_number: i32, detail: impl Into<String>) -> Self {
        TableError::Internal {
            path: path.to_path_buf(),
            table_number,
            detail: detail.into(),
        }
    }

    /// Classify an I/O failure: a short read is corruption, a missing file is
    /// not-found, anything else is passed through as `Io`.
    pub(crate) fn from_io(path: &Path, table_number: i32, what: &str, err: io::Error) -> Self {
        match err.kind() {
            io::ErrorKind::UnexpectedEof => {
                Self::corrupt(path, table_number, format!("truncated while reading {what}"))
            }
            io::ErrorKind::NotFound => Self::not_found(path, table_number, format!("cannot open {what}")),
            _ => TableError::Io {
                path: path.to_path_buf(),
                table_number,
                source: err,
            },
        }
    }

    /// Table number the error refers to, when there is one
    pub fn table_number(&self) -> Option<i32> {
        match self {
            TableError::Configuration { table_number, .. }
            | TableError::NotFound { table_number, .. }
            | TableError::CorruptFormat { table_number, .. }
            | TableError::Precondition { table_number, .. }
            | TableError::UnsupportedMode { table_number, .. }
            | TableError::Io { table_number, .. }
            | TableError::Internal { table_number, .. } => Some(*table_number),
            TableError::ConfigFile { .. } => None,
        }
    }
}
