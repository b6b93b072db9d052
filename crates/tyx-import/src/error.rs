//! Import errors.
//!
//! Everything the importer can object to falls into one of three domains:
//! version mismatches (split into "newer than this tool" and "unknown" so
//! the user knows whether to update the tool or rebuild the data), format
//! violations (bad varints, short reads, unexpected tags), and
//! consistency violations (the data contradicts itself or the caller's
//! import table).

use crate::reader::ReadError;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ImportError {
    /// The export data was produced by a newer writer.
    #[error("export data is newer version {0} - update tool")]
    NewerVersion(u64),

    /// The version is not one this importer knows.
    #[error("unknown export data format version {0}")]
    UnknownVersion(u64),

    #[error("format error: {0}")]
    Format(String),

    #[error("inconsistent export data: {0}")]
    Consistency(String),
}

impl From<ReadError> for ImportError {
    fn from(e: ReadError) -> ImportError {
        ImportError::Format(e.to_string())
    }
}

pub(crate) fn format_err(msg: impl Into<String>) -> ImportError {
    ImportError::Format(msg.into())
}

pub(crate) fn consistency_err(msg: impl Into<String>) -> ImportError {
    ImportError::Consistency(msg.into())
}
