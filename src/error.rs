//! Typed errors for loading detector records, resolving sample metadata,
//! and computing resolution summaries.
//!
//! Library code returns these so callers can match on the failure instead of
//! the process exiting; the binaries wrap them in `anyhow`.

use std::path::PathBuf;

use thiserror::Error;

use crate::metadata::Attribute;

/// Errors raised while reading or writing per-event record files.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("cannot read directory {}: {source}", .path.display())]
    ReadDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("cannot open {}: {source}", .path.display())]
    Open {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("parquet error in {}: {source}", .path.display())]
    Parquet {
        path: PathBuf,
        #[source]
        source: parquet::errors::ParquetError,
    },

    #[error("arrow error in {}: {source}", .path.display())]
    Arrow {
        path: PathBuf,
        #[source]
        source: arrow::error::ArrowError,
    },

    /// The file has no `cvnmap` column, so its event count is undefined.
    #[error("{} has no 'cvnmap' column", .path.display())]
    MissingPrimaryField { path: PathBuf },

    #[error("{} is missing field '{field}'", .path.display())]
    MissingField { path: PathBuf, field: &'static str },

    #[error("{}: field '{field}' has unsupported type {data_type}", .path.display())]
    UnsupportedColumnType {
        path: PathBuf,
        field: &'static str,
        data_type: String,
    },

    #[error("{}: field '{field}' contains null values", .path.display())]
    NullValues { path: PathBuf, field: &'static str },

    #[error("{}: field '{field}' has {found} values but the file has {expected} events", .path.display())]
    LengthMismatch {
        path: PathBuf,
        field: &'static str,
        expected: usize,
        found: usize,
    },

    /// A field's chunk count diverged from the number of files processed.
    #[error("field '{field}' has {chunks} chunks but {files} files were loaded")]
    InconsistentChunks {
        field: &'static str,
        chunks: usize,
        files: usize,
    },
}

/// An identifying string did not contain any known label for `attribute`.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("could not determine the {attribute} from {input:?}")]
pub struct ClassificationError {
    pub attribute: Attribute,
    pub input: String,
}

/// Errors raised while building a resolution summary.
#[derive(Debug, Error)]
pub enum AnalysisError {
    #[error(transparent)]
    Load(#[from] LoadError),

    #[error(transparent)]
    Classification(#[from] ClassificationError),

    #[error("csv error in {}: {source}", .path.display())]
    Csv {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    #[error("{} has no column '{column}'", .path.display())]
    MissingColumn { path: PathBuf, column: String },

    #[error("{} row {row}: '{value}' in column '{column}' is not a number", .path.display())]
    BadValue {
        path: PathBuf,
        row: usize,
        column: String,
        value: String,
    },

    #[error("{predictions} predictions but {modes} interaction modes")]
    LengthMismatch { predictions: usize, modes: usize },

    #[error("{count} events have an unknown interaction mode")]
    UnknownModeEvents { count: usize },

    #[error("unrecognised interaction mode code {code}")]
    UnrecognisedModeCode { code: i32 },

    #[error("a Combined flux needs an inference sample (Nonswap or Fluxswap)")]
    MissingInferenceSample,

    #[error("cannot write {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("cannot serialize summary: {0}")]
    Json(#[from] serde_json::Error),
}
