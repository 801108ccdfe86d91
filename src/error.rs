use std::path::PathBuf;

use thiserror::Error;

// ---------------------------------------------------------------------------
// Per-file errors
// ---------------------------------------------------------------------------

/// The parent folder name does not follow `{sample}{sep}{scan}{sep}{flag}`.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PathFormatError {
    #[error("path has no parent folder to read metadata from")]
    MissingParent,

    #[error("folder name '{segment}' contains neither '-' nor '_'")]
    NoSeparator { segment: String },

    #[error("folder name '{segment}' has {found} fields, expected at least {expected}")]
    TooFewFields {
        segment: String,
        found: usize,
        expected: usize,
    },
}

/// The numeric body of a `.t2t` file could not be decoded.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ParseError {
    #[error("line {line}, column {column}: '{value}' is not a number")]
    NotANumber {
        line: usize,
        column: usize,
        value: String,
    },

    #[error("line {line}: expected {expected} fields, found {found}")]
    RaggedRow {
        line: usize,
        expected: usize,
        found: usize,
    },

    #[error("rows have {found} values, need at least 3 for X, Y, Z")]
    TooFewColumns { found: usize },

    #[error("no data rows after the {header_lines}-line header")]
    NoDataRows { header_lines: usize },
}

// ---------------------------------------------------------------------------
// Crate-wide error
// ---------------------------------------------------------------------------

#[derive(Error, Debug)]
pub enum ExportError {
    #[error("walking {}: {source}", .root.display())]
    Discovery {
        root: PathBuf,
        #[source]
        source: walkdir::Error,
    },

    #[error("reading {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("{}: {source}", .path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: ParseError,
    },

    #[error("{}: {source}", .path.display())]
    PathFormat {
        path: PathBuf,
        #[source]
        source: PathFormatError,
    },

    #[error("{}: {found} channels, but earlier files have {expected}", .path.display())]
    SchemaMismatch {
        path: PathBuf,
        expected: usize,
        found: usize,
    },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Arrow error: {0}")]
    Arrow(#[from] arrow::error::ArrowError),

    #[error("Parquet error: {0}")]
    Parquet(#[from] parquet::errors::ParquetError),
}

pub type Result<T> = std::result::Result<T, ExportError>;
