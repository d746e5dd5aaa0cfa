//! Error type shared by every tool.
//!
//! Only file-level problems are errors. Row-level problems are reported as
//! [`crate::models::RowWarning`] values and never abort a run.

use std::path::PathBuf;

use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    #[error("File not found: {}", path.display())]
    FileNotFound { path: PathBuf },

    #[error("Invalid JSON file - {}", path.display())]
    InvalidJson {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Unexpected cache format in {}: {source}", path.display())]
    CacheFormat {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("CSV file is empty: {}", path.display())]
    EmptyInput { path: PathBuf },

    #[error("Required column '{column}' not found in {}", path.display())]
    MissingColumn { column: String, path: PathBuf },

    #[error("Code space exhausted: {rows} rows but only {capacity} identifiers available")]
    CodeSpaceExhausted { rows: usize, capacity: usize },

    #[error("Safety check failed: {0}")]
    UnsafeOutput(String),

    #[error("I/O error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl Error {
    /// Wraps an I/O error, mapping `NotFound` to [`Error::FileNotFound`].
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        let path = path.into();
        if source.kind() == std::io::ErrorKind::NotFound {
            Error::FileNotFound { path }
        } else {
            Error::Io { path, source }
        }
    }

    /// Classifies a serde_json failure: syntax problems versus a valid
    /// document with the wrong shape.
    pub fn json(path: impl Into<PathBuf>, source: serde_json::Error) -> Self {
        let path = path.into();
        match source.classify() {
            serde_json::error::Category::Data => Error::CacheFormat { path, source },
            serde_json::error::Category::Io => Error::Io {
                path,
                source: source.into(),
            },
            _ => Error::InvalidJson { path, source },
        }
    }
}
