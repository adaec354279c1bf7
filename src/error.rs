//! Error taxonomy for the comparison pipeline.
//!
//! Every stage either succeeds completely or returns one of these errors; the
//! binary aborts before writing any output when one surfaces.

use std::path::{Path, PathBuf};

use thiserror::Error;

/// Crate-wide result alias.
pub type Result<T> = std::result::Result<T, CompareError>;

/// Failures raised while loading, reconciling, aligning, or rendering tables.
#[derive(Debug, Error)]
pub enum CompareError {
    /// An expected sheet, column, or value shape is absent from an input.
    #[error("input format error in {origin}: {message}")]
    InputFormat { origin: String, message: String },

    /// A generator's raw fuel or unit-type code has no category mapping.
    #[error("generator `{generator}` has fuel code `{label}` with no fuel category mapping")]
    UnmappedCategory { generator: String, label: String },

    /// A generator column has no entry in the generator registry.
    #[error("generator `{0}` is not present in the generator registry")]
    UnregisteredGenerator(String),

    /// Two tables that must share row and column indices do not.
    #[error("index misalignment: {0}")]
    IndexMisalignment(String),

    #[error("I/O error on `{}`: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    Csv(#[from] csv::Error),

    #[error("workbook `{}`: {message}", path.display())]
    Workbook { path: PathBuf, message: String },

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error("chart rendering failed: {0}")]
    Render(String),

    #[error("invalid configuration:\n{0}")]
    Config(String),
}

impl CompareError {
    pub(crate) fn input(origin: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InputFormat {
            origin: origin.into(),
            message: message.into(),
        }
    }

    pub(crate) fn io(path: &Path, source: std::io::Error) -> Self {
        Self::Io {
            path: path.to_path_buf(),
            source,
        }
    }
}
