//! Error taxonomy shared by the asset pipeline and the config editor.

use std::path::PathBuf;

use thiserror::Error;

use crate::domain::model::AssetCategory;

#[derive(Debug, Error)]
pub enum AdsyncError {
    /// Malformed or missing required input.
    #[error("invalid input: {0}")]
    Validation(String),

    /// An expected directory, file, or export statement is absent.
    #[error("{0} not found")]
    NotFound(String),

    /// A replacement file's category differs from the asset it replaces.
    #[error("replacement must be an {expected} file, got {found}")]
    CategoryMismatch {
        expected: AssetCategory,
        found: AssetCategory,
    },

    /// No matching export statement, or literal text outside the restricted
    /// grammar.
    #[error("parse error at byte {offset}: {message}")]
    Parse { offset: usize, message: String },

    /// Read/write/create failure at the storage boundary.
    #[error("io failure on {path}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The user cancelled an interactive selection. Benign: callers treat
    /// this as a no-op, never as a failure to log or display.
    #[error("operation aborted by user")]
    Aborted,
}

impl AdsyncError {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        AdsyncError::Io {
            path: path.into(),
            source,
        }
    }

    pub fn parse(offset: usize, message: impl Into<String>) -> Self {
        AdsyncError::Parse {
            offset,
            message: message.into(),
        }
    }

    /// True for the benign user-abort signal.
    pub fn is_abort(&self) -> bool {
        matches!(self, AdsyncError::Aborted)
    }
}
