//! Custom error types for the h5ad-alt-reader crate.

use std::path::PathBuf;
use thiserror::Error;

/// The primary error type for all operations in this crate.
///
/// Every variant carries the container path (or top-level key) of the node
/// that failed, so callers can locate the malformed entry.
#[derive(Debug, Error)]
pub enum H5adError {
    /// An error originating from backend I/O operations.
    #[error("I/O error: {0:?}")]
    Io(#[from] std::io::Error),

    /// The container file does not exist or cannot be opened.
    #[error("Container not found: {}", .0.display())]
    NotFound(PathBuf),

    /// A node is structurally invalid: unsupported sparse format, missing child
    /// dataset, inconsistent attributes or a buffer that does not match its dtype.
    #[error("Invalid format at '{path}': {reason}")]
    Format { path: String, reason: String },

    /// More than one legacy spelling of the same canonical section is present.
    #[error("Inconsistent file: section '{section}' is stored under several keys: {keys:?}")]
    AliasConflict { section: String, keys: Vec<String> },

    /// Text decoding failed, or a legacy dictionary string is not a valid literal.
    #[error("Decode error at '{path}': {reason}")]
    Decode { path: String, reason: String },
}

impl H5adError {
    pub(crate) fn format(path: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Format {
            path: path.into(),
            reason: reason.into(),
        }
    }

    pub(crate) fn decode(path: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Decode {
            path: path.into(),
            reason: reason.into(),
        }
    }

    /// Container path or key the error refers to, when there is exactly one.
    pub fn path(&self) -> Option<&str> {
        match self {
            Self::Format { path, .. } | Self::Decode { path, .. } => Some(path),
            Self::NotFound(path) => path.to_str(),
            Self::AliasConflict { .. } | Self::Io(_) => None,
        }
    }
}

/// A convenience `Result` type alias using the crate's `H5adError` type.
pub type Result<T> = std::result::Result<T, H5adError>;
