//! Codec error types.
//!
//! Only document-level and I/O failures are errors. Per-entity problems
//! (malformed colors, unresolved references) are recovered locally and
//! reported through the export/import reports instead.

use std::path::PathBuf;

use thiserror::Error;

use radio_model::ModelError;

#[derive(Debug, Error)]
pub enum CodecError {
    /// The input document cannot be understood as a whole.
    #[error("malformed document: {reason}")]
    MalformedDocument { reason: String },

    /// The XML writer rejected an event.
    #[error("failed to render document: {0}")]
    Render(String),

    /// File I/O error.
    #[error("failed to {operation} file: {path}")]
    Io {
        operation: &'static str,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The temp file was written but could not be moved into place.
    #[error("failed to replace {target_path} with {temp_path}")]
    AtomicWriteFailed {
        temp_path: PathBuf,
        target_path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Two recorded media items render to the same translation key.
    #[error("translation key {key} is used by both {first} and {second}")]
    DuplicateKey {
        key: String,
        first: String,
        second: String,
    },

    /// The project file was written by a newer schema.
    #[error("unsupported project schema {found} in {path} (max {max_supported})")]
    UnsupportedVersion {
        found: u32,
        max_supported: u32,
        path: PathBuf,
    },

    #[error("project file serialization failed")]
    Serialization(#[from] serde_json::Error),

    /// A loaded project violates a model invariant.
    #[error("invalid project: {0}")]
    Model(#[from] ModelError),
}

impl CodecError {
    pub(crate) fn malformed(reason: impl Into<String>) -> Self {
        Self::MalformedDocument {
            reason: reason.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, CodecError>;
