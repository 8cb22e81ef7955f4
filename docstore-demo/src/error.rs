//! Error types for the hello-docstore walkthrough.

use docstore_client::DocStoreError;
use std::path::PathBuf;
use thiserror::Error;

/// Result type for demo operations.
pub type DemoResult<T> = Result<T, DemoError>;

/// Demo error types.
#[derive(Debug, Error)]
pub enum DemoError {
    /// The store or the client rejected an operation.
    #[error(transparent)]
    Store(#[from] DocStoreError),

    /// Settings file could not be read.
    #[error("cannot read settings file {}: {source}", .path.display())]
    SettingsIo {
        /// File path.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// Settings file is not valid TOML for [`crate::Settings`].
    #[error("invalid settings file {}: {source}", .path.display())]
    SettingsParse {
        /// File path.
        path: PathBuf,
        /// Parse error.
        source: toml::de::Error,
    },

    /// A setting failed validation.
    #[error("invalid setting `{field}`: {message}")]
    Validation {
        /// Setting name.
        field: &'static str,
        /// What is wrong with it.
        message: String,
    },

    /// A stored tweet did not decode.
    #[error("cannot decode tweet {id}: {source}")]
    Decode {
        /// Document id.
        id: String,
        /// Decode error.
        source: serde_json::Error,
    },

    /// Writing the walkthrough output failed.
    #[error("output error: {0}")]
    Io(#[from] std::io::Error),
}

impl DemoError {
    pub(crate) fn validation(field: &'static str, message: impl Into<String>) -> Self {
        DemoError::Validation {
            field,
            message: message.into(),
        }
    }
}
