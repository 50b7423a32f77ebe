//! Error types shared across the crate

use std::path::PathBuf;

use thiserror::Error;

/// Errors raised while configuring a session or uploading assets
#[derive(Debug, Error)]
pub enum BlokError {
    /// A required session setting is missing or invalid. Fatal, raised before any job runs.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// The entry's contents are not materialized in memory
    #[error("streams are not supported: {}", path.display())]
    UnsupportedInput { path: PathBuf },

    /// The remote API answered with a non-success status
    #[error("remote API returned {status}: {body}")]
    Remote { status: u16, body: String },

    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, BlokError>;
