//! Error types for the staging engine
//!
//! None of these are fatal to the running application. Validation and identity
//! errors block the offending transition and leave state unchanged; the rest are
//! surfaced to the caller for reporting.

use std::path::PathBuf;

use thiserror::Error;

use hyuga_backend::BackendError;
use hyuga_common::StateError;

/// Common result type
pub type Result<T> = std::result::Result<T, StagingError>;

/// Failure to turn a picked file into a payload
#[derive(Debug, Error)]
pub enum CaptureError {
    #[error("No file selected")]
    NoFileSelected,

    #[error("Failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Image payload is empty")]
    EmptyPayload,

    #[error("Expected an image, got {0}")]
    NotAnImage(String),
}

/// Attempted to derive an identity before the asset was ready
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum IdentityError {
    #[error("Cannot derive asset identity: {0} is missing")]
    MissingField(&'static str),
}

#[derive(Debug, Error)]
pub enum StagingError {
    #[error("Capture error: {0}")]
    Capture(#[from] CaptureError),

    #[error("Identity error: {0}")]
    Identity(#[from] IdentityError),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Another commit or delete is in flight for asset {asset_id}")]
    ConcurrentOperation { asset_id: String },

    #[error("Sync error: {0}")]
    Sync(#[source] BackendError),

    #[error("Backend error: {0}")]
    Backend(#[from] BackendError),

    #[error("Draft {0} is still open; commit or discard it first")]
    DraftAlreadyOpen(String),

    #[error("Asset {0} is committed and cannot be modified")]
    ImmutableAsset(String),

    #[error("Asset {0} has not been committed")]
    NotCommitted(String),

    #[error("Asset not found: {0}")]
    AssetNotFound(String),

    #[error("No project is open")]
    NoOpenProject,

    #[error("State error: {0}")]
    State(#[from] StateError),
}

impl StagingError {
    /// Stable code for user-facing reporting
    pub fn error_code(&self) -> &'static str {
        match self {
            StagingError::Capture(_) => "CAPTURE_ERROR",
            StagingError::Identity(_) => "IDENTITY_ERROR",
            StagingError::Validation(_) => "VALIDATION_ERROR",
            StagingError::ConcurrentOperation { .. } => "CONCURRENT_OPERATION",
            StagingError::Sync(_) => "SYNC_ERROR",
            StagingError::Backend(_) => "BACKEND_ERROR",
            StagingError::DraftAlreadyOpen(_) => "DRAFT_ALREADY_OPEN",
            StagingError::ImmutableAsset(_) => "IMMUTABLE_ASSET",
            StagingError::NotCommitted(_) => "NOT_COMMITTED",
            StagingError::AssetNotFound(_) => "ASSET_NOT_FOUND",
            StagingError::NoOpenProject => "NO_OPEN_PROJECT",
            StagingError::State(_) => "INVALID_STATE",
        }
    }

    /// True for mistakes in calling code rather than user input or I/O
    pub fn is_programming_error(&self) -> bool {
        matches!(self, StagingError::ImmutableAsset(_))
    }
}
