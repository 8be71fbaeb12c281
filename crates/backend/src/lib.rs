//! Hyuga Backend Service
//!
//! The authoritative store for projects and their committed assets:
//! - `ProjectBackend`: async service trait consumed by the staging engine
//! - `LocalBackend`: file-backed store under a data directory
//! - `MockBackend`: in-memory store with programmable failures and call gates
//! - `A4PdfRenderer`: default export layout, one cutout per A4 page
//! - Project name generation for newly created projects

pub mod local;
pub mod mock;
pub mod names;
pub mod pdf;

use std::path::PathBuf;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use hyuga_common::Config;

pub use local::{LocalBackend, PdfPage, PdfRenderer};
pub use pdf::A4PdfRenderer;
pub use mock::{BackendOperation, CallGate, MockBackend, MockBackendBehavior};

#[derive(Error, Debug)]
pub enum BackendError {
    #[error("Backend configuration error: {0}")]
    Configuration(String),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Backend request error: {0}")]
    Request(String),

    #[error("Unsupported operation: {0}")]
    Unsupported(String),

    #[error("Render error: {0}")]
    Render(String),

    #[error("Storage error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}

/// Asset as stored by the backend. Images are bare base64 payloads.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssetRecord {
    pub id: String,
    pub sheet: String,
    pub cutout: String,
    pub page_number: String,
    pub section: String,
}

/// Project as stored by the backend
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Project {
    pub id: String,
    pub name: String,
    /// Local time, `YYYY-MM-DD HH:MM:SS`
    pub created_at: String,
    #[serde(default)]
    pub assets: Vec<AssetRecord>,
}

impl Project {
    /// Create an empty project with a fresh id, generated name, and local timestamp
    pub fn new_named(name: String) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            name,
            created_at: chrono::Local::now()
                .format(CREATED_AT_FORMAT)
                .to_string(),
            assets: Vec::new(),
        }
    }
}

/// Display format for `Project::created_at`
pub const CREATED_AT_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Result of a PDF export
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PdfExport {
    pub project_id: String,
    pub page_count: usize,
    /// Where the document was written, if the backend writes to disk
    pub output: Option<PathBuf>,
}

/// Backend service trait for different storage implementations.
///
/// `save_asset` must be idempotent: saving a record whose id already exists in
/// the project is a no-op.
#[async_trait::async_trait]
pub trait ProjectBackend: Send + Sync {
    async fn list_projects(&self) -> Result<Vec<Project>, BackendError>;

    async fn create_project(&self) -> Result<Project, BackendError>;

    async fn delete_project(&self, project_id: &str) -> Result<(), BackendError>;

    async fn load_project(&self, project_id: &str) -> Result<Project, BackendError>;

    async fn list_assets(&self, project_id: &str) -> Result<Vec<AssetRecord>, BackendError>;

    async fn save_asset(&self, project_id: &str, record: AssetRecord) -> Result<(), BackendError>;

    async fn delete_asset(&self, project_id: &str, asset_id: &str) -> Result<(), BackendError>;

    async fn generate_pdf(&self, project_id: &str) -> Result<PdfExport, BackendError>;
}

/// Reject blank identifiers before touching storage
pub(crate) fn require_id(kind: &str, value: &str) -> Result<(), BackendError> {
    if value.trim().is_empty() {
        return Err(BackendError::InvalidArgument(format!("{} is required", kind)));
    }
    Ok(())
}

/// Backend service configuration
#[derive(Debug, Clone)]
pub struct BackendConfig {
    /// Backend provider (local, mock)
    pub provider: String,
    /// Root directory for the local provider
    pub data_dir: PathBuf,
}

impl From<&Config> for BackendConfig {
    fn from(config: &Config) -> Self {
        Self {
            provider: config.backend_provider.clone(),
            data_dir: config.data_dir.clone(),
        }
    }
}

/// Factory for creating ProjectBackend implementations
pub struct BackendServiceFactory;

impl BackendServiceFactory {
    /// Create a ProjectBackend based on configuration
    pub fn create(config: BackendConfig) -> Result<Box<dyn ProjectBackend>, BackendError> {
        match config.provider.as_str() {
            "local" => {
                tracing::info!(data_dir = %config.data_dir.display(), "Creating local backend");
                if config.data_dir.as_os_str().is_empty() {
                    return Err(BackendError::Configuration(
                        "HYUGA_DATA_DIR is required for local provider".to_string(),
                    ));
                }
                Ok(Box::new(
                    LocalBackend::new(config.data_dir).with_renderer(Arc::new(A4PdfRenderer)),
                ))
            }
            "mock" => {
                tracing::info!("Creating mock backend");
                Ok(Box::new(MockBackend::new()))
            }
            provider => Err(BackendError::Configuration(format!(
                "Unknown backend provider: {}. Supported providers: local, mock",
                provider
            ))),
        }
    }
}
