//! File-backed backend
//!
//! Layout under the data directory:
//!
//! ```text
//! projects/
//!   project-<id>/
//!     project.json   # {id, name, created_at, assets: [AssetRecord]}
//!     output.pdf     # written by generate_pdf
//! ```

use std::path::{Path, PathBuf};
use std::sync::Arc;

use tokio::sync::Mutex;

use crate::{names, require_id, AssetRecord, BackendError, PdfExport, Project, ProjectBackend};

const PROJECTS_DIR: &str = "projects";
const PROJECT_DIR_PREFIX: &str = "project-";
const PROJECT_FILE: &str = "project.json";
const OUTPUT_FILE: &str = "output.pdf";

/// One decoded page handed to a [`PdfRenderer`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PdfPage {
    pub asset_id: String,
    pub page_number: String,
    pub section: String,
    /// Raw cutout image bytes
    pub image: Vec<u8>,
}

/// Renders pages into a PDF document. Layout is entirely up to the renderer.
pub trait PdfRenderer: Send + Sync {
    fn render(&self, project: &Project, pages: &[PdfPage]) -> Result<Vec<u8>, BackendError>;
}

/// Backend storing one JSON document per project
pub struct LocalBackend {
    data_dir: PathBuf,
    renderer: Option<Arc<dyn PdfRenderer>>,
    // Serializes read-modify-write cycles on project files
    write_lock: Mutex<()>,
}

impl std::fmt::Debug for LocalBackend {
    #[mutants::skip] // Debug output only
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LocalBackend")
            .field("data_dir", &self.data_dir)
            .field("renderer", &self.renderer.as_ref().map(|_| "[renderer]"))
            .finish()
    }
}

impl LocalBackend {
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
            renderer: None,
            write_lock: Mutex::new(()),
        }
    }

    /// Attach the renderer used by `generate_pdf`
    pub fn with_renderer(mut self, renderer: Arc<dyn PdfRenderer>) -> Self {
        self.renderer = Some(renderer);
        self
    }

    fn projects_dir(&self) -> PathBuf {
        self.data_dir.join(PROJECTS_DIR)
    }

    fn project_dir(&self, project_id: &str) -> PathBuf {
        self.projects_dir()
            .join(format!("{}{}", PROJECT_DIR_PREFIX, project_id))
    }

    fn project_file(&self, project_id: &str) -> PathBuf {
        self.project_dir(project_id).join(PROJECT_FILE)
    }

    async fn read_project(&self, project_id: &str) -> Result<Project, BackendError> {
        require_id("projectId", project_id)?;
        let path = self.project_file(project_id);
        let bytes = tokio::fs::read(&path).await.map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                BackendError::NotFound(format!("project {} not found", project_id))
            } else {
                BackendError::Io(e)
            }
        })?;
        Ok(serde_json::from_slice(&bytes)?)
    }

    async fn write_project(&self, project: &Project) -> Result<(), BackendError> {
        let path = self.project_file(&project.id);
        let data = serde_json::to_vec_pretty(project)?;
        write_atomic(&path, &data).await
    }
}

/// Write to a sibling temp file, then rename over the target
async fn write_atomic(path: &Path, data: &[u8]) -> Result<(), BackendError> {
    let mut tmp = path.as_os_str().to_owned();
    tmp.push(".tmp");
    let tmp = PathBuf::from(tmp);
    tokio::fs::write(&tmp, data).await?;
    tokio::fs::rename(&tmp, path).await?;
    Ok(())
}

#[async_trait::async_trait]
impl ProjectBackend for LocalBackend {
    async fn list_projects(&self) -> Result<Vec<Project>, BackendError> {
        let dir = self.projects_dir();
        tokio::fs::create_dir_all(&dir).await?;

        let mut entries = tokio::fs::read_dir(&dir).await?;
        let mut projects = Vec::new();
        while let Some(entry) = entries.next_entry().await? {
            let name = entry.file_name();
            let name = name.to_string_lossy();
            if !name.starts_with(PROJECT_DIR_PREFIX) || !entry.file_type().await?.is_dir() {
                continue;
            }

            let path = entry.path().join(PROJECT_FILE);
            let bytes = match tokio::fs::read(&path).await {
                Ok(bytes) => bytes,
                Err(e) => {
                    tracing::warn!(path = %path.display(), error = %e, "Skipping unreadable project");
                    continue;
                }
            };
            match serde_json::from_slice::<Project>(&bytes) {
                Ok(project) => projects.push(project),
                Err(e) => {
                    tracing::warn!(path = %path.display(), error = %e, "Skipping invalid project file");
                }
            }
        }

        projects.sort_by(|a, b| {
            a.created_at
                .cmp(&b.created_at)
                .then_with(|| a.id.cmp(&b.id))
        });
        Ok(projects)
    }

    async fn create_project(&self) -> Result<Project, BackendError> {
        let project = Project::new_named(names::generate_name()?);

        let _guard = self.write_lock.lock().await;
        tokio::fs::create_dir_all(self.project_dir(&project.id)).await?;
        self.write_project(&project).await?;

        tracing::info!(project_id = %project.id, name = %project.name, "Created project");
        Ok(project)
    }

    async fn delete_project(&self, project_id: &str) -> Result<(), BackendError> {
        require_id("projectId", project_id)?;

        let _guard = self.write_lock.lock().await;
        match tokio::fs::remove_dir_all(self.project_dir(project_id)).await {
            Ok(()) => {
                tracing::info!(project_id = %project_id, "Deleted project");
                Ok(())
            }
            // Already gone
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    async fn load_project(&self, project_id: &str) -> Result<Project, BackendError> {
        self.read_project(project_id).await
    }

    async fn list_assets(&self, project_id: &str) -> Result<Vec<AssetRecord>, BackendError> {
        Ok(self.read_project(project_id).await?.assets)
    }

    async fn save_asset(&self, project_id: &str, record: AssetRecord) -> Result<(), BackendError> {
        require_id("assetId", &record.id)?;

        let _guard = self.write_lock.lock().await;
        let mut project = self.read_project(project_id).await?;
        if project.assets.iter().any(|a| a.id == record.id) {
            tracing::debug!(project_id = %project_id, asset_id = %record.id, "Asset already stored");
            return Ok(());
        }

        tracing::info!(project_id = %project_id, asset_id = %record.id, "Saving asset");
        project.assets.push(record);
        self.write_project(&project).await
    }

    async fn delete_asset(&self, project_id: &str, asset_id: &str) -> Result<(), BackendError> {
        require_id("assetId", asset_id)?;

        let _guard = self.write_lock.lock().await;
        let mut project = self.read_project(project_id).await?;
        let index = project
            .assets
            .iter()
            .position(|a| a.id == asset_id)
            .ok_or_else(|| {
                BackendError::NotFound(format!(
                    "asset {} not found in project {}",
                    asset_id, project_id
                ))
            })?;

        // `remove` keeps the display order of the remaining assets
        project.assets.remove(index);
        tracing::info!(project_id = %project_id, asset_id = %asset_id, "Deleted asset");
        self.write_project(&project).await
    }

    async fn generate_pdf(&self, project_id: &str) -> Result<PdfExport, BackendError> {
        let renderer = self.renderer.clone().ok_or_else(|| {
            BackendError::Unsupported("no PDF renderer configured".to_string())
        })?;
        let project = self.read_project(project_id).await?;

        let pages = project
            .assets
            .iter()
            .map(|asset| {
                let image = hyuga_common::decode_payload(&asset.cutout).map_err(|e| {
                    BackendError::Render(format!(
                        "cutout of asset {} is not valid base64: {}",
                        asset.id, e
                    ))
                })?;
                Ok(PdfPage {
                    asset_id: asset.id.clone(),
                    page_number: asset.page_number.clone(),
                    section: asset.section.clone(),
                    image,
                })
            })
            .collect::<Result<Vec<_>, BackendError>>()?;

        let page_count = pages.len();
        let document = tokio::task::spawn_blocking(move || renderer.render(&project, &pages))
            .await
            .map_err(|e| BackendError::Internal(format!("PDF render task failed: {}", e)))??;
        let output = self.project_dir(project_id).join(OUTPUT_FILE);
        write_atomic(&output, &document).await?;

        tracing::info!(
            project_id = %project_id,
            pages = page_count,
            output = %output.display(),
            "Generated PDF"
        );
        Ok(PdfExport {
            project_id: project_id.to_string(),
            page_count,
            output: Some(output),
        })
    }
}
