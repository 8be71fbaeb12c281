//! Project catalog
//!
//! The list of projects shown before one is opened. Fetches follow the same
//! sequence discipline as asset refreshes: an older response never replaces a
//! newer one.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use hyuga_backend::{BackendError, Project, ProjectBackend};

use crate::error::{Result, StagingError};
use crate::staging::sync::RefreshSequence;
use crate::staging::workflow::Completion;

#[derive(Debug, Default)]
struct CatalogState {
    sequence: RefreshSequence,
    projects: Vec<Project>,
}

pub struct ProjectCatalog {
    backend: Arc<dyn ProjectBackend>,
    state: Mutex<CatalogState>,
}

impl ProjectCatalog {
    pub fn new(backend: Arc<dyn ProjectBackend>) -> Self {
        Self {
            backend,
            state: Mutex::new(CatalogState::default()),
        }
    }

    fn lock(&self) -> MutexGuard<'_, CatalogState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Last known list of projects
    pub fn projects(&self) -> Vec<Project> {
        self.lock().projects.clone()
    }

    pub async fn refresh(&self) -> Result<Completion<Vec<Project>>> {
        let ticket = self.lock().sequence.begin();

        tracing::debug!(seq = ticket.seq(), "Refreshing project list");
        let result = self.backend.list_projects().await;

        let mut state = self.lock();
        match result {
            Ok(projects) => {
                if !state.sequence.accept(ticket) {
                    tracing::debug!(seq = ticket.seq(), "Discarding stale project list");
                    return Ok(Completion::Discarded);
                }
                tracing::debug!(seq = ticket.seq(), count = projects.len(), "Applied project list");
                state.projects = projects;
                Ok(Completion::Applied(state.projects.clone()))
            }
            Err(e) if state.sequence.is_stale(ticket) => {
                tracing::debug!(seq = ticket.seq(), error = %e, "Stale project list fetch failed");
                Ok(Completion::Discarded)
            }
            Err(e) => {
                tracing::warn!(error = %e, "Failed to list projects");
                Err(StagingError::Sync(e))
            }
        }
    }

    /// Create a project with a generated name
    pub async fn create_project(&self) -> Result<Project> {
        let project = self.backend.create_project().await?;
        tracing::info!(project_id = %project.id, name = %project.name, "Project created");

        {
            let mut state = self.lock();
            state.sequence.supersede_outstanding();
            if !state.projects.iter().any(|p| p.id == project.id) {
                state.projects.push(project.clone());
            }
        }

        self.refresh_after_mutation().await;
        Ok(project)
    }

    /// Delete a project and everything in it. Deleting a missing project succeeds.
    pub async fn delete_project(&self, project_id: &str) -> Result<()> {
        match self.backend.delete_project(project_id).await {
            Ok(()) => {}
            Err(BackendError::NotFound(message)) => {
                tracing::debug!(%project_id, %message, "Project already gone");
            }
            Err(e) => {
                tracing::warn!(%project_id, error = %e, "Failed to delete project");
                return Err(StagingError::Backend(e));
            }
        }
        tracing::info!(%project_id, "Project deleted");

        {
            let mut state = self.lock();
            state.sequence.supersede_outstanding();
            state.projects.retain(|p| p.id != project_id);
        }

        self.refresh_after_mutation().await;
        Ok(())
    }

    async fn refresh_after_mutation(&self) {
        if let Err(e) = self.refresh().await {
            tracing::warn!(error = %e, "Refresh after mutation failed");
        }
    }
}
