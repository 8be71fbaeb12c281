//! Staging Workflow
//!
//! Sequences draft creation, edits, uploads, commit and delete for the open
//! project against a `ProjectBackend`.
//!
//! Local state lives behind a `std::sync::Mutex` that is only taken between
//! suspension points. Every async operation captures the session number of
//! the open project before it suspends; if the project was closed or another
//! one opened meanwhile, the result is dropped and `Completion::Discarded` is
//! returned.

use std::collections::HashSet;
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use hyuga_backend::{BackendError, PdfExport, ProjectBackend};

use crate::capture::{capture_data_url, capture_file, guess_page_and_section};
use crate::domain::entities::{Asset, AssetPatch, ImageSlot};
use crate::domain::state::StagingState;
use crate::error::{Result, StagingError};
use crate::staging::store::DraftStore;
use crate::staging::sync::{SyncOutcome, Synchronizer};

/// Outcome of an operation that may outlive the project it was started on
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Completion<T> {
    /// The result was applied to the open project
    Applied(T),
    /// The project was closed or replaced before the result arrived
    Discarded,
}

impl<T> Completion<T> {
    pub fn is_discarded(&self) -> bool {
        matches!(self, Completion::Discarded)
    }

    pub fn applied(self) -> Option<T> {
        match self {
            Completion::Applied(value) => Some(value),
            Completion::Discarded => None,
        }
    }
}

#[derive(Debug)]
struct OpenProject {
    session: u64,
    store: DraftStore,
    sync: Synchronizer,
    /// Asset ids with a commit or delete outstanding. A commit holds both the
    /// draft's placeholder id and the content id it is saved under.
    in_flight: HashSet<String>,
}

#[derive(Debug, Default)]
struct WorkflowState {
    sessions: u64,
    open: Option<OpenProject>,
}

impl WorkflowState {
    fn open_mut(&mut self) -> Result<&mut OpenProject> {
        self.open.as_mut().ok_or(StagingError::NoOpenProject)
    }

    /// The open project, if it is still the one `session` was captured from
    fn session_mut(&mut self, session: u64) -> Option<&mut OpenProject> {
        self.open.as_mut().filter(|open| open.session == session)
    }
}

pub struct StagingWorkflow {
    backend: Arc<dyn ProjectBackend>,
    state: Mutex<WorkflowState>,
}

impl StagingWorkflow {
    pub fn new(backend: Arc<dyn ProjectBackend>) -> Self {
        Self {
            backend,
            state: Mutex::new(WorkflowState::default()),
        }
    }

    fn lock(&self) -> MutexGuard<'_, WorkflowState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn with_open<R>(&self, f: impl FnOnce(&mut OpenProject) -> Result<R>) -> Result<R> {
        let mut state = self.lock();
        f(state.open_mut()?)
    }

    /// Id of the open project
    pub fn open_project_id(&self) -> Option<String> {
        self.lock()
            .open
            .as_ref()
            .map(|open| open.store.project_id().to_string())
    }

    /// Open `project_id`, replacing any open project, and seed the store from the backend.
    pub async fn open_project(&self, project_id: &str) -> Result<Completion<Vec<Asset>>> {
        let (session, ticket) = {
            let mut state = self.lock();
            state.sessions += 1;
            let session = state.sessions;
            let mut open = OpenProject {
                session,
                store: DraftStore::new(project_id),
                sync: Synchronizer::new(),
                in_flight: HashSet::new(),
            };
            let ticket = open.sync.begin();
            if let Some(previous) = state.open.replace(open) {
                tracing::info!(
                    project_id = %previous.store.project_id(),
                    "Closing project, pending results will be discarded"
                );
            }
            (session, ticket)
        };

        tracing::info!(%project_id, session, "Opening project");
        let result = self.backend.load_project(project_id).await;

        let mut state = self.lock();
        let Some(open) = state.session_mut(session) else {
            tracing::debug!(%project_id, session, "Project load discarded after navigation");
            return Ok(Completion::Discarded);
        };

        match result {
            Ok(project) => {
                open.sync.apply(ticket, project.assets, &mut open.store);
                tracing::info!(
                    %project_id,
                    name = %project.name,
                    assets = open.store.len(),
                    "Project opened"
                );
                Ok(Completion::Applied(open.store.list_assets()))
            }
            Err(e) => {
                tracing::error!(%project_id, error = %e, "Failed to load project");
                state.open = None;
                Err(StagingError::Sync(e))
            }
        }
    }

    /// Drop the open project. Results still in flight for it are discarded.
    pub fn close_project(&self) {
        let mut state = self.lock();
        state.sessions += 1;
        if let Some(open) = state.open.take() {
            tracing::info!(
                project_id = %open.store.project_id(),
                pending = open.in_flight.len(),
                "Project closed"
            );
        }
    }

    pub fn list_assets(&self) -> Result<Vec<Asset>> {
        self.with_open(|open| Ok(open.store.list_assets()))
    }

    pub fn create_draft(&self) -> Result<Asset> {
        self.with_open(|open| {
            let draft = open.store.create_draft()?.clone();
            tracing::debug!(
                project_id = %open.store.project_id(),
                asset_id = %draft.id,
                "Draft created"
            );
            Ok(draft)
        })
    }

    /// Merge `patch` into a draft and return its new state
    pub fn update_draft(&self, id: &str, patch: &AssetPatch) -> Result<StagingState> {
        self.with_open(|open| {
            let state = open.store.update_draft(id, patch)?;
            tracing::debug!(asset_id = %id, %state, "Draft updated");
            Ok(state)
        })
    }

    /// Store an already-encoded image (a bare payload or a data URL) in a draft slot
    pub fn set_image(&self, id: &str, slot: ImageSlot, payload: &str) -> Result<StagingState> {
        let payload = capture_data_url(payload)?;
        self.update_draft(id, &AssetPatch::new().image(slot, payload))
    }

    /// Read a picked file into a draft slot.
    ///
    /// `file` is `None` when the picker was cancelled.
    pub async fn upload_image(
        &self,
        id: &str,
        slot: ImageSlot,
        file: Option<&Path>,
    ) -> Result<Completion<StagingState>> {
        let session = self.with_open(|open| {
            let asset = open
                .store
                .get(id)
                .ok_or_else(|| StagingError::AssetNotFound(id.to_string()))?;
            if asset.saved {
                return Err(StagingError::ImmutableAsset(id.to_string()));
            }
            Ok(open.session)
        })?;

        let payload = capture_file(file).await?;
        self.apply_upload(session, id, slot, payload)
    }

    /// Store a captured payload, unless the project or the draft went away while reading
    fn apply_upload(
        &self,
        session: u64,
        id: &str,
        slot: ImageSlot,
        payload: String,
    ) -> Result<Completion<StagingState>> {
        let mut state = self.lock();
        let Some(open) = state.session_mut(session) else {
            tracing::debug!(asset_id = %id, %slot, "Upload discarded after navigation");
            return Ok(Completion::Discarded);
        };
        if open.store.get(id).is_none() {
            tracing::debug!(asset_id = %id, %slot, "Upload discarded, draft is gone");
            return Ok(Completion::Discarded);
        }

        let next = open
            .store
            .update_draft(id, &AssetPatch::new().image(slot, payload))?;
        tracing::info!(asset_id = %id, %slot, state = %next, "Image uploaded");
        Ok(Completion::Applied(next))
    }

    /// Prefill empty page/section fields from picked file names
    pub fn apply_filename_hints<S: AsRef<str>>(
        &self,
        id: &str,
        names: &[S],
    ) -> Result<StagingState> {
        let hints = guess_page_and_section(names);
        self.with_open(|open| {
            let asset = open
                .store
                .get(id)
                .ok_or_else(|| StagingError::AssetNotFound(id.to_string()))?;

            let mut patch = AssetPatch::new();
            if asset.page_number.is_empty() {
                patch.page_number = hints.page_number;
            }
            if asset.section.is_empty() {
                patch.section = hints.section;
            }
            if patch.is_empty() {
                return Ok(asset.state);
            }
            open.store.update_draft(id, &patch)
        })
    }

    pub fn readiness_of(&self, id: &str) -> Result<bool> {
        self.with_open(|open| open.store.readiness_of(id))
    }

    pub fn state_of(&self, id: &str) -> Result<StagingState> {
        self.with_open(|open| {
            open.store
                .get(id)
                .map(|asset| asset.state)
                .ok_or_else(|| StagingError::AssetNotFound(id.to_string()))
        })
    }

    /// Remove an unsaved draft without contacting the backend
    pub fn discard_draft(&self, id: &str) -> Result<()> {
        self.with_open(|open| {
            open.store.remove_draft(id)?;
            tracing::info!(asset_id = %id, "Draft discarded");
            Ok(())
        })
    }

    /// Commit a ready draft under its content id, then refresh.
    pub async fn commit(&self, id: &str) -> Result<Completion<Asset>> {
        let (session, project_id, record) = self.with_open(|open| {
            if open.in_flight.contains(id) {
                return Err(StagingError::ConcurrentOperation {
                    asset_id: id.to_string(),
                });
            }
            let previous_error = open.store.get(id).and_then(|asset| asset.error.clone());
            let record = open.store.begin_commit(id)?;
            if open.in_flight.contains(&record.id) {
                open.store.cancel_commit(id, previous_error)?;
                return Err(StagingError::ConcurrentOperation {
                    asset_id: record.id,
                });
            }
            open.in_flight.insert(id.to_string());
            open.in_flight.insert(record.id.clone());
            Ok((open.session, open.store.project_id().to_string(), record))
        })?;

        tracing::info!(%project_id, asset_id = %id, content_id = %record.id, "Committing asset");
        let result = self.backend.save_asset(&project_id, record.clone()).await;

        let committed = {
            let mut state = self.lock();
            let Some(open) = state.session_mut(session) else {
                tracing::debug!(asset_id = %id, "Commit result discarded after navigation");
                return Ok(Completion::Discarded);
            };
            open.in_flight.remove(id);
            open.in_flight.remove(&record.id);

            if let Err(e) = result {
                tracing::warn!(%project_id, asset_id = %id, error = %e, "Commit failed, rolling back");
                if open.store.rollback_commit(id, e.to_string()).is_err() {
                    tracing::debug!(asset_id = %id, "Draft discarded before commit failed");
                }
                return Err(StagingError::Backend(e));
            }

            open.sync.supersede_outstanding();
            if !open.store.complete_commit(id, &record.id) {
                tracing::debug!(asset_id = %id, "Draft discarded while committing");
            }
            open.store
                .get(&record.id)
                .cloned()
                .unwrap_or_else(|| Asset::from_record(record))
        };

        tracing::info!(%project_id, asset_id = %committed.id, "Asset committed");
        self.refresh_after_mutation().await;
        Ok(Completion::Applied(committed))
    }

    /// Delete a committed asset from the backend, then refresh.
    ///
    /// On failure the asset stays with its error flag set.
    pub async fn delete_asset(&self, id: &str) -> Result<Completion<()>> {
        let (session, project_id) = self.with_open(|open| {
            let asset = open
                .store
                .get(id)
                .ok_or_else(|| StagingError::AssetNotFound(id.to_string()))?;
            if !asset.saved {
                return Err(StagingError::NotCommitted(id.to_string()));
            }
            if !open.in_flight.insert(id.to_string()) {
                return Err(StagingError::ConcurrentOperation {
                    asset_id: id.to_string(),
                });
            }
            Ok((open.session, open.store.project_id().to_string()))
        })?;

        tracing::info!(%project_id, asset_id = %id, "Deleting asset");
        let result = self.backend.delete_asset(&project_id, id).await;

        {
            let mut state = self.lock();
            let Some(open) = state.session_mut(session) else {
                tracing::debug!(asset_id = %id, "Delete result discarded after navigation");
                return Ok(Completion::Discarded);
            };
            open.in_flight.remove(id);

            match result {
                Ok(()) => {}
                Err(BackendError::NotFound(message)) => {
                    tracing::debug!(asset_id = %id, %message, "Asset already gone from backend");
                }
                Err(e) => {
                    tracing::warn!(%project_id, asset_id = %id, error = %e, "Delete failed");
                    open.store.set_error(id, Some(e.to_string()));
                    return Err(StagingError::Backend(e));
                }
            }

            open.sync.supersede_outstanding();
            open.store.remove_committed(id);
        }

        tracing::info!(%project_id, asset_id = %id, "Asset deleted");
        self.refresh_after_mutation().await;
        Ok(Completion::Applied(()))
    }

    /// Fetch the backend's asset list and reconcile the store with it.
    pub async fn refresh(&self) -> Result<Completion<Vec<Asset>>> {
        let (session, project_id, ticket) = self.with_open(|open| {
            let ticket = open.sync.begin();
            Ok((open.session, open.store.project_id().to_string(), ticket))
        })?;

        tracing::debug!(%project_id, seq = ticket.seq(), "Refreshing assets");
        let result = self.backend.list_assets(&project_id).await;

        let mut state = self.lock();
        let Some(open) = state.session_mut(session) else {
            tracing::debug!(%project_id, seq = ticket.seq(), "Refresh discarded after navigation");
            return Ok(Completion::Discarded);
        };

        match result {
            Ok(records) => match open.sync.apply(ticket, records, &mut open.store) {
                SyncOutcome::Applied => Ok(Completion::Applied(open.store.list_assets())),
                SyncOutcome::Stale => Ok(Completion::Discarded),
            },
            Err(e) if open.sync.is_stale(ticket) => {
                tracing::debug!(%project_id, seq = ticket.seq(), error = %e, "Stale refresh failed");
                Ok(Completion::Discarded)
            }
            Err(e) => {
                tracing::warn!(%project_id, seq = ticket.seq(), error = %e, "Refresh failed");
                Err(StagingError::Sync(e))
            }
        }
    }

    async fn refresh_after_mutation(&self) {
        if let Err(e) = self.refresh().await {
            tracing::warn!(error = %e, "Refresh after mutation failed");
        }
    }

    /// Export the open project's committed assets as a PDF
    pub async fn generate_pdf(&self) -> Result<PdfExport> {
        let project_id = self.with_open(|open| Ok(open.store.project_id().to_string()))?;

        tracing::info!(%project_id, "Generating PDF");
        let export = self.backend.generate_pdf(&project_id).await.map_err(|e| {
            tracing::error!(%project_id, error = %e, "PDF generation failed");
            StagingError::Backend(e)
        })?;
        tracing::info!(%project_id, pages = export.page_count, "PDF generated");
        Ok(export)
    }
}
