//! Asset Draft Store
//!
//! Ordered assets of the open project: committed assets in arrival order from
//! the last synchronization, then at most one unsaved draft.

use hyuga_backend::AssetRecord;

use crate::domain::entities::{readiness_of, Asset, AssetPatch};
use crate::domain::state::{StagingEvent, StagingState, StagingStateMachine};
use crate::error::{Result, StagingError};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DraftStore {
    project_id: String,
    assets: Vec<Asset>,
}

impl DraftStore {
    pub fn new(project_id: impl Into<String>) -> Self {
        Self {
            project_id: project_id.into(),
            assets: Vec::new(),
        }
    }

    pub fn project_id(&self) -> &str {
        &self.project_id
    }

    pub fn get(&self, id: &str) -> Option<&Asset> {
        self.assets.iter().find(|a| a.id == id)
    }

    fn get_or_not_found(&self, id: &str) -> Result<&Asset> {
        self.get(id)
            .ok_or_else(|| StagingError::AssetNotFound(id.to_string()))
    }

    fn position(&self, id: &str) -> Result<usize> {
        self.assets
            .iter()
            .position(|a| a.id == id)
            .ok_or_else(|| StagingError::AssetNotFound(id.to_string()))
    }

    /// The unsaved asset, if one exists
    pub fn active_draft(&self) -> Option<&Asset> {
        self.assets.iter().find(|a| a.is_draft())
    }

    /// Append an empty draft. Only one unsaved draft may exist at a time.
    pub fn create_draft(&mut self) -> Result<&Asset> {
        if let Some(existing) = self.active_draft() {
            return Err(StagingError::DraftAlreadyOpen(existing.id.clone()));
        }

        self.assets.push(Asset::new_draft());
        let index = self.assets.len() - 1;
        Ok(&self.assets[index])
    }

    /// Merge `patch` into an unsaved asset. Leaves the store unchanged on error.
    pub fn update_draft(&mut self, id: &str, patch: &AssetPatch) -> Result<StagingState> {
        let index = self.position(id)?;
        let next = self.assets[index].patched(patch)?;
        let state = next.state;
        self.assets[index] = next;
        Ok(state)
    }

    pub fn readiness_of(&self, id: &str) -> Result<bool> {
        Ok(readiness_of(self.get_or_not_found(id)?))
    }

    /// Drop an unsaved asset locally
    pub fn remove_draft(&mut self, id: &str) -> Result<Asset> {
        let index = self.position(id)?;
        let asset = &self.assets[index];
        if asset.saved {
            return Err(StagingError::ImmutableAsset(id.to_string()));
        }
        StagingStateMachine::transition(asset.state, StagingEvent::Discard)?;
        Ok(self.assets.remove(index))
    }

    /// Assets for rendering: committed first, the draft last
    pub fn list_assets(&self) -> Vec<Asset> {
        let (committed, drafts): (Vec<&Asset>, Vec<&Asset>) =
            self.assets.iter().partition(|a| a.saved);
        committed.into_iter().chain(drafts).cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.assets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.assets.is_empty()
    }

    /// Validate a draft, freeze it as `Committing`, and return the record to persist
    pub(crate) fn begin_commit(&mut self, id: &str) -> Result<AssetRecord> {
        let index = self.position(id)?;
        let asset = &self.assets[index];
        if asset.saved {
            return Err(StagingError::ImmutableAsset(id.to_string()));
        }

        let next_state = StagingStateMachine::transition(asset.state, StagingEvent::Commit)?;
        asset.validate_for_commit()?;
        let record = asset.to_record()?;

        let asset = &mut self.assets[index];
        asset.state = next_state;
        asset.error = None;
        Ok(record)
    }

    /// Backend acknowledged the commit: take the content id and mark saved.
    ///
    /// Returns false if the draft is gone (discarded while the call was in flight).
    pub(crate) fn complete_commit(&mut self, placeholder_id: &str, content_id: &str) -> bool {
        let Ok(index) = self.position(placeholder_id) else {
            return false;
        };

        // Identical content already committed: keep the existing row
        if self.assets.iter().any(|a| a.saved && a.id == content_id) {
            self.assets.remove(index);
            return true;
        }

        let asset = &mut self.assets[index];
        asset.state = StagingStateMachine::transition(asset.state, StagingEvent::Acknowledge)
            .unwrap_or(StagingState::Committed);
        asset.id = content_id.to_string();
        asset.saved = true;
        asset.error = None;
        true
    }

    /// Backend rejected the commit: back to `Ready` with fields intact
    pub(crate) fn rollback_commit(&mut self, id: &str, error: String) -> Result<()> {
        let index = self.position(id)?;
        let asset = &mut self.assets[index];
        asset.state = StagingStateMachine::transition(asset.state, StagingEvent::Reject)?;
        asset.error = Some(error);
        Ok(())
    }

    /// Undo `begin_commit` before anything reached the backend
    pub(crate) fn cancel_commit(&mut self, id: &str, previous_error: Option<String>) -> Result<()> {
        let index = self.position(id)?;
        let asset = &mut self.assets[index];
        asset.state = StagingStateMachine::transition(asset.state, StagingEvent::Reject)?;
        asset.error = previous_error;
        Ok(())
    }

    pub(crate) fn set_error(&mut self, id: &str, error: Option<String>) {
        if let Some(asset) = self.assets.iter_mut().find(|a| a.id == id) {
            asset.error = error;
        }
    }

    /// Remove a committed asset after the backend deleted it
    pub(crate) fn remove_committed(&mut self, id: &str) -> bool {
        let before = self.assets.len();
        self.assets.retain(|a| !(a.saved && a.id == id));
        self.assets.len() != before
    }

    /// Replace all committed assets, keeping unsaved drafts after them.
    pub(crate) fn replace_committed(&mut self, committed: Vec<Asset>) {
        let drafts: Vec<Asset> = self.assets.drain(..).filter(|a| a.is_draft()).collect();
        self.assets = committed;
        self.assets.extend(drafts);
    }

    pub(crate) fn committed(&self) -> impl Iterator<Item = &Asset> {
        self.assets.iter().filter(|a| a.saved)
    }
}
