//! Mock Backend Implementation
//!
//! Programmable in-memory backend for testing staging workflows:
//! - `MockBackend`: stores projects in memory and records every call
//! - `MockBackendBehavior`: injects failures per operation
//! - `CallGate`: holds the response of the next call to an operation until opened
//!
//! A call's effect and its response snapshot are computed when the call arrives;
//! a gate only delays delivery of the response.

use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tokio::sync::oneshot;

use crate::{names, require_id, AssetRecord, BackendError, PdfExport, Project, ProjectBackend};

/// Lock, ignoring poison left by a holder that panicked
fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Backend operations, used to target failures and gates
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BackendOperation {
    ListProjects,
    CreateProject,
    DeleteProject,
    LoadProject,
    ListAssets,
    SaveAsset,
    DeleteAsset,
    GeneratePdf,
}

impl std::fmt::Display for BackendOperation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::ListProjects => write!(f, "list_projects"),
            Self::CreateProject => write!(f, "create_project"),
            Self::DeleteProject => write!(f, "delete_project"),
            Self::LoadProject => write!(f, "load_project"),
            Self::ListAssets => write!(f, "list_assets"),
            Self::SaveAsset => write!(f, "save_asset"),
            Self::DeleteAsset => write!(f, "delete_asset"),
            Self::GeneratePdf => write!(f, "generate_pdf"),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
enum FailureMode {
    Next(u32),
    Always,
}

/// Releases one held call when opened or dropped
#[derive(Debug)]
pub struct CallGate {
    sender: Option<oneshot::Sender<()>>,
}

impl CallGate {
    /// Let the held call return
    pub fn open(mut self) {
        if let Some(sender) = self.sender.take() {
            let _ = sender.send(());
        }
    }
}

/// Programmable behavior for the mock backend
#[derive(Debug, Default)]
pub struct MockBackendBehavior {
    failures: Mutex<HashMap<BackendOperation, (FailureMode, String)>>,
    gates: Mutex<HashMap<BackendOperation, VecDeque<oneshot::Receiver<()>>>>,
}

impl MockBackendBehavior {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fail the next call to `op` with `message`
    pub fn fail_next(&self, op: BackendOperation, message: &str) {
        self.fail_times(op, 1, message);
    }

    /// Fail the next `count` calls to `op`
    pub fn fail_times(&self, op: BackendOperation, count: u32, message: &str) {
        let mut failures = lock(&self.failures);
        if count == 0 {
            failures.remove(&op);
            return;
        }
        failures.insert(op, (FailureMode::Next(count), message.to_string()));
    }

    /// Fail every call to `op` until cleared
    pub fn fail_always(&self, op: BackendOperation, message: &str) {
        lock(&self.failures).insert(op, (FailureMode::Always, message.to_string()));
    }

    /// Remove all injected failures
    pub fn clear_failures(&self) {
        lock(&self.failures).clear();
    }

    /// Hold the response of the next not-yet-gated call to `op` until the returned gate opens.
    ///
    /// Gates queue up: the first call waits on the first gate, the second on the second.
    pub fn gate_next(&self, op: BackendOperation) -> CallGate {
        let (sender, receiver) = oneshot::channel();
        lock(&self.gates)
            .entry(op)
            .or_default()
            .push_back(receiver);
        CallGate {
            sender: Some(sender),
        }
    }

    /// Reset to default behavior
    pub fn reset(&self) {
        self.clear_failures();
        lock(&self.gates).clear();
    }

    fn take_failure(&self, op: BackendOperation) -> Result<(), BackendError> {
        let mut failures = lock(&self.failures);

        let Some((mode, message)) = failures.get_mut(&op) else {
            return Ok(());
        };
        let error = BackendError::Request(message.clone());
        match mode {
            FailureMode::Always => {}
            FailureMode::Next(remaining) => {
                *remaining -= 1;
                if *remaining == 0 {
                    failures.remove(&op);
                }
            }
        }
        Err(error)
    }

    fn take_gate(&self, op: BackendOperation) -> Option<oneshot::Receiver<()>> {
        lock(&self.gates)
            .get_mut(&op)
            .and_then(|queue| queue.pop_front())
    }
}

/// A recorded backend call for test assertions
#[derive(Debug, Clone, PartialEq)]
pub struct RecordedCall {
    pub operation: BackendOperation,
    pub project_id: Option<String>,
    pub asset_id: Option<String>,
}

#[derive(Debug, Default)]
struct MockStore {
    projects: Vec<Project>,
}

impl MockStore {
    fn project(&self, project_id: &str) -> Result<&Project, BackendError> {
        self.projects
            .iter()
            .find(|p| p.id == project_id)
            .ok_or_else(|| BackendError::NotFound(format!("project {} not found", project_id)))
    }

    fn project_mut(&mut self, project_id: &str) -> Result<&mut Project, BackendError> {
        self.projects
            .iter_mut()
            .find(|p| p.id == project_id)
            .ok_or_else(|| BackendError::NotFound(format!("project {} not found", project_id)))
    }
}

/// Mock backend with programmable behavior
#[derive(Debug, Clone, Default)]
pub struct MockBackend {
    behavior: Arc<MockBackendBehavior>,
    store: Arc<Mutex<MockStore>>,
    history: Arc<Mutex<Vec<RecordedCall>>>,
}

impl MockBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_behavior(behavior: Arc<MockBackendBehavior>) -> Self {
        Self {
            behavior,
            ..Self::default()
        }
    }

    /// Shared behavior for configuring failures and gates
    pub fn behavior(&self) -> &Arc<MockBackendBehavior> {
        &self.behavior
    }

    /// Insert a project directly, bypassing failures and gates
    pub fn seed_project(&self, project: Project) {
        lock(&self.store).projects.push(project);
    }

    /// Append an asset directly, simulating a change made elsewhere
    pub fn seed_asset(&self, project_id: &str, record: AssetRecord) {
        let mut store = lock(&self.store);
        if let Ok(project) = store.project_mut(project_id) {
            project.assets.push(record);
        }
    }

    /// Current stored state of a project
    pub fn project(&self, project_id: &str) -> Option<Project> {
        lock(&self.store)
            .project(project_id)
            .ok()
            .cloned()
    }

    /// All calls received so far
    pub fn recorded_calls(&self) -> Vec<RecordedCall> {
        lock(&self.history).clone()
    }

    /// Number of calls received for `op`
    pub fn call_count(&self, op: BackendOperation) -> usize {
        lock(&self.history)
            .iter()
            .filter(|c| c.operation == op)
            .count()
    }

    fn record(
        &self,
        operation: BackendOperation,
        project_id: Option<&str>,
        asset_id: Option<&str>,
    ) {
        tracing::debug!(%operation, ?project_id, ?asset_id, "Mock backend: recording call");
        lock(&self.history).push(RecordedCall {
            operation,
            project_id: project_id.map(str::to_string),
            asset_id: asset_id.map(str::to_string),
        });
    }

    /// Record the call, apply `effect` unless a failure is injected, then wait on any gate.
    async fn call<T>(
        &self,
        operation: BackendOperation,
        project_id: Option<&str>,
        asset_id: Option<&str>,
        effect: impl FnOnce(&mut MockStore) -> Result<T, BackendError>,
    ) -> Result<T, BackendError> {
        self.record(operation, project_id, asset_id);
        let gate = self.behavior.take_gate(operation);

        let result = match self.behavior.take_failure(operation) {
            Err(e) => Err(e),
            Ok(()) => effect(&mut lock(&self.store)),
        };

        if let Some(gate) = gate {
            // A dropped gate releases the call too
            let _ = gate.await;
        }
        result
    }
}

#[async_trait::async_trait]
impl ProjectBackend for MockBackend {
    async fn list_projects(&self) -> Result<Vec<Project>, BackendError> {
        self.call(BackendOperation::ListProjects, None, None, |store| {
            Ok(store.projects.clone())
        })
        .await
    }

    async fn create_project(&self) -> Result<Project, BackendError> {
        let project = Project::new_named(names::generate_name()?);
        self.call(BackendOperation::CreateProject, None, None, move |store| {
            store.projects.push(project.clone());
            Ok(project)
        })
        .await
    }

    async fn delete_project(&self, project_id: &str) -> Result<(), BackendError> {
        require_id("projectId", project_id)?;
        self.call(
            BackendOperation::DeleteProject,
            Some(project_id),
            None,
            |store| {
                store.projects.retain(|p| p.id != project_id);
                Ok(())
            },
        )
        .await
    }

    async fn load_project(&self, project_id: &str) -> Result<Project, BackendError> {
        require_id("projectId", project_id)?;
        self.call(BackendOperation::LoadProject, Some(project_id), None, |store| {
            store.project(project_id).cloned()
        })
        .await
    }

    async fn list_assets(&self, project_id: &str) -> Result<Vec<AssetRecord>, BackendError> {
        require_id("projectId", project_id)?;
        self.call(BackendOperation::ListAssets, Some(project_id), None, |store| {
            Ok(store.project(project_id)?.assets.clone())
        })
        .await
    }

    async fn save_asset(&self, project_id: &str, record: AssetRecord) -> Result<(), BackendError> {
        require_id("projectId", project_id)?;
        require_id("assetId", &record.id)?;
        let asset_id = record.id.clone();
        self.call(
            BackendOperation::SaveAsset,
            Some(project_id),
            Some(&asset_id),
            move |store| {
                let project = store.project_mut(project_id)?;
                if !project.assets.iter().any(|a| a.id == record.id) {
                    project.assets.push(record);
                }
                Ok(())
            },
        )
        .await
    }

    async fn delete_asset(&self, project_id: &str, asset_id: &str) -> Result<(), BackendError> {
        require_id("projectId", project_id)?;
        require_id("assetId", asset_id)?;
        self.call(
            BackendOperation::DeleteAsset,
            Some(project_id),
            Some(asset_id),
            |store| {
                let project = store.project_mut(project_id)?;
                let index = project
                    .assets
                    .iter()
                    .position(|a| a.id == asset_id)
                    .ok_or_else(|| BackendError::NotFound(format!("asset {} not found", asset_id)))?;
                project.assets.remove(index);
                Ok(())
            },
        )
        .await
    }

    async fn generate_pdf(&self, project_id: &str) -> Result<PdfExport, BackendError> {
        require_id("projectId", project_id)?;
        self.call(BackendOperation::GeneratePdf, Some(project_id), None, |store| {
            Ok(PdfExport {
                project_id: project_id.to_string(),
                page_count: store.project(project_id)?.assets.len(),
                output: None,
            })
        })
        .await
    }
}
