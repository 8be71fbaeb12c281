//! Hyuga application composition root
//!
//! Wires configuration into a backend and hands the same backend to the
//! project catalog and the staging workflow.

use std::sync::Arc;

use hyuga_backend::{BackendConfig, BackendServiceFactory, ProjectBackend};
use hyuga_common::Config;
use hyuga_projects::{ProjectCatalog, StagingWorkflow};

/// Engine handles shared with the front-end
pub struct App {
    pub backend: Arc<dyn ProjectBackend>,
    pub catalog: ProjectCatalog,
    pub workflow: StagingWorkflow,
}

/// Build the engine from configuration
pub fn create_app(config: &Config) -> Result<App, anyhow::Error> {
    let backend_config = BackendConfig::from(config);
    let backend: Arc<dyn ProjectBackend> = Arc::from(BackendServiceFactory::create(backend_config)?);

    Ok(App {
        catalog: ProjectCatalog::new(Arc::clone(&backend)),
        workflow: StagingWorkflow::new(Arc::clone(&backend)),
        backend,
    })
}
