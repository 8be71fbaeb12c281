//! Shared fixtures for integration tests
//!
//! - Mock backend seeded with one project
//! - Helpers to build a ready draft through the workflow
//! - A PDF renderer that records what it was given

#![allow(dead_code)]

use std::sync::{Arc, Mutex};

use hyuga_backend::{BackendError, MockBackend, PdfPage, PdfRenderer, Project};
use hyuga_projects::{AssetPatch, ImageSlot, StagingWorkflow};

pub const PROJECT_ID: &str = "test-project";

/// Mock backend holding one empty project, and a workflow with it open
pub async fn open_mock_project() -> (MockBackend, StagingWorkflow) {
    let backend = MockBackend::new();
    backend.seed_project(Project {
        id: PROJECT_ID.to_string(),
        name: "tortuga-roja".to_string(),
        created_at: "2026-01-01 12:00:00".to_string(),
        assets: Vec::new(),
    });

    let workflow = StagingWorkflow::new(Arc::new(backend.clone()));
    workflow
        .open_project(PROJECT_ID)
        .await
        .expect("project should open");
    (backend, workflow)
}

/// Create a draft and fill all four fields
pub fn ready_draft(
    workflow: &StagingWorkflow,
    sheet: &str,
    cutout: &str,
    page: &str,
    section: &str,
) -> String {
    let id = workflow.create_draft().expect("draft should be created").id;
    workflow
        .set_image(&id, ImageSlot::Sheet, sheet)
        .expect("sheet should be set");
    workflow
        .set_image(&id, ImageSlot::Cutout, cutout)
        .expect("cutout should be set");
    workflow
        .update_draft(&id, &AssetPatch::new().page_number(page).section(section))
        .expect("fields should be set");
    id
}

/// Renderer producing a fake document and remembering the pages it saw
#[derive(Default)]
pub struct RecordingRenderer {
    pages: Mutex<Vec<PdfPage>>,
}

impl RecordingRenderer {
    pub fn pages(&self) -> Vec<PdfPage> {
        self.pages.lock().expect("pages lock poisoned").clone()
    }
}

impl PdfRenderer for RecordingRenderer {
    fn render(&self, project: &Project, pages: &[PdfPage]) -> Result<Vec<u8>, BackendError> {
        *self.pages.lock().expect("pages lock poisoned") = pages.to_vec();
        Ok(format!("%PDF-1.4 {} ({} pages)", project.name, pages.len()).into_bytes())
    }
}
