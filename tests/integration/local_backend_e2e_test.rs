//! Local Backend End-to-End Tests
//!
//! Runs the catalog and the staging workflow against the file-backed backend
//! in a temporary data directory, then exports the project.

use std::io::Write;
use std::sync::Arc;

use tempfile::TempDir;

use hyuga_backend::{BackendError, LocalBackend, ProjectBackend};
use hyuga_common::{decode_payload, encode_payload, joined_digest};
use hyuga_projects::{ImageSlot, ProjectCatalog, StagingError, StagingState, StagingWorkflow};

use crate::common::{ready_draft, RecordingRenderer};

fn local_engine(
    dir: &TempDir,
) -> (
    Arc<RecordingRenderer>,
    Arc<LocalBackend>,
    ProjectCatalog,
    StagingWorkflow,
) {
    let renderer = Arc::new(RecordingRenderer::default());
    let backend = Arc::new(LocalBackend::new(dir.path()).with_renderer(renderer.clone()));
    let catalog = ProjectCatalog::new(backend.clone());
    let workflow = StagingWorkflow::new(backend.clone());
    (renderer, backend, catalog, workflow)
}

#[test_log::test(tokio::test)]
async fn test_project_lifecycle_on_disk() {
    let dir = TempDir::new().unwrap();
    let (renderer, backend, catalog, workflow) = local_engine(&dir);

    // ============================================================================
    // Step 1: Create a project through the catalog
    // ============================================================================
    let project = catalog.create_project().await.unwrap();
    let project_file = dir
        .path()
        .join("projects")
        .join(format!("project-{}", project.id))
        .join("project.json");
    assert!(project_file.exists());
    assert_eq!(catalog.projects().len(), 1);

    // ============================================================================
    // Step 2: Upload both images from picked files
    // ============================================================================
    workflow.open_project(&project.id).await.unwrap();
    let id = workflow.create_draft().unwrap().id;

    let mut sheet = tempfile::Builder::new()
        .prefix("scan_p12_sec_x_")
        .suffix(".png")
        .tempfile_in(dir.path())
        .unwrap();
    sheet.write_all(b"sheet-bytes").unwrap();
    let mut cutout = tempfile::NamedTempFile::new_in(dir.path()).unwrap();
    cutout.write_all(b"cutout-bytes").unwrap();

    workflow
        .upload_image(&id, ImageSlot::Sheet, Some(sheet.path()))
        .await
        .unwrap();
    workflow
        .upload_image(&id, ImageSlot::Cutout, Some(cutout.path()))
        .await
        .unwrap();

    let names = [sheet.path().to_string_lossy().to_string()];
    let state = workflow.apply_filename_hints(&id, &names).unwrap();
    assert_eq!(state, StagingState::Ready);

    // ============================================================================
    // Step 3: Commit and read the file back
    // ============================================================================
    let committed = workflow.commit(&id).await.unwrap().applied().unwrap();
    let sheet_payload = encode_payload(b"sheet-bytes");
    let cutout_payload = encode_payload(b"cutout-bytes");
    assert_eq!(
        committed.id,
        joined_digest(&[cutout_payload.as_str(), sheet_payload.as_str(), "12", "X"])
    );

    let json = std::fs::read_to_string(&project_file).unwrap();
    assert!(json.contains("\"pageNumber\": \"12\""));
    let stored = backend.load_project(&project.id).await.unwrap();
    assert_eq!(stored.assets.len(), 1);
    assert_eq!(stored.assets[0].cutout, cutout_payload);

    // ============================================================================
    // Step 4: Export the committed assets
    // ============================================================================
    let export = workflow.generate_pdf().await.unwrap();
    assert_eq!(export.page_count, 1);
    let output = export.output.unwrap();
    assert!(output.ends_with("output.pdf"));
    assert!(std::fs::read(&output).unwrap().starts_with(b"%PDF"));
    assert_eq!(renderer.pages()[0].image, b"cutout-bytes".to_vec());

    // ============================================================================
    // Step 5: Delete the asset, then the project
    // ============================================================================
    workflow.delete_asset(&committed.id).await.unwrap();
    assert!(workflow.list_assets().unwrap().is_empty());

    workflow.close_project();
    catalog.delete_project(&project.id).await.unwrap();
    assert!(catalog.projects().is_empty());
    assert!(!project_file.exists());
}

#[test_log::test(tokio::test)]
async fn test_recommitting_identical_content_is_idempotent() {
    let dir = TempDir::new().unwrap();
    let (_, backend, catalog, workflow) = local_engine(&dir);
    let project = catalog.create_project().await.unwrap();
    workflow.open_project(&project.id).await.unwrap();

    let first = ready_draft(&workflow, "AAAA", "BBBB", "12", "X");
    workflow.commit(&first).await.unwrap();
    let second = ready_draft(&workflow, "AAAA", "BBBB", "12", "X");
    workflow.commit(&second).await.unwrap();

    assert_eq!(backend.list_assets(&project.id).await.unwrap().len(), 1);
    assert_eq!(workflow.list_assets().unwrap().len(), 1);
}

#[test_log::test(tokio::test)]
async fn test_reopen_restores_committed_assets() {
    let dir = TempDir::new().unwrap();
    let (_, _, catalog, workflow) = local_engine(&dir);
    let project = catalog.create_project().await.unwrap();
    workflow.open_project(&project.id).await.unwrap();

    let id = ready_draft(&workflow, "AAAA", "BBBB", "1", "A");
    let committed = workflow.commit(&id).await.unwrap().applied().unwrap();
    ready_draft(&workflow, "CCCC", "DDDD", "2", "B");
    workflow.close_project();

    // A fresh engine on the same directory sees the commit, not the draft
    let (_, _, catalog, workflow) = local_engine(&dir);
    catalog.refresh().await.unwrap();
    assert_eq!(catalog.projects()[0].assets.len(), 1);

    let assets = workflow
        .open_project(&project.id)
        .await
        .unwrap()
        .applied()
        .unwrap();
    assert_eq!(assets.len(), 1);
    assert_eq!(assets[0].id, committed.id);
}

#[test_log::test(tokio::test)]
async fn test_export_rejects_corrupt_cutout() {
    let dir = TempDir::new().unwrap();
    let (_, _, catalog, workflow) = local_engine(&dir);
    let project = catalog.create_project().await.unwrap();
    workflow.open_project(&project.id).await.unwrap();

    let id = ready_draft(&workflow, "AAAA", "not base64!", "1", "A");
    workflow.commit(&id).await.unwrap();

    assert!(decode_payload("not base64!").is_err());
    assert!(matches!(
        workflow.generate_pdf().await,
        Err(StagingError::Backend(BackendError::Render(_)))
    ));
}

#[test_log::test(tokio::test)]
async fn test_opening_missing_project_fails() {
    let dir = TempDir::new().unwrap();
    let (_, _, _, workflow) = local_engine(&dir);

    assert!(matches!(
        workflow.open_project("does-not-exist").await,
        Err(StagingError::Sync(BackendError::NotFound(_)))
    ));
    assert!(workflow.open_project_id().is_none());
}

mod common;
