//! Staging Workflow Integration Tests
//!
//! Drives the full create → upload → fill → commit → refresh sequence against
//! the mock backend, including failures and interleavings that only show up
//! once several operations are in flight.

use hyuga_backend::BackendOperation;
use hyuga_common::joined_digest;
use hyuga_projects::{Completion, StagingError, StagingState};

use crate::common::{open_mock_project, ready_draft, PROJECT_ID};

#[test_log::test(tokio::test)]
async fn test_draft_to_committed_asset() {
    let (backend, workflow) = open_mock_project().await;

    // ============================================================================
    // Step 1: Build the draft field by field
    // ============================================================================
    let id = ready_draft(&workflow, "AAAA", "BBBB", "12", "X");
    assert!(workflow.readiness_of(&id).unwrap());
    assert_eq!(workflow.state_of(&id).unwrap(), StagingState::Ready);

    // ============================================================================
    // Step 2: Commit and check the content identity
    // ============================================================================
    let committed = workflow.commit(&id).await.unwrap().applied().unwrap();
    assert_eq!(committed.id, joined_digest(&["BBBB", "AAAA", "12", "X"]));
    assert!(committed.saved);

    // ============================================================================
    // Step 3: Backend and store agree after the post-commit refresh
    // ============================================================================
    let stored = backend.project(PROJECT_ID).unwrap();
    assert_eq!(stored.assets.len(), 1);
    assert_eq!(stored.assets[0].id, committed.id);
    assert_eq!(stored.assets[0].sheet, "AAAA");

    let assets = workflow.list_assets().unwrap();
    assert_eq!(assets.len(), 1);
    assert!(assets[0].saved);
    assert!(workflow.state_of(&id).is_err());
}

#[test_log::test(tokio::test)]
async fn test_second_draft_rejected_until_first_resolves() {
    let (_, workflow) = open_mock_project().await;
    let first = workflow.create_draft().unwrap().id;

    assert!(matches!(
        workflow.create_draft(),
        Err(StagingError::DraftAlreadyOpen(ref id)) if *id == first
    ));

    workflow.discard_draft(&first).unwrap();
    let second = ready_draft(&workflow, "AAAA", "BBBB", "1", "A");
    assert!(matches!(
        workflow.create_draft(),
        Err(StagingError::DraftAlreadyOpen(_))
    ));

    workflow.commit(&second).await.unwrap();
    assert!(workflow.create_draft().is_ok());
}

#[test_log::test(tokio::test)]
async fn test_failed_delete_keeps_asset_then_retry_removes_it() {
    let (backend, workflow) = open_mock_project().await;
    let id = ready_draft(&workflow, "AAAA", "BBBB", "3", "C");
    let committed = workflow.commit(&id).await.unwrap().applied().unwrap();

    backend
        .behavior()
        .fail_next(BackendOperation::DeleteAsset, "connection reset");
    let result = workflow.delete_asset(&committed.id).await;
    assert!(matches!(result, Err(StagingError::Backend(_))));

    let assets = workflow.list_assets().unwrap();
    assert_eq!(assets.len(), 1);
    assert!(assets[0]
        .error
        .as_deref()
        .is_some_and(|e| e.contains("connection reset")));

    // The flag survives an unrelated refresh while the backend still has the asset
    workflow.refresh().await.unwrap();
    assert!(workflow.list_assets().unwrap()[0].error.is_some());

    workflow.delete_asset(&committed.id).await.unwrap();
    assert!(workflow.list_assets().unwrap().is_empty());
    assert!(backend.project(PROJECT_ID).unwrap().assets.is_empty());
    assert_eq!(backend.call_count(BackendOperation::DeleteAsset), 2);
}

#[test_log::test(tokio::test)]
async fn test_failed_commit_rolls_back_with_fields_intact() {
    let (backend, workflow) = open_mock_project().await;
    let id = ready_draft(&workflow, "AAAA", "BBBB", "7", "D");
    let before = workflow.list_assets().unwrap().pop().unwrap();

    backend
        .behavior()
        .fail_next(BackendOperation::SaveAsset, "service unavailable");
    assert!(matches!(
        workflow.commit(&id).await,
        Err(StagingError::Backend(_))
    ));

    let after = workflow.list_assets().unwrap().pop().unwrap();
    assert_eq!(after.state, StagingState::Ready);
    assert_eq!(after.sheet_image, before.sheet_image);
    assert_eq!(after.cutout_image, before.cutout_image);
    assert_eq!(after.page_number, before.page_number);
    assert_eq!(after.section, before.section);
    assert!(after.error.is_some());
    assert!(backend.project(PROJECT_ID).unwrap().assets.is_empty());

    assert!(workflow.commit(&id).await.unwrap().applied().unwrap().saved);
}

#[test_log::test(tokio::test)]
async fn test_overlapping_commit_leaves_store_unchanged() {
    let (backend, workflow) = open_mock_project().await;
    let id = ready_draft(&workflow, "AAAA", "BBBB", "2", "E");
    let gate = backend.behavior().gate_next(BackendOperation::SaveAsset);

    let first = workflow.commit(&id);
    let second = async {
        tokio::task::yield_now().await;
        let before = workflow.list_assets().unwrap();
        let result = workflow.commit(&id).await;
        let after = workflow.list_assets().unwrap();
        gate.open();
        (result, before, after)
    };
    let (first, (second, before, after)) = tokio::join!(first, second);

    assert!(matches!(
        second,
        Err(StagingError::ConcurrentOperation { ref asset_id }) if *asset_id == id
    ));
    assert_eq!(before, after);
    assert!(matches!(first, Ok(Completion::Applied(_))));
}

#[test_log::test(tokio::test)]
async fn test_older_refresh_never_overwrites_newer() {
    let (backend, workflow) = open_mock_project().await;
    let gate = backend.behavior().gate_next(BackendOperation::ListAssets);

    let stale = workflow.refresh();
    let fresh = async {
        tokio::task::yield_now().await;
        let id = ready_draft(&workflow, "AAAA", "BBBB", "5", "F");
        let committed = workflow.commit(&id).await;
        gate.open();
        committed
    };
    let (stale, committed) = tokio::join!(stale, fresh);

    assert_eq!(stale.unwrap(), Completion::Discarded);
    let committed = committed.unwrap().applied().unwrap();
    assert_eq!(workflow.list_assets().unwrap()[0].id, committed.id);
}

#[test_log::test(tokio::test)]
async fn test_results_after_close_are_discarded() {
    let (backend, workflow) = open_mock_project().await;
    let id = ready_draft(&workflow, "AAAA", "BBBB", "9", "G");
    let save_gate = backend.behavior().gate_next(BackendOperation::SaveAsset);
    let list_gate = backend.behavior().gate_next(BackendOperation::ListAssets);

    let commit = workflow.commit(&id);
    let refresh = async {
        tokio::task::yield_now().await;
        workflow.refresh().await
    };
    let close = async {
        tokio::task::yield_now().await;
        tokio::task::yield_now().await;
        workflow.close_project();
        save_gate.open();
        list_gate.open();
    };
    let (commit, refresh, ()) = tokio::join!(commit, refresh, close);

    assert!(commit.unwrap().is_discarded());
    assert!(refresh.unwrap().is_discarded());
    assert!(matches!(
        workflow.list_assets(),
        Err(StagingError::NoOpenProject)
    ));
}

#[test_log::test(tokio::test)]
async fn test_asset_added_elsewhere_appears_before_draft() {
    let (backend, workflow) = open_mock_project().await;
    let draft = workflow.create_draft().unwrap().id;

    let other = hyuga_projects::StagingWorkflow::new(std::sync::Arc::new(backend.clone()));
    other.open_project(PROJECT_ID).await.unwrap();
    let id = ready_draft(&other, "CCCC", "DDDD", "4", "H");
    let committed = other.commit(&id).await.unwrap().applied().unwrap();

    let assets = workflow.refresh().await.unwrap().applied().unwrap();
    let ids: Vec<&str> = assets.iter().map(|a| a.id.as_str()).collect();
    assert_eq!(ids, vec![committed.id.as_str(), draft.as_str()]);
}

mod common;
