//! Projects domain: asset drafts, content identity, staging workflow, project catalog

pub mod capture;
pub mod catalog;
pub mod domain;
pub mod error;
pub mod staging;

// Re-export domain types at the crate root for convenience
pub use capture::{capture_bytes, capture_data_url, capture_file, guess_page_and_section, FieldHints};
pub use catalog::ProjectCatalog;
pub use domain::entities::{readiness_of, Asset, AssetPatch, ImageSlot, PLACEHOLDER_PREFIX};
pub use domain::identity::{content_id, ContentFields};
pub use domain::state::{StagingEvent, StagingState, StagingStateMachine, StateError};
pub use error::{CaptureError, IdentityError, Result, StagingError};
pub use staging::{Completion, DraftStore, StagingWorkflow, Synchronizer};
