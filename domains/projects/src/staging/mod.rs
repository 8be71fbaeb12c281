//! Asset staging: the Draft Store, the Synchronizer, and the workflow driving both

pub mod store;
pub mod sync;
pub mod workflow;

pub use store::DraftStore;
pub use sync::{reconcile, RefreshSequence, RefreshTicket, SyncOutcome, Synchronizer};
pub use workflow::{Completion, StagingWorkflow};
