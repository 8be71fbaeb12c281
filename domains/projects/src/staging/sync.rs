//! Project/Asset Synchronizer
//!
//! Reconciles the Draft Store with the backend's asset list. Every fetch is
//! issued a ticket from a monotonically increasing sequence; a response whose
//! ticket is not newer than the last applied one is dropped.

use std::collections::{HashMap, HashSet};

use hyuga_backend::AssetRecord;

use crate::domain::entities::Asset;
use crate::staging::store::DraftStore;

/// Sequence number handed to a fetch when it is issued
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct RefreshTicket(u64);

impl RefreshTicket {
    pub fn seq(&self) -> u64 {
        self.0
    }
}

/// Issued/applied counters for one list of fetches
#[derive(Debug, Default, Clone)]
pub struct RefreshSequence {
    issued: u64,
    applied: u64,
}

impl RefreshSequence {
    pub fn new() -> Self {
        Self::default()
    }

    /// Issue the next ticket
    pub fn begin(&mut self) -> RefreshTicket {
        self.issued += 1;
        RefreshTicket(self.issued)
    }

    pub fn is_stale(&self, ticket: RefreshTicket) -> bool {
        ticket.0 <= self.applied
    }

    /// Mark `ticket` applied. Returns false if a newer response was already applied.
    pub fn accept(&mut self, ticket: RefreshTicket) -> bool {
        if self.is_stale(ticket) {
            return false;
        }
        self.applied = ticket.0;
        true
    }

    /// Treat every ticket issued so far as stale.
    ///
    /// Called when local state gets ahead of any fetch already in flight.
    pub fn supersede_outstanding(&mut self) {
        self.applied = self.issued;
    }

    pub fn last_applied(&self) -> u64 {
        self.applied
    }
}

/// Result of handing a fetched list to the synchronizer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncOutcome {
    Applied,
    Stale,
}

#[derive(Debug, Default)]
pub struct Synchronizer {
    sequence: RefreshSequence,
}

impl Synchronizer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn begin(&mut self) -> RefreshTicket {
        self.sequence.begin()
    }

    pub fn is_stale(&self, ticket: RefreshTicket) -> bool {
        self.sequence.is_stale(ticket)
    }

    pub fn supersede_outstanding(&mut self) {
        self.sequence.supersede_outstanding();
    }

    /// Reconcile `store` with `records` unless a newer fetch already landed
    pub fn apply(
        &mut self,
        ticket: RefreshTicket,
        records: Vec<AssetRecord>,
        store: &mut DraftStore,
    ) -> SyncOutcome {
        if !self.sequence.accept(ticket) {
            tracing::debug!(
                project_id = %store.project_id(),
                seq = ticket.seq(),
                applied = self.sequence.last_applied(),
                "Discarding stale asset list"
            );
            return SyncOutcome::Stale;
        }

        reconcile(records, store);
        tracing::debug!(
            project_id = %store.project_id(),
            seq = ticket.seq(),
            assets = store.len(),
            "Applied asset list"
        );
        SyncOutcome::Applied
    }
}

/// Overwrite the committed assets of `store` with the backend's list.
///
/// Duplicate ids collapse to the first occurrence. Unsaved drafts are kept, and
/// a committed asset the backend still reports keeps its error flag.
pub fn reconcile(records: Vec<AssetRecord>, store: &mut DraftStore) {
    let errors: HashMap<String, String> = store
        .committed()
        .filter_map(|a| a.error.clone().map(|e| (a.id.clone(), e)))
        .collect();

    let mut seen = HashSet::new();
    let committed: Vec<Asset> = records
        .into_iter()
        .filter(|record| seen.insert(record.id.clone()))
        .map(|record| {
            let mut asset = Asset::from_record(record);
            asset.error = errors.get(&asset.id).cloned();
            asset
        })
        .collect();

    store.replace_committed(committed);
}
