use std::collections::BTreeSet;
use std::fmt;

use crate::catalogue::CatalogueEntry;
use crate::steam::LocationProblem;

/// Where a reconciliation run currently is
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ReconcilePhase {
    #[default]
    Idle,
    Validating,
    Scanning,
    Resolving,
}

impl fmt::Display for ReconcilePhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ReconcilePhase::Idle => "idle",
            ReconcilePhase::Validating => "validating",
            ReconcilePhase::Scanning => "scanning",
            ReconcilePhase::Resolving => "resolving",
        };
        f.write_str(name)
    }
}

/// Why an installed title did not make it into the catalogue
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnresolvedReason {
    /// Nothing searchable was left after normalising the name
    EmptyName,
    /// The search returned nothing, failed or timed out
    NoResults,
    /// No result had a usable name
    NoMatch,
    /// A manually added game already uses the title
    TitleTaken,
    /// The worker stopped without reporting back
    WorkerFailed,
    /// The catalogue refused the resolved entry
    StoreRejected,
}

impl fmt::Display for UnresolvedReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            UnresolvedReason::EmptyName => "name is not searchable",
            UnresolvedReason::NoResults => "no search results",
            UnresolvedReason::NoMatch => "no matching result",
            UnresolvedReason::TitleTaken => "title already used by another game",
            UnresolvedReason::WorkerFailed => "worker failed",
            UnresolvedReason::StoreRejected => "catalogue rejected the entry",
        };
        f.write_str(text)
    }
}

/// Counts for a completed run
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ReconcileSummary {
    pub location: String,
    /// Titles scheduled for resolution
    pub total: usize,
    pub resolved: usize,
    pub unresolved: usize,
    /// Steam entries dropped because they are no longer installed
    pub removed: usize,
}

/// How a location change ended
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReconcileOutcome {
    /// Every scheduled title completed; the location is now current
    Completed(ReconcileSummary),
    /// The location was not accepted and has been reset
    Rejected(LocationProblem),
    /// Scanning failed; catalogue and location are unchanged
    Aborted(String),
}

/// Progress reported while a run is going
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReconcileEvent {
    PhaseChanged(ReconcilePhase),
    /// Titles that are now in flight
    TitlesQueued(Vec<String>),
    Resolved {
        title: String,
        entry: CatalogueEntry,
    },
    Unresolved {
        title: String,
        reason: UnresolvedReason,
    },
    Finished(ReconcileSummary),
    Rejected(LocationProblem),
    Aborted(String),
}

/// Observable state of the current run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReconcileState {
    pub phase: ReconcilePhase,
    /// Titles waiting for a search result
    pub in_flight: BTreeSet<String>,
    pub completed: usize,
    pub total: usize,
}

impl ReconcileState {
    /// Whether every scheduled title has completed
    pub fn is_done(&self) -> bool {
        self.completed >= self.total && self.in_flight.is_empty()
    }
}
