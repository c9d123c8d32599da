//! Steam library reconciliation.
//!
//! Turns a Steam location into catalogue entries: validate the location,
//! scan the installed titles, then resolve each one against the metadata
//! search service with a small pool of workers.

pub mod engine;
pub mod events;

pub use engine::{resolve_unit, scan_installed, Reconciler, ResolveReport, DEFAULT_WORKERS};
pub use events::{
    ReconcileEvent, ReconcileOutcome, ReconcilePhase, ReconcileState, ReconcileSummary,
    UnresolvedReason,
};
