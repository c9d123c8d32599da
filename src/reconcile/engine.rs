use log::{debug, error, info, warn};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc::{self, UnboundedSender};
use tokio::sync::Semaphore;

use super::events::{
    ReconcileEvent, ReconcileOutcome, ReconcilePhase, ReconcileState, ReconcileSummary,
    UnresolvedReason,
};
use crate::catalogue::{Catalogue, CatalogueEntry, CatalogueError};
use crate::matching::{closest_match, normalize};
use crate::metadata::{SearchOptions, SearchService};
use crate::steam::{
    find_manifests, read_manifests, try_build_library_map, validate_location, InstalledTitle,
    LocationProblem, SteamError,
};

/// Worker count used when none is configured
pub const DEFAULT_WORKERS: usize = 2;

/// Result of one title's resolution, sent back to the coordinating task
#[derive(Debug)]
struct UnitReport {
    title: InstalledTitle,
    result: Result<CatalogueEntry, UnresolvedReason>,
}

/// Titles handled by [`Reconciler::resolve_titles`]
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResolveReport {
    /// Titles now present in the catalogue as Steam entries
    pub resolved: HashSet<String>,
    pub unresolved: usize,
}

/// Imports the titles installed under a Steam location into the catalogue.
///
/// Searches run on spawned tasks, at most `workers` at a time. Their results
/// come back over a channel to the task driving the run, which is the only
/// place the catalogue and the in-flight set are changed.
pub struct Reconciler<S: SearchService> {
    search: Arc<S>,
    workers: usize,
    search_timeout: Duration,
    events_tx: Option<UnboundedSender<ReconcileEvent>>,
    state: ReconcileState,
    current_location: Option<String>,
}

impl<S: SearchService> Reconciler<S> {
    pub fn new(search: S, workers: usize, search_timeout: Duration) -> Self {
        Self {
            search: Arc::new(search),
            workers: workers.max(1),
            search_timeout,
            events_tx: None,
            state: ReconcileState::default(),
            current_location: None,
        }
    }

    /// Report progress on `tx`
    pub fn set_event_channel(&mut self, tx: UnboundedSender<ReconcileEvent>) {
        self.events_tx = Some(tx);
    }

    /// The search service used for resolution
    pub fn search_service(&self) -> Arc<S> {
        Arc::clone(&self.search)
    }

    /// Location accepted by the last completed run
    pub fn current_location(&self) -> Option<&str> {
        self.current_location.as_deref()
    }

    /// Mark `location` as already configured, e.g. after restoring from disk
    pub fn set_current_location(&mut self, location: Option<String>) {
        self.current_location = location;
    }

    pub fn state(&self) -> &ReconcileState {
        &self.state
    }

    fn send_event(&self, event: ReconcileEvent) {
        if let Some(tx) = &self.events_tx {
            if tx.send(event).is_err() {
                debug!("Reconcile event receiver has gone away");
            }
        }
    }

    fn set_phase(&mut self, phase: ReconcilePhase) {
        if self.state.phase != phase {
            debug!("Reconcile phase: {} -> {}", self.state.phase, phase);
            self.state.phase = phase;
            self.send_event(ReconcileEvent::PhaseChanged(phase));
        }
    }

    /// React to the Steam location being set to `location`.
    ///
    /// An invalid location, or one with nothing installed, is rejected and
    /// the current location cleared. When the library descriptor cannot be
    /// read the run aborts and nothing changes. Otherwise every installed
    /// title is resolved, Steam entries that were not refreshed are removed
    /// and `location` becomes current.
    pub async fn on_location_changed(
        &mut self,
        location: &str,
        catalogue: &mut Catalogue,
    ) -> ReconcileOutcome {
        let location = location.trim().to_string();
        info!("Steam location changed to \"{}\"", location);

        self.set_phase(ReconcilePhase::Validating);
        let steam_path = match validate_location(&location) {
            Ok(path) => path,
            Err(problem) => return self.reject(problem),
        };

        self.set_phase(ReconcilePhase::Scanning);
        let titles = match scan_titles(steam_path).await {
            Ok(titles) => titles,
            Err(message) => {
                error!("Steam scan of {} aborted: {}", location, message);
                self.set_phase(ReconcilePhase::Idle);
                self.send_event(ReconcileEvent::Aborted(message.clone()));
                return ReconcileOutcome::Aborted(message);
            }
        };

        if titles.is_empty() {
            return self.reject(LocationProblem::NoInstalledTitles(location));
        }

        let report = self.resolve_titles(titles, catalogue).await;

        let stale = catalogue.remove_where(|entry| {
            entry.is_steam() && !report.resolved.contains(&entry.title)
        });
        if !stale.is_empty() {
            info!("Removed {} Steam entries that are no longer installed", stale.len());
        }

        let summary = ReconcileSummary {
            location: location.clone(),
            total: report.resolved.len() + report.unresolved,
            resolved: report.resolved.len(),
            unresolved: report.unresolved,
            removed: stale.len(),
        };
        info!(
            "Steam import finished: {} resolved, {} unresolved, {} removed",
            summary.resolved, summary.unresolved, summary.removed
        );

        self.current_location = Some(location);
        self.set_phase(ReconcilePhase::Idle);
        self.send_event(ReconcileEvent::Finished(summary.clone()));
        ReconcileOutcome::Completed(summary)
    }

    fn reject(&mut self, problem: LocationProblem) -> ReconcileOutcome {
        warn!("Rejecting Steam location: {}", problem);
        self.current_location = None;
        self.set_phase(ReconcilePhase::Idle);
        self.send_event(ReconcileEvent::Rejected(problem.clone()));
        ReconcileOutcome::Rejected(problem)
    }

    /// Resolve `titles` against the search service and apply the results.
    ///
    /// Returns once every title has completed, whether or not it resolved.
    pub async fn resolve_titles(
        &mut self,
        titles: Vec<InstalledTitle>,
        catalogue: &mut Catalogue,
    ) -> ResolveReport {
        let titles = dedupe_titles(titles);

        self.set_phase(ReconcilePhase::Resolving);
        self.state.in_flight = titles.iter().map(|t| t.raw_name.clone()).collect();
        self.state.completed = 0;
        self.state.total = titles.len();
        self.send_event(ReconcileEvent::TitlesQueued(
            titles.iter().map(|t| t.raw_name.clone()).collect(),
        ));

        info!(
            "Resolving {} titles with {} workers",
            titles.len(),
            self.workers
        );

        let semaphore = Arc::new(Semaphore::new(self.workers));
        let (tx, mut rx) = mpsc::unbounded_channel::<UnitReport>();

        for title in titles {
            let search = Arc::clone(&self.search);
            let semaphore = Arc::clone(&semaphore);
            let tx = tx.clone();
            let timeout = self.search_timeout;

            tokio::spawn(async move {
                let Ok(_permit) = semaphore.acquire_owned().await else {
                    return;
                };
                let result = resolve_unit(search.as_ref(), &title, timeout).await;
                // The receiver only closes once the run is over
                let _ = tx.send(UnitReport { title, result });
            });
        }
        drop(tx);

        let mut report = ResolveReport::default();

        // Ends once every worker has dropped its sender
        while let Some(unit) = rx.recv().await {
            let name = unit.title.raw_name.clone();
            match unit.result {
                Ok(entry) => match self.apply_resolved(entry, catalogue) {
                    Ok(entry) => {
                        report.resolved.insert(name.clone());
                        self.finish_unit(&name);
                        self.send_event(ReconcileEvent::Resolved { title: name, entry });
                    }
                    Err(reason) => {
                        report.unresolved += 1;
                        self.finish_unresolved(name, reason);
                    }
                },
                Err(reason) => {
                    report.unresolved += 1;
                    self.finish_unresolved(name, reason);
                }
            }
        }

        // Workers that panicked never reported
        let orphaned: Vec<String> = self.state.in_flight.iter().cloned().collect();
        for name in orphaned {
            error!("Worker for \"{}\" stopped without a result", name);
            report.unresolved += 1;
            self.finish_unresolved(name, UnresolvedReason::WorkerFailed);
        }

        report
    }

    fn finish_unit(&mut self, name: &str) {
        self.state.in_flight.remove(name);
        self.state.completed += 1;
        debug!(
            "{}/{} titles done, {} in flight",
            self.state.completed,
            self.state.total,
            self.state.in_flight.len()
        );
    }

    fn finish_unresolved(&mut self, name: String, reason: UnresolvedReason) {
        info!("Could not resolve \"{}\": {}", name, reason);
        self.finish_unit(&name);
        self.send_event(ReconcileEvent::Unresolved {
            title: name,
            reason,
        });
    }

    /// Put a resolved entry into the catalogue.
    ///
    /// An existing Steam entry with the same title is refreshed, keeping its
    /// nickname. A manual entry with the same title wins.
    fn apply_resolved(
        &self,
        mut entry: CatalogueEntry,
        catalogue: &mut Catalogue,
    ) -> Result<CatalogueEntry, UnresolvedReason> {
        let existing = catalogue
            .get(&entry.title)
            .map(|e| (e.is_steam(), e.nickname.clone()));

        let result = match existing {
            None => catalogue.add(entry.clone()),
            Some((true, nickname)) => {
                entry.nickname = nickname;
                catalogue.update(entry.clone())
            }
            Some((false, _)) => return Err(UnresolvedReason::TitleTaken),
        };

        match result {
            Ok(_) => Ok(entry),
            Err(e) => Err(store_rejected(&entry.title, e)),
        }
    }
}

fn store_rejected(title: &str, error: CatalogueError) -> UnresolvedReason {
    error!("Failed to store \"{}\": {}", title, error);
    UnresolvedReason::StoreRejected
}

/// Resolve one installed title to a catalogue entry
pub async fn resolve_unit<S: SearchService>(
    search: &S,
    title: &InstalledTitle,
    timeout: Duration,
) -> Result<CatalogueEntry, UnresolvedReason> {
    let query = normalize(&title.raw_name);
    if query.is_empty() {
        return Err(UnresolvedReason::EmptyName);
    }

    let options = SearchOptions {
        include_description: true,
        include_cover: true,
    };

    debug!("Searching for \"{}\" (from \"{}\")", query, title.raw_name);
    let candidates = match tokio::time::timeout(timeout, search.search(&query, options)).await {
        Ok(candidates) => candidates,
        Err(_) => {
            warn!("Search for \"{}\" timed out after {:?}", query, timeout);
            Vec::new()
        }
    };

    if candidates.is_empty() {
        return Err(UnresolvedReason::NoResults);
    }

    closest_match(&title.raw_name, &candidates)
        .map(|candidate| CatalogueEntry::from_steam(title, candidate))
        .ok_or(UnresolvedReason::NoMatch)
}

/// Enumerate installed titles off the async runtime
async fn scan_titles(steam_path: PathBuf) -> Result<Vec<InstalledTitle>, String> {
    match tokio::task::spawn_blocking(move || scan_installed(&steam_path)).await {
        Ok(result) => result.map_err(|e| e.to_string()),
        Err(e) => Err(format!("scan task failed: {}", e)),
    }
}

/// Read the library descriptor and every manifest it points at
pub fn scan_installed(steam_path: &Path) -> Result<Vec<InstalledTitle>, SteamError> {
    let library_map = try_build_library_map(steam_path)?;
    let manifests = find_manifests(&library_map);
    Ok(read_manifests(&manifests))
}

/// Drop titles whose raw name was already seen
fn dedupe_titles(titles: Vec<InstalledTitle>) -> Vec<InstalledTitle> {
    let mut seen = HashSet::new();
    titles
        .into_iter()
        .filter(|title| {
            let first = seen.insert(title.raw_name.clone());
            if !first {
                debug!(
                    "Skipping duplicate title \"{}\" (app {})",
                    title.raw_name, title.app_id
                );
            }
            first
        })
        .collect()
}
