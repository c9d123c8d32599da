//! Integration tests for importing a Steam install into the catalogue
//!
//! These tests verify:
//! - The full validate, scan and resolve run against an on-disk Steam layout
//! - Per-title failures never abort the run
//! - Rejected and aborted runs leave the catalogue alone
//! - Repeated runs never duplicate titles

mod common;

use common::{ScriptedSearch, SteamLayout};
use game_dashboard::catalogue::{Catalogue, CatalogueEntry, MemoryStore};
use game_dashboard::reconcile::{
    ReconcileEvent, ReconcileOutcome, ReconcilePhase, Reconciler, UnresolvedReason,
};
use game_dashboard::steam::LocationProblem;
use std::fs;
use std::time::Duration;
use tokio::sync::mpsc;

const TIMEOUT: Duration = Duration::from_secs(5);

fn reconciler(search: ScriptedSearch) -> Reconciler<ScriptedSearch> {
    Reconciler::new(search, 2, TIMEOUT)
}

fn steam_entry(title: &str, app_id: u32) -> CatalogueEntry {
    let mut entry = CatalogueEntry::manual(title, format!("steam.exe -applaunch {}", app_id));
    entry.steam_app_id = Some(app_id);
    entry
}

#[tokio::test]
async fn test_portal_is_imported() {
    let mut steam = SteamLayout::new();
    let library = steam.add_library("libs/a", &[10, 20]);
    steam.add_manifest(&library, 10, "Portal", "portal.exe");

    let store = MemoryStore::default();
    let mut catalogue = Catalogue::open(Box::new(store.clone()));
    let mut reconciler = reconciler(ScriptedSearch::default().with("portal", &["Portal"]));

    let outcome = reconciler
        .on_location_changed(&steam.location(), &mut catalogue)
        .await;

    let ReconcileOutcome::Completed(summary) = outcome else {
        panic!("unexpected outcome: {:?}", outcome);
    };
    assert_eq!(summary.resolved, 1);
    assert_eq!(summary.unresolved, 0);

    assert_eq!(catalogue.len(), 1);
    let entry = catalogue.get("Portal").unwrap();
    assert_eq!(entry.steam_app_id, Some(10));
    assert_eq!(entry.launch_command, "portal.exe -applaunch 10");
    assert_eq!(entry.description.as_deref(), Some("About Portal"));
    assert_eq!(store.snapshot(), catalogue.entries());

    assert_eq!(reconciler.current_location(), Some(steam.location().as_str()));
    assert_eq!(reconciler.state().phase, ReconcilePhase::Idle);
    assert_eq!(reconciler.search_service().queries(), vec!["portal"]);
}

#[tokio::test]
async fn test_unreadable_manifest_is_skipped() {
    let mut steam = SteamLayout::new();
    let library = steam.add_library("library", &[10, 20, 30]);
    steam.add_manifest(&library, 10, "Portal", "steam.exe");
    steam.add_manifest(&library, 30, "Half-Life", "steam.exe");
    // Present on disk but cannot be read as a file
    fs::create_dir(common::manifest_path(&library, 20)).unwrap();

    let mut catalogue = Catalogue::open(Box::new(MemoryStore::default()));
    let mut reconciler = reconciler(
        ScriptedSearch::default()
            .with("portal", &["Portal"])
            .with("half-life", &["Half-Life"]),
    );

    let outcome = reconciler
        .on_location_changed(&steam.location(), &mut catalogue)
        .await;

    assert!(matches!(outcome, ReconcileOutcome::Completed(ref s) if s.resolved == 2));
    assert!(catalogue.contains("Portal"));
    assert!(catalogue.contains("Half-Life"));
}

#[tokio::test]
async fn test_empty_results_do_not_touch_catalogue() {
    let mut steam = SteamLayout::new();
    let library = steam.add_library("library", &[99]);
    steam.add_manifest(&library, 99, "Obscure Thing", "steam.exe");

    let store = MemoryStore::default();
    let mut catalogue = Catalogue::open(Box::new(store.clone()));
    let mut reconciler = reconciler(ScriptedSearch::default());
    let (tx, mut rx) = mpsc::unbounded_channel();
    reconciler.set_event_channel(tx);

    let outcome = reconciler
        .on_location_changed(&steam.location(), &mut catalogue)
        .await;

    assert!(matches!(outcome, ReconcileOutcome::Completed(ref s) if s.unresolved == 1));
    assert!(catalogue.is_empty());
    assert_eq!(store.save_count(), 0);
    assert!(reconciler.state().in_flight.is_empty());

    let mut events = Vec::new();
    while let Ok(event) = rx.try_recv() {
        events.push(event);
    }
    assert!(events.contains(&ReconcileEvent::TitlesQueued(vec![
        "Obscure Thing".to_string()
    ])));
    assert!(events.contains(&ReconcileEvent::Unresolved {
        title: "Obscure Thing".to_string(),
        reason: UnresolvedReason::NoResults,
    }));
    assert!(matches!(events.last(), Some(ReconcileEvent::Finished(_))));
}

#[tokio::test]
async fn test_second_run_does_not_duplicate() {
    let mut steam = SteamLayout::new();
    let library = steam.add_library("library", &[10]);
    steam.add_manifest(&library, 10, "Portal", "steam.exe");

    let mut catalogue = Catalogue::open(Box::new(MemoryStore::default()));
    let mut reconciler = reconciler(ScriptedSearch::default().with("portal", &["Portal"]));

    for _ in 0..2 {
        let outcome = reconciler
            .on_location_changed(&steam.location(), &mut catalogue)
            .await;
        assert!(matches!(outcome, ReconcileOutcome::Completed(_)));
    }

    assert_eq!(catalogue.len(), 1);
    assert_eq!(catalogue.steam_entries().count(), 1);
}

#[tokio::test]
async fn test_same_title_in_two_libraries() {
    let mut steam = SteamLayout::new();
    let first = steam.add_library("first", &[10]);
    let second = steam.add_library("second", &[10]);
    steam.add_manifest(&first, 10, "Portal", "steam.exe");
    steam.add_manifest(&second, 10, "Portal", "steam.exe");

    let mut catalogue = Catalogue::open(Box::new(MemoryStore::default()));
    let mut reconciler = reconciler(ScriptedSearch::default().with("portal", &["Portal"]));

    reconciler
        .on_location_changed(&steam.location(), &mut catalogue)
        .await;

    assert_eq!(catalogue.len(), 1);
    assert_eq!(reconciler.search_service().queries().len(), 1);
}

#[tokio::test]
async fn test_uninstalled_steam_entries_are_removed() {
    let mut steam = SteamLayout::new();
    let library = steam.add_library("library", &[10]);
    steam.add_manifest(&library, 10, "Portal", "steam.exe");

    let mut catalogue = Catalogue::open(Box::new(MemoryStore::with_entries(vec![
        steam_entry("Old Game", 5),
        CatalogueEntry::manual("Doom", "doom.exe"),
    ])));
    let mut reconciler = reconciler(ScriptedSearch::default().with("portal", &["Portal"]));

    let outcome = reconciler
        .on_location_changed(&steam.location(), &mut catalogue)
        .await;

    assert!(matches!(outcome, ReconcileOutcome::Completed(ref s) if s.removed == 1));
    assert!(!catalogue.contains("Old Game"));
    assert!(catalogue.contains("Doom"));
    assert!(catalogue.contains("Portal"));
}

#[tokio::test]
async fn test_invalid_location_is_rejected() {
    let steam = SteamLayout::new();
    fs::remove_file(steam.path().join("steam.exe")).unwrap();

    let mut catalogue = Catalogue::open(Box::new(MemoryStore::with_entries(vec![steam_entry(
        "Portal", 10,
    )])));
    let mut reconciler = reconciler(ScriptedSearch::default());
    reconciler.set_current_location(Some("/previous".to_string()));

    let outcome = reconciler
        .on_location_changed(&steam.location(), &mut catalogue)
        .await;

    assert!(matches!(
        outcome,
        ReconcileOutcome::Rejected(LocationProblem::NoExecutable(_))
    ));
    assert_eq!(reconciler.current_location(), None);
    assert_eq!(reconciler.state().phase, ReconcilePhase::Idle);
    assert!(catalogue.contains("Portal"));
}

#[tokio::test]
async fn test_empty_location_is_rejected() {
    let mut catalogue = Catalogue::open(Box::new(MemoryStore::default()));
    let mut reconciler = reconciler(ScriptedSearch::default());

    let outcome = reconciler.on_location_changed("   ", &mut catalogue).await;

    assert_eq!(outcome, ReconcileOutcome::Rejected(LocationProblem::Empty));
}

#[tokio::test]
async fn test_nothing_installed_is_rejected() {
    let steam = SteamLayout::new();
    let mut catalogue = Catalogue::open(Box::new(MemoryStore::default()));
    let mut reconciler = reconciler(ScriptedSearch::default());

    let outcome = reconciler
        .on_location_changed(&steam.location(), &mut catalogue)
        .await;

    assert!(matches!(
        outcome,
        ReconcileOutcome::Rejected(LocationProblem::NoInstalledTitles(_))
    ));
    assert_eq!(reconciler.current_location(), None);
}

#[tokio::test]
async fn test_broken_descriptor_aborts_without_changes() {
    let steam = SteamLayout::new();
    steam.overwrite_library_folders("\"libraryfolders\" { \"0\" { \"path\" }");

    let store = MemoryStore::with_entries(vec![steam_entry("Portal", 10)]);
    let mut catalogue = Catalogue::open(Box::new(store.clone()));
    let mut reconciler = reconciler(ScriptedSearch::default());
    reconciler.set_current_location(Some("/previous".to_string()));

    let outcome = reconciler
        .on_location_changed(&steam.location(), &mut catalogue)
        .await;

    assert!(matches!(outcome, ReconcileOutcome::Aborted(_)));
    assert!(catalogue.contains("Portal"));
    assert_eq!(store.save_count(), 0);
    assert_eq!(reconciler.current_location(), Some("/previous"));
    assert_eq!(reconciler.state().phase, ReconcilePhase::Idle);
}
