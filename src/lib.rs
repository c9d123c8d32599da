// Game Dashboard - Steam library discovery and catalogue reconciliation
//
// This is the library crate with the parsing, scanning, matching and
// reconciliation logic. The binary crate (main.rs) is the command-line front end.

pub mod catalogue;
pub mod config;
pub mod dashboard;
pub mod launch;
pub mod matching;
pub mod metadata;
pub mod onboarding;
pub mod reconcile;
pub mod steam;
pub mod vdf;

// Re-export commonly used types for convenience
pub use catalogue::{Catalogue, CatalogueChange, CatalogueEntry, CatalogueStore};
pub use config::Config;
pub use dashboard::Dashboard;
pub use metadata::{SearchCandidate, SearchOptions, SearchService};
pub use onboarding::{OnboardingOutcome, Storefront, StorefrontKind};
pub use reconcile::{ReconcileEvent, ReconcileOutcome, Reconciler};

/// Application version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Application name
pub const APP_NAME: &str = env!("CARGO_PKG_NAME");
