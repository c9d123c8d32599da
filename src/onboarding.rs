//! Storefront onboarding.
//!
//! Each storefront the user can connect is a [`Storefront`] variant carrying
//! what its onboarding needs. [`onboard`] is the one place a variant is routed
//! to its handler; only Steam is implemented.

use clap::ValueEnum;
use log::{info, warn};
use std::fmt;

use crate::catalogue::Catalogue;
use crate::metadata::SearchService;
use crate::reconcile::{ReconcileOutcome, Reconciler};

/// Storefronts without their data
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, ValueEnum)]
pub enum StorefrontKind {
    Steam,
    Origin,
    #[value(name = "epic")]
    EpicGames,
    Uplay,
    #[value(name = "battlenet")]
    BattleNet,
    Other,
}

impl StorefrontKind {
    pub const ALL: [StorefrontKind; 6] = [
        StorefrontKind::Steam,
        StorefrontKind::Origin,
        StorefrontKind::EpicGames,
        StorefrontKind::Uplay,
        StorefrontKind::BattleNet,
        StorefrontKind::Other,
    ];

    /// Name shown to the user
    pub fn display_name(self) -> &'static str {
        match self {
            StorefrontKind::Steam => "Steam",
            StorefrontKind::Origin => "Origin",
            StorefrontKind::EpicGames => "Epic Games",
            StorefrontKind::Uplay => "Uplay",
            StorefrontKind::BattleNet => "Battle.net",
            StorefrontKind::Other => "Other",
        }
    }
}

impl fmt::Display for StorefrontKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

/// A storefront to onboard
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Storefront {
    Steam { location: String },
    Origin,
    EpicGames,
    Uplay,
    BattleNet,
    Other,
}

impl Storefront {
    /// Build the variant for `kind`; only Steam uses `location`
    pub fn new(kind: StorefrontKind, location: Option<String>) -> Self {
        match kind {
            StorefrontKind::Steam => Storefront::Steam {
                location: location.unwrap_or_default(),
            },
            StorefrontKind::Origin => Storefront::Origin,
            StorefrontKind::EpicGames => Storefront::EpicGames,
            StorefrontKind::Uplay => Storefront::Uplay,
            StorefrontKind::BattleNet => Storefront::BattleNet,
            StorefrontKind::Other => Storefront::Other,
        }
    }

    pub fn kind(&self) -> StorefrontKind {
        match self {
            Storefront::Steam { .. } => StorefrontKind::Steam,
            Storefront::Origin => StorefrontKind::Origin,
            Storefront::EpicGames => StorefrontKind::EpicGames,
            Storefront::Uplay => StorefrontKind::Uplay,
            Storefront::BattleNet => StorefrontKind::BattleNet,
            Storefront::Other => StorefrontKind::Other,
        }
    }
}

/// Result of onboarding a storefront
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OnboardingOutcome {
    Steam(ReconcileOutcome),
    NotYetSupported(StorefrontKind),
}

/// Run the onboarding flow for `storefront`
pub async fn onboard<S: SearchService>(
    storefront: Storefront,
    reconciler: &mut Reconciler<S>,
    catalogue: &mut Catalogue,
) -> OnboardingOutcome {
    info!("Onboarding {}", storefront.kind());

    match storefront {
        Storefront::Steam { location } => {
            OnboardingOutcome::Steam(reconciler.on_location_changed(&location, catalogue).await)
        }
        Storefront::Origin
        | Storefront::EpicGames
        | Storefront::Uplay
        | Storefront::BattleNet
        | Storefront::Other => {
            let kind = storefront.kind();
            warn!("{} onboarding is not supported yet", kind);
            OnboardingOutcome::NotYetSupported(kind)
        }
    }
}
