//! Application service behind the front end.
//!
//! Owns the configuration, the catalogue and the reconciler, and keeps the
//! persisted Steam location and Steam entry cache in step with each run.

use anyhow::{Context, Result};
use log::{error, info};
use std::path::PathBuf;
use tokio::sync::mpsc::UnboundedSender;

use crate::catalogue::{Catalogue, CatalogueChange, CatalogueError, JsonFileStore};
use crate::config::Config;
use crate::launch::{LaunchCommand, LaunchError};
use crate::metadata::{MetadataClient, SearchCandidate, SearchOptions, SearchService};
use crate::onboarding::{self, OnboardingOutcome, Storefront};
use crate::reconcile::{ReconcileEvent, ReconcileOutcome, Reconciler};
use crate::steam::SteamCache;

pub struct Dashboard<S: SearchService> {
    config: Config,
    config_path: PathBuf,
    catalogue: Catalogue,
    reconciler: Reconciler<S>,
    steam_cache: SteamCache,
}

impl Dashboard<MetadataClient> {
    /// Open the dashboard with the configured metadata provider
    pub fn open(config: Config, config_path: PathBuf) -> Result<Self> {
        let client = MetadataClient::from_config(&config.metadata)
            .context("Failed to create metadata client")?;
        Self::with_search(config, config_path, client)
    }
}

impl<S: SearchService> Dashboard<S> {
    /// Open the dashboard with a given search service.
    ///
    /// With a Steam location configured, Steam entries recorded in the cache
    /// for that location are put back into the catalogue.
    pub fn with_search(config: Config, config_path: PathBuf, search: S) -> Result<Self> {
        config.ensure_directories()?;

        let mut catalogue = Catalogue::open(Box::new(JsonFileStore::new(config.catalogue_path())));
        let mut reconciler = Reconciler::new(
            search,
            config.steam.worker_count(),
            config.metadata.timeout(),
        );
        let steam_cache = SteamCache::new(config.steam_cache_path());

        let location = config.steam.location.trim();
        if !location.is_empty() {
            steam_cache.restore_into(&mut catalogue, location);
            reconciler.set_current_location(Some(location.to_string()));
        }

        info!("Dashboard ready with {} games", catalogue.len());

        Ok(Self {
            config,
            config_path,
            catalogue,
            reconciler,
            steam_cache,
        })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn catalogue(&self) -> &Catalogue {
        &self.catalogue
    }

    pub fn reconciler(&self) -> &Reconciler<S> {
        &self.reconciler
    }

    /// Receive reconciliation progress on `tx`
    pub fn set_event_channel(&mut self, tx: UnboundedSender<ReconcileEvent>) {
        self.reconciler.set_event_channel(tx);
    }

    /// Receive catalogue changes on `tx`
    pub fn set_change_channel(&mut self, tx: UnboundedSender<CatalogueChange>) {
        self.catalogue.set_change_channel(tx);
    }

    /// Remove a game by title
    pub fn remove_game(&mut self, title: &str) -> Result<CatalogueChange, CatalogueError> {
        let change = self.catalogue.remove(title)?;

        // Keep the cache from restoring the game on the next start
        if let CatalogueChange::Removed(entry) = &change {
            if entry.is_steam() {
                self.write_steam_cache();
            }
        }

        Ok(change)
    }

    /// Start a game by title, returning the process id.
    ///
    /// The process is not monitored after it starts.
    pub fn launch(&self, title: &str) -> Result<u32, LaunchError> {
        let entry = self
            .catalogue
            .get(title)
            .ok_or_else(|| CatalogueError::UnknownTitle(title.to_string()))?;
        let command = LaunchCommand::parse(&entry.launch_command)
            .ok_or_else(|| LaunchError::NoCommand(entry.title.clone()))?;

        info!("Launching \"{}\": {}", entry.title, entry.launch_command);
        command.spawn_detached()
    }

    /// Search the metadata service directly
    pub async fn search(&self, query: &str) -> Vec<SearchCandidate> {
        let options = SearchOptions {
            include_description: true,
            include_cover: true,
        };
        self.reconciler.search_service().search(query, options).await
    }

    /// Onboard a storefront, persisting the resulting Steam location
    pub async fn onboard(&mut self, storefront: Storefront) -> Result<OnboardingOutcome> {
        let outcome =
            onboarding::onboard(storefront, &mut self.reconciler, &mut self.catalogue).await;

        if let OnboardingOutcome::Steam(steam) = &outcome {
            self.record_steam_outcome(steam)?;
        }

        Ok(outcome)
    }

    /// Re-import the configured Steam location, `None` when there is none
    pub async fn rescan(&mut self) -> Result<Option<ReconcileOutcome>> {
        let location = self.config.steam.location.trim().to_string();
        if location.is_empty() {
            info!("No Steam location configured");
            return Ok(None);
        }

        match self.onboard(Storefront::Steam { location }).await? {
            OnboardingOutcome::Steam(outcome) => Ok(Some(outcome)),
            OnboardingOutcome::NotYetSupported(_) => Ok(None),
        }
    }

    fn record_steam_outcome(&mut self, outcome: &ReconcileOutcome) -> Result<()> {
        let location = match outcome {
            ReconcileOutcome::Completed(summary) => summary.location.clone(),
            ReconcileOutcome::Rejected(_) => String::new(),
            ReconcileOutcome::Aborted(_) => return Ok(()),
        };

        if self.config.steam.location != location {
            self.config.steam.location = location;
            self.config.save_to(&self.config_path)?;
        }

        if matches!(outcome, ReconcileOutcome::Completed(_)) {
            self.write_steam_cache();
        }

        Ok(())
    }

    fn write_steam_cache(&self) {
        let location = self.config.steam.location.trim();
        if location.is_empty() {
            return;
        }

        if let Err(e) = self.steam_cache.save(location, &self.catalogue) {
            error!("{:#}", e);
        }
    }
}
