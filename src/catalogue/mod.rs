//! The user's game catalogue.
//!
//! [`Catalogue`] is the single in-memory source of truth for the game list.
//! Every mutation goes through one method that updates the list, persists it
//! through the injected [`CatalogueStore`] and reports a [`CatalogueChange`].

pub mod entry;
pub mod store;

use log::{debug, warn};
use thiserror::Error;
use tokio::sync::mpsc::UnboundedSender;

pub use entry::CatalogueEntry;
pub use store::{CatalogueStore, JsonFileStore, MemoryStore};

/// A change applied to the catalogue
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CatalogueChange {
    Added(CatalogueEntry),
    Removed(CatalogueEntry),
    Updated {
        before: CatalogueEntry,
        after: CatalogueEntry,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CatalogueError {
    #[error("a game titled \"{0}\" is already in the catalogue")]
    DuplicateTitle(String),

    #[error("no game titled \"{0}\" in the catalogue")]
    UnknownTitle(String),
}

/// Ordered, persisted list of games
pub struct Catalogue {
    entries: Vec<CatalogueEntry>,
    store: Box<dyn CatalogueStore>,
    changes_tx: Option<UnboundedSender<CatalogueChange>>,
}

impl Catalogue {
    /// Load the catalogue from `store`.
    ///
    /// Entries repeating an earlier title are dropped.
    pub fn open(store: Box<dyn CatalogueStore>) -> Self {
        let mut entries: Vec<CatalogueEntry> = Vec::new();
        for entry in store.load() {
            if entries.iter().any(|e| e.title == entry.title) {
                warn!("Dropping duplicate catalogue entry \"{}\"", entry.title);
                continue;
            }
            entries.push(entry);
        }

        Self {
            entries,
            store,
            changes_tx: None,
        }
    }

    /// Forward every change to `tx`
    pub fn set_change_channel(&mut self, tx: UnboundedSender<CatalogueChange>) {
        self.changes_tx = Some(tx);
    }

    pub fn entries(&self) -> &[CatalogueEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, title: &str) -> Option<&CatalogueEntry> {
        self.entries.iter().find(|e| e.title == title)
    }

    pub fn contains(&self, title: &str) -> bool {
        self.get(title).is_some()
    }

    /// Entries imported from Steam
    pub fn steam_entries(&self) -> impl Iterator<Item = &CatalogueEntry> {
        self.entries.iter().filter(|e| e.is_steam())
    }

    /// Append an entry; titles must be unique
    pub fn add(&mut self, entry: CatalogueEntry) -> Result<CatalogueChange, CatalogueError> {
        if self.contains(&entry.title) {
            return Err(CatalogueError::DuplicateTitle(entry.title));
        }

        self.entries.push(entry.clone());
        Ok(self.commit(CatalogueChange::Added(entry)))
    }

    /// Replace the entry with the same title
    pub fn update(&mut self, entry: CatalogueEntry) -> Result<CatalogueChange, CatalogueError> {
        let Some(slot) = self.entries.iter_mut().find(|e| e.title == entry.title) else {
            return Err(CatalogueError::UnknownTitle(entry.title));
        };

        let before = std::mem::replace(slot, entry.clone());
        Ok(self.commit(CatalogueChange::Updated {
            before,
            after: entry,
        }))
    }

    /// Remove the entry with `title`
    pub fn remove(&mut self, title: &str) -> Result<CatalogueChange, CatalogueError> {
        let Some(index) = self.entries.iter().position(|e| e.title == title) else {
            return Err(CatalogueError::UnknownTitle(title.to_string()));
        };

        let removed = self.entries.remove(index);
        Ok(self.commit(CatalogueChange::Removed(removed)))
    }

    /// Remove every entry matching `predicate`, persisting once
    pub fn remove_where<F>(&mut self, mut predicate: F) -> Vec<CatalogueChange>
    where
        F: FnMut(&CatalogueEntry) -> bool,
    {
        let (removed, kept): (Vec<_>, Vec<_>) =
            std::mem::take(&mut self.entries).into_iter().partition(|e| predicate(e));
        self.entries = kept;

        if removed.is_empty() {
            return Vec::new();
        }

        self.store.save(&self.entries);
        removed
            .into_iter()
            .map(|entry| {
                let change = CatalogueChange::Removed(entry);
                self.notify(&change);
                change
            })
            .collect()
    }

    /// Persist and announce a change already applied to `entries`
    fn commit(&mut self, change: CatalogueChange) -> CatalogueChange {
        self.store.save(&self.entries);
        self.notify(&change);
        change
    }

    fn notify(&self, change: &CatalogueChange) {
        debug!("Catalogue change: {:?}", change);
        if let Some(tx) = &self.changes_tx {
            if tx.send(change.clone()).is_err() {
                debug!("Catalogue change subscriber has gone away");
            }
        }
    }
}
