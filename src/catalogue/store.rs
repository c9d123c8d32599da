use anyhow::{Context, Result};
use log::{error, info, warn};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use super::CatalogueEntry;

/// Persistence for the catalogue.
///
/// Failures are logged by the implementation, never returned.
pub trait CatalogueStore: Send {
    /// Load all entries
    fn load(&self) -> Vec<CatalogueEntry>;
    /// Replace the stored entries
    fn save(&self, entries: &[CatalogueEntry]);
}

/// On-disk layout of `games.json`.
///
/// Read with `T = serde_json::Value` so one bad entry cannot hide the rest.
#[derive(Debug, Deserialize, Serialize)]
struct CatalogueFile<T> {
    #[serde(default = "Vec::new")]
    games: Vec<T>,
}

/// Entries read from disk, and whether any had to be dropped
struct ReadResult {
    entries: Vec<CatalogueEntry>,
    skipped: usize,
}

/// Catalogue stored as pretty-printed JSON.
///
/// A file that cannot be read in full is copied to `<name>.bak` before the
/// next save replaces it. If that copy fails the store stops writing.
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    path: PathBuf,
    read_only: Arc<AtomicBool>,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            read_only: Arc::default(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Where the previous contents go when the file cannot be read in full
    pub fn backup_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_default();
        name.push(".bak");
        self.path.with_file_name(name)
    }

    fn read(&self) -> Result<ReadResult> {
        let json_str = fs::read_to_string(&self.path)
            .with_context(|| format!("Failed to read catalogue file: {}", self.path.display()))?;

        let file: CatalogueFile<serde_json::Value> = serde_json::from_str(&json_str)
            .with_context(|| format!("Failed to parse catalogue file: {}", self.path.display()))?;

        let total = file.games.len();
        let entries: Vec<CatalogueEntry> = file
            .games
            .into_iter()
            .enumerate()
            .filter_map(|(index, value)| match serde_json::from_value(value) {
                Ok(entry) => Some(entry),
                Err(e) => {
                    warn!("Skipping catalogue entry {}: {}", index, e);
                    None
                }
            })
            .collect();

        Ok(ReadResult {
            skipped: total - entries.len(),
            entries,
        })
    }

    /// Copy the current file aside; on failure refuse all further writes
    fn back_up(&self) {
        let backup = self.backup_path();
        match fs::copy(&self.path, &backup) {
            Ok(_) => warn!("Previous catalogue saved to {}", backup.display()),
            Err(e) => {
                error!(
                    "Failed to copy {} to {}: {}",
                    self.path.display(),
                    backup.display(),
                    e
                );
                warn!("Catalogue changes will not be saved this session");
                self.read_only.store(true, Ordering::SeqCst);
            }
        }
    }

    fn write(&self, entries: &[CatalogueEntry]) -> Result<()> {
        // Create parent directory if it doesn't exist
        if let Some(parent) = self.path.parent() {
            if !parent.exists() {
                fs::create_dir_all(parent)?;
            }
        }

        let file = CatalogueFile {
            games: entries.to_vec(),
        };
        let json_str = serde_json::to_string_pretty(&file).context("Failed to serialize catalogue")?;

        fs::write(&self.path, json_str)
            .with_context(|| format!("Failed to write catalogue file: {}", self.path.display()))?;

        Ok(())
    }
}

impl CatalogueStore for JsonFileStore {
    fn load(&self) -> Vec<CatalogueEntry> {
        if !self.path.exists() {
            info!("Creating empty catalogue at {}", self.path.display());
            self.save(&[]);
            return Vec::new();
        }

        match self.read() {
            Ok(ReadResult { entries, skipped }) => {
                info!("Loaded {} games from {}", entries.len(), self.path.display());
                if skipped > 0 {
                    warn!("{} unreadable catalogue entries were dropped", skipped);
                    self.back_up();
                }
                entries
            }
            Err(e) => {
                error!("{:#}", e);
                warn!("Starting with an empty catalogue");
                self.back_up();
                Vec::new()
            }
        }
    }

    fn save(&self, entries: &[CatalogueEntry]) {
        if self.read_only.load(Ordering::SeqCst) {
            warn!(
                "Not writing {}: the previous contents could not be backed up",
                self.path.display()
            );
            return;
        }
        if let Err(e) = self.write(entries) {
            error!("{:#}", e);
        }
    }
}

/// In-memory store; clones share the same contents
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    entries: Arc<Mutex<Vec<CatalogueEntry>>>,
    saves: Arc<Mutex<usize>>,
}

impl MemoryStore {
    /// Store that starts out holding `entries`
    pub fn with_entries(entries: Vec<CatalogueEntry>) -> Self {
        Self {
            entries: Arc::new(Mutex::new(entries)),
            saves: Arc::default(),
        }
    }

    /// Entries as last saved
    pub fn snapshot(&self) -> Vec<CatalogueEntry> {
        self.entries.lock().map(|e| e.clone()).unwrap_or_default()
    }

    /// Number of times `save` was called
    pub fn save_count(&self) -> usize {
        self.saves.lock().map(|s| *s).unwrap_or_default()
    }
}

impl CatalogueStore for MemoryStore {
    fn load(&self) -> Vec<CatalogueEntry> {
        self.snapshot()
    }

    fn save(&self, entries: &[CatalogueEntry]) {
        if let Ok(mut stored) = self.entries.lock() {
            *stored = entries.to_vec();
        }
        if let Ok(mut saves) = self.saves.lock() {
            *saves += 1;
        }
    }
}
