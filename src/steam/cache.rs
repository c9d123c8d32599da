use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use log::{debug, error, info, warn};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::catalogue::{Catalogue, CatalogueEntry};

/// One cached Steam entry
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SteamCacheRecord {
    pub app_id: Option<i64>,
    pub name: Option<String>,
    pub execution_path: Option<String>,
    #[serde(rename = "thumbCoverImageURL")]
    pub thumb_cover_image_url: Option<String>,
    #[serde(rename = "coverImageURL")]
    pub cover_image_url: Option<String>,
}

impl SteamCacheRecord {
    pub fn from_entry(entry: &CatalogueEntry) -> Self {
        Self {
            app_id: entry.steam_app_id.map(i64::from),
            name: Some(entry.title.clone()),
            execution_path: Some(entry.launch_command.clone()),
            thumb_cover_image_url: Some(entry.thumbnail_url.clone()),
            cover_image_url: Some(entry.cover_url.clone()),
        }
    }

    /// Catalogue entry for this record, `None` if any field is missing
    pub fn to_entry(&self) -> Option<CatalogueEntry> {
        let app_id = u32::try_from(self.app_id?).ok()?;
        let name = self.name.as_deref()?.trim();
        if name.is_empty() {
            return None;
        }

        let mut entry = CatalogueEntry::manual(name, self.execution_path.clone()?);
        entry.thumbnail_url = self.thumb_cover_image_url.clone()?;
        entry.cover_url = self.cover_image_url.clone()?;
        entry.steam_app_id = Some(app_id);
        Some(entry)
    }
}

/// On-disk layout of `steam_cache.json`
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SteamCacheFile {
    #[serde(default)]
    pub steam_location: String,
    #[serde(default)]
    pub scanned_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub cache: Vec<SteamCacheRecord>,
}

/// Steam entries from the last completed scan, kept next to the catalogue
#[derive(Debug, Clone)]
pub struct SteamCache {
    path: PathBuf,
}

impl SteamCache {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the cache file, `None` when it is missing or unreadable
    pub fn load(&self) -> Option<SteamCacheFile> {
        if !self.path.exists() {
            debug!("No Steam cache at {}", self.path.display());
            return None;
        }

        match self.read() {
            Ok(file) => Some(file),
            Err(e) => {
                error!("{:#}", e);
                None
            }
        }
    }

    fn read(&self) -> Result<SteamCacheFile> {
        let json_str = fs::read_to_string(&self.path)
            .with_context(|| format!("Failed to read Steam cache: {}", self.path.display()))?;

        serde_json::from_str(&json_str)
            .with_context(|| format!("Failed to parse Steam cache: {}", self.path.display()))
    }

    /// Record the catalogue's Steam entries for `location`
    pub fn save(&self, location: &str, catalogue: &Catalogue) -> Result<()> {
        let file = SteamCacheFile {
            steam_location: location.to_string(),
            scanned_at: Some(Utc::now()),
            cache: catalogue
                .steam_entries()
                .map(SteamCacheRecord::from_entry)
                .collect(),
        };

        if let Some(parent) = self.path.parent() {
            if !parent.exists() {
                fs::create_dir_all(parent)?;
            }
        }

        let json_str = serde_json::to_string_pretty(&file).context("Failed to serialize Steam cache")?;
        fs::write(&self.path, json_str)
            .with_context(|| format!("Failed to write Steam cache: {}", self.path.display()))?;

        info!(
            "Cached {} Steam entries for {}",
            file.cache.len(),
            location
        );
        Ok(())
    }

    /// Bring the catalogue in line with the cache at start-up.
    ///
    /// When the cache was written for `location`, cached entries missing from
    /// the catalogue are added back. Otherwise the cache is rebuilt from the
    /// catalogue. Returns the number of entries restored.
    pub fn restore_into(&self, catalogue: &mut Catalogue, location: &str) -> usize {
        let cached = self
            .load()
            .filter(|file| file.steam_location == location);

        let Some(file) = cached else {
            info!("Rebuilding Steam cache for {}", location);
            if let Err(e) = self.save(location, catalogue) {
                error!("{:#}", e);
            }
            return 0;
        };

        let mut restored = 0;
        for record in &file.cache {
            let Some(entry) = record.to_entry() else {
                warn!("Ignoring incomplete Steam cache record: {:?}", record);
                continue;
            };

            if catalogue.contains(&entry.title) {
                continue;
            }

            debug!("Restoring {} from Steam cache", entry.title);
            if catalogue.add(entry).is_ok() {
                restored += 1;
            }
        }

        if restored > 0 {
            info!("Restored {} Steam entries from cache", restored);
        }
        restored
    }
}
