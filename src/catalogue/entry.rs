use serde::{Deserialize, Serialize};

use crate::metadata::SearchCandidate;
use crate::steam::InstalledTitle;

/// A game in the catalogue
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CatalogueEntry {
    /// Title, unique within the catalogue
    pub title: String,
    /// Game summary
    #[serde(default)]
    pub description: Option<String>,
    /// Command that starts the game
    #[serde(rename = "executionCommand", default)]
    pub launch_command: String,
    /// Small cover image URL
    #[serde(rename = "thumbCoverImageURL", default)]
    pub thumbnail_url: String,
    /// Full size cover image URL
    #[serde(rename = "coverImageURL", default)]
    pub cover_url: String,
    /// Name shown on the dashboard
    #[serde(default)]
    pub nickname: String,
    /// Steam app id when the entry was imported from Steam
    #[serde(default, with = "app_id_sentinel")]
    pub steam_app_id: Option<u32>,
}

impl CatalogueEntry {
    /// Entry added by hand
    pub fn manual(title: impl Into<String>, launch_command: impl Into<String>) -> Self {
        let title = title.into();
        Self {
            nickname: title.clone(),
            title,
            description: None,
            launch_command: launch_command.into(),
            thumbnail_url: String::new(),
            cover_url: String::new(),
            steam_app_id: None,
        }
    }

    /// Entry for an installed Steam title matched to a search result
    pub fn from_steam(title: &InstalledTitle, candidate: &SearchCandidate) -> Self {
        Self {
            title: title.raw_name.clone(),
            description: candidate.description.clone(),
            launch_command: title.launch_command.clone(),
            thumbnail_url: candidate.thumbnail_url.clone().unwrap_or_default(),
            cover_url: candidate.cover_url.clone().unwrap_or_default(),
            nickname: title.raw_name.clone(),
            steam_app_id: Some(title.app_id),
        }
    }

    /// Whether the entry was imported from Steam
    pub fn is_steam(&self) -> bool {
        self.steam_app_id.is_some()
    }
}

/// Stores `None` as `-1`, the on-disk marker for "not a Steam title"
mod app_id_sentinel {
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &Option<u32>, serializer: S) -> Result<S::Ok, S::Error> {
        match value {
            Some(id) => serializer.serialize_i64(i64::from(*id)),
            None => serializer.serialize_i64(-1),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<u32>, D::Error> {
        let raw = i64::deserialize(deserializer)?;
        Ok(u32::try_from(raw).ok())
    }
}
