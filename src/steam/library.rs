use log::{error, info, warn};
use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::path::{Path, PathBuf};

use super::{SteamError, LIBRARY_FOLDERS_FILE, STEAMAPPS_DIR};
use crate::vdf::{self, ParsedValue};

/// Library folder path to the app ids installed in it
pub type LibraryMap = BTreeMap<PathBuf, BTreeSet<u32>>;

/// One entry of `libraryfolders.vdf`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LibraryFolder {
    /// Root of the library (its `steamapps` lives below it)
    pub path: PathBuf,
    /// Installed app ids
    pub app_ids: BTreeSet<u32>,
}

/// Path of the library folders descriptor for a Steam install
pub fn library_folders_path(steam_path: &Path) -> PathBuf {
    steam_path.join(STEAMAPPS_DIR).join(LIBRARY_FOLDERS_FILE)
}

/// Build the library map, logging and returning an empty map on failure
pub fn build_library_map(steam_path: &Path) -> LibraryMap {
    match try_build_library_map(steam_path) {
        Ok(map) => map,
        Err(e) => {
            error!("Failed to read Steam library folders: {}", e);
            LibraryMap::new()
        }
    }
}

/// Build the library map, reporting why the descriptor could not be used
pub fn try_build_library_map(steam_path: &Path) -> Result<LibraryMap, SteamError> {
    let path = library_folders_path(steam_path);

    let content = fs::read(&path).map_err(|source| SteamError::Io {
        path: path.clone(),
        source,
    })?;
    let content = String::from_utf8_lossy(&content);

    let folders = parse_library_folders(&content, &path)?;

    let mut map = LibraryMap::new();
    for folder in folders {
        map.entry(folder.path).or_default().extend(folder.app_ids);
    }

    info!(
        "Found {} Steam library folder(s) with {} app(s)",
        map.len(),
        map.values().map(BTreeSet::len).sum::<usize>()
    );

    Ok(map)
}

/// Parse the contents of a library folders descriptor.
///
/// `path` is only used for error messages.
pub fn parse_library_folders(content: &str, path: &Path) -> Result<Vec<LibraryFolder>, SteamError> {
    let root = vdf::parse(content).map_err(|source| SteamError::Format {
        path: path.to_path_buf(),
        source,
    })?;

    let folders = root.get("libraryfolders").ok_or_else(|| SteamError::MissingField {
        path: path.to_path_buf(),
        field: "libraryfolders",
    })?;

    let mut result = Vec::new();

    // Usually an array after folding; older files mix in scalar entries
    // and stay an object
    for folder in folders.children() {
        if folder.as_object().is_none() {
            continue;
        }

        let Some(folder_path) = folder.get_str("path") else {
            warn!("Skipping library folder without a path in {}", path.display());
            continue;
        };

        result.push(LibraryFolder {
            path: PathBuf::from(folder_path),
            app_ids: folder.get("apps").map(app_ids).unwrap_or_default(),
        });
    }

    Ok(result)
}

/// App ids from the keys of an `apps` object.
///
/// Keys that are not non-negative integers are skipped. An empty `apps`
/// folds to an empty array and yields nothing.
fn app_ids(apps: &ParsedValue) -> BTreeSet<u32> {
    apps.as_object()
        .map(|map| map.keys().filter_map(|key| key.trim().parse::<u32>().ok()).collect())
        .unwrap_or_default()
}
