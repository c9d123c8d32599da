use log::{debug, info};
use std::path::{Path, PathBuf};
use thiserror::Error;

use super::{LIBRARY_FOLDERS_FILE, STEAMAPPS_DIR};

/// Files whose presence marks a directory as a Steam install
pub const STEAM_EXECUTABLES: &[&str] = &["steam.exe", "steam.sh"];

/// Why a proposed Steam location was rejected
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LocationProblem {
    #[error("no Steam location given")]
    Empty,

    #[error("{0} does not exist")]
    Missing(String),

    #[error("{0} does not contain a Steam executable")]
    NoExecutable(String),

    #[error("{0} has no steamapps directory")]
    NoSteamApps(String),

    #[error("{0} has no steamapps/libraryfolders.vdf")]
    NoLibraryFolders(String),

    #[error("no installed titles found under {0}")]
    NoInstalledTitles(String),
}

/// Check that `location` looks like a Steam install we can scan
pub fn validate_location(location: &str) -> Result<PathBuf, LocationProblem> {
    let location = location.trim();
    if location.is_empty() {
        return Err(LocationProblem::Empty);
    }

    let steam_path = PathBuf::from(location);
    let owned = || location.to_string();

    if !steam_path.exists() {
        return Err(LocationProblem::Missing(owned()));
    }

    if !has_steam_executable(&steam_path) {
        return Err(LocationProblem::NoExecutable(owned()));
    }

    let steamapps = steam_path.join(STEAMAPPS_DIR);
    if !steamapps.is_dir() {
        return Err(LocationProblem::NoSteamApps(owned()));
    }

    if !steamapps.join(LIBRARY_FOLDERS_FILE).is_file() {
        return Err(LocationProblem::NoLibraryFolders(owned()));
    }

    info!("Steam location {} looks valid", steam_path.display());
    Ok(steam_path)
}

fn has_steam_executable(steam_path: &Path) -> bool {
    STEAM_EXECUTABLES.iter().any(|name| {
        let found = steam_path.join(name).is_file();
        if found {
            debug!("Found {} in {}", name, steam_path.display());
        }
        found
    })
}
