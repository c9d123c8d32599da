//! Steam installation discovery.
//!
//! Reads `steamapps/libraryfolders.vdf` to find every library folder and the
//! app ids installed in it, then reads each title's `appmanifest_<id>.acf`.

pub mod cache;
pub mod library;
pub mod location;
pub mod manifest;

use std::path::PathBuf;
use thiserror::Error;

use crate::vdf::VdfError;

pub use cache::{SteamCache, SteamCacheRecord};
pub use library::{build_library_map, try_build_library_map, LibraryFolder, LibraryMap};
pub use location::{validate_location, LocationProblem};
pub use manifest::{find_manifests, read_manifest, read_manifests, InstalledTitle};

/// Directory under a Steam install or library folder holding the VDF files
pub const STEAMAPPS_DIR: &str = "steamapps";

/// Library folders descriptor, inside [`STEAMAPPS_DIR`] of the Steam install
pub const LIBRARY_FOLDERS_FILE: &str = "libraryfolders.vdf";

/// Errors reading Steam files
#[derive(Debug, Error)]
pub enum SteamError {
    #[error("failed to read {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed VDF in {}: {source}", .path.display())]
    Format {
        path: PathBuf,
        #[source]
        source: VdfError,
    },

    #[error("{} has no \"{field}\" field", .path.display())]
    MissingField { path: PathBuf, field: &'static str },

    #[error("{} has an invalid \"{field}\" value: {value:?}", .path.display())]
    InvalidField {
        path: PathBuf,
        field: &'static str,
        value: String,
    },
}
