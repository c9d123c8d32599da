use log::{debug, error, info};
use std::fs;
use std::path::{Path, PathBuf};

use super::{LibraryMap, SteamError, STEAMAPPS_DIR};
use crate::vdf;

/// A title found in an app manifest
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstalledTitle {
    /// Display name from the manifest, trimmed
    pub raw_name: String,
    /// `<LauncherPath> -applaunch <appid>`
    pub launch_command: String,
    /// Steam app id
    pub app_id: u32,
}

/// Path of the manifest for `app_id` inside a library folder
pub fn manifest_path(library: &Path, app_id: u32) -> PathBuf {
    library
        .join(STEAMAPPS_DIR)
        .join(format!("appmanifest_{}.acf", app_id))
}

/// Manifests that exist on disk for every (library, app id) pair
pub fn find_manifests(library_map: &LibraryMap) -> Vec<PathBuf> {
    let mut manifests = Vec::new();

    for (library, app_ids) in library_map {
        for &app_id in app_ids {
            let path = manifest_path(library, app_id);
            if path.exists() {
                manifests.push(path);
            } else {
                debug!("No manifest for app {} in {}", app_id, library.display());
            }
        }
    }

    info!("Found {} app manifest(s)", manifests.len());
    manifests
}

/// Read and parse one app manifest
pub fn read_manifest(path: &Path) -> Result<InstalledTitle, SteamError> {
    let content = fs::read(path).map_err(|source| SteamError::Io {
        path: path.to_path_buf(),
        source,
    })?;

    parse_manifest(&String::from_utf8_lossy(&content), path)
}

/// Read every manifest, logging and skipping the ones that fail
pub fn read_manifests(paths: &[PathBuf]) -> Vec<InstalledTitle> {
    paths
        .iter()
        .filter_map(|path| match read_manifest(path) {
            Ok(title) => Some(title),
            Err(e) => {
                error!("Skipping app manifest: {}", e);
                None
            }
        })
        .collect()
}

/// Parse the contents of an app manifest.
///
/// `path` is only used for error messages.
pub fn parse_manifest(content: &str, path: &Path) -> Result<InstalledTitle, SteamError> {
    let root = vdf::parse(content).map_err(|source| SteamError::Format {
        path: path.to_path_buf(),
        source,
    })?;

    let missing = |field| SteamError::MissingField {
        path: path.to_path_buf(),
        field,
    };

    let app_state = root
        .get("AppState")
        .filter(|state| state.as_object().is_some())
        .ok_or_else(|| missing("AppState"))?;

    let name = app_state.get_str("name").ok_or_else(|| missing("name"))?;
    let launcher = app_state
        .get_str("LauncherPath")
        .ok_or_else(|| missing("LauncherPath"))?;
    let app_id_text = app_state.get_str("appid").ok_or_else(|| missing("appid"))?;

    let app_id = app_id_text
        .trim()
        .parse::<u32>()
        .map_err(|_| SteamError::InvalidField {
            path: path.to_path_buf(),
            field: "appid",
            value: app_id_text.to_string(),
        })?;

    Ok(InstalledTitle {
        raw_name: name.trim().to_string(),
        launch_command: format!("{} -applaunch {}", launcher, app_id),
        app_id,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeSet;
    use tempfile::TempDir;

    const PORTAL: &str = r#"
"AppState"
{
	"appid"		"400"
	"universe"		"1"
	"LauncherPath"		"C:\\Program Files (x86)\\Steam\\steam.exe"
	"name"		"  Portal  "
	"StateFlags"		"4"
	"installdir"		"Portal"
}
"#;

    #[test]
    fn test_parse_manifest() {
        let title = parse_manifest(PORTAL, Path::new("appmanifest_400.acf")).unwrap();

        assert_eq!(title.raw_name, "Portal");
        assert_eq!(title.app_id, 400);
        assert_eq!(
            title.launch_command,
            r"C:\Program Files (x86)\Steam\steam.exe -applaunch 400"
        );
    }

    #[test]
    fn test_missing_fields() {
        let content = r#""AppState" { "appid" "1" "name" "x" }"#;
        let err = parse_manifest(content, Path::new("m")).unwrap_err();
        assert!(matches!(err, SteamError::MissingField { field: "LauncherPath", .. }));

        let err = parse_manifest(r#""Other" {}"#, Path::new("m")).unwrap_err();
        assert!(matches!(err, SteamError::MissingField { field: "AppState", .. }));

        let err = parse_manifest(r#""AppState" "flat""#, Path::new("m")).unwrap_err();
        assert!(matches!(err, SteamError::MissingField { field: "AppState", .. }));
    }

    #[test]
    fn test_invalid_app_id() {
        let content = r#""AppState" { "appid" "abc" "name" "x" "LauncherPath" "steam" }"#;
        let err = parse_manifest(content, Path::new("m")).unwrap_err();
        assert!(matches!(err, SteamError::InvalidField { field: "appid", .. }));
    }

    #[test]
    fn test_find_manifests_only_keeps_existing_files() {
        let dir = TempDir::new().unwrap();
        fs::create_dir(dir.path().join(STEAMAPPS_DIR)).unwrap();
        fs::write(manifest_path(dir.path(), 10), PORTAL).unwrap();

        let mut map = LibraryMap::new();
        map.insert(dir.path().to_path_buf(), BTreeSet::from([10, 20]));
        map.insert(dir.path().join("elsewhere"), BTreeSet::from([30]));

        assert_eq!(find_manifests(&map), vec![manifest_path(dir.path(), 10)]);
    }

    #[test]
    fn test_read_manifests_skips_failures() {
        let dir = TempDir::new().unwrap();
        let good = dir.path().join("good.acf");
        let broken = dir.path().join("broken.acf");
        let missing = dir.path().join("missing.acf");
        fs::write(&good, PORTAL).unwrap();
        fs::write(&broken, "\"AppState\" { \"name\" ").unwrap();

        let titles = read_manifests(&[broken, missing, good]);

        assert_eq!(titles.len(), 1);
        assert_eq!(titles[0].app_id, 400);
    }
}
