//! Shared fixtures for the integration tests

#![allow(dead_code)]

use game_dashboard::metadata::{SearchCandidate, SearchOptions, SearchService};
use std::collections::HashMap;
use std::fs;
use std::future::Future;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tempfile::TempDir;

/// Search service answering from a fixed table of queries
#[derive(Default)]
pub struct ScriptedSearch {
    results: HashMap<String, Vec<SearchCandidate>>,
    queries: Mutex<Vec<String>>,
}

impl ScriptedSearch {
    /// Answer `query` with one candidate per name
    pub fn with(mut self, query: &str, names: &[&str]) -> Self {
        let candidates = names.iter().map(|name| candidate(name)).collect();
        self.results.insert(query.to_string(), candidates);
        self
    }

    /// Queries received so far, in order
    pub fn queries(&self) -> Vec<String> {
        self.queries.lock().map(|q| q.clone()).unwrap_or_default()
    }
}

impl SearchService for ScriptedSearch {
    fn search(
        &self,
        query: &str,
        _options: SearchOptions,
    ) -> impl Future<Output = Vec<SearchCandidate>> + Send {
        if let Ok(mut queries) = self.queries.lock() {
            queries.push(query.to_string());
        }
        let result = self.results.get(query).cloned().unwrap_or_default();
        async move { result }
    }
}

pub fn candidate(name: &str) -> SearchCandidate {
    SearchCandidate {
        name: Some(name.to_string()),
        thumbnail_url: Some(format!("https://images.example/t_thumb/{}.jpg", name)),
        cover_url: Some(format!("https://images.example/t_cover_big/{}.jpg", name)),
        description: Some(format!("About {}", name)),
    }
}

/// A Steam install on disk with any number of library folders
pub struct SteamLayout {
    pub dir: TempDir,
    libraries: Vec<(PathBuf, Vec<u32>)>,
}

impl SteamLayout {
    /// Steam install with the executable and an empty `steamapps`
    pub fn new() -> Self {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("steam.exe"), b"").unwrap();
        fs::create_dir_all(dir.path().join("steamapps")).unwrap();

        let layout = Self {
            dir,
            libraries: Vec::new(),
        };
        layout.write_library_folders();
        layout
    }

    /// Install root, as typed by the user
    pub fn location(&self) -> String {
        self.dir.path().display().to_string()
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    /// Add a library folder listing `app_ids`, returning its path
    pub fn add_library(&mut self, name: &str, app_ids: &[u32]) -> PathBuf {
        let library = self.dir.path().join(name);
        fs::create_dir_all(library.join("steamapps")).unwrap();
        self.libraries.push((library.clone(), app_ids.to_vec()));
        self.write_library_folders();
        library
    }

    /// Write `appmanifest_<app_id>.acf` into `library`
    pub fn add_manifest(&self, library: &Path, app_id: u32, name: &str, launcher: &str) {
        let content = format!(
            "\"AppState\"\n{{\n\t\"appid\"\t\t\"{}\"\n\t\"LauncherPath\"\t\t\"{}\"\n\t\"name\"\t\t\"{}\"\n}}\n",
            app_id,
            escape(launcher),
            escape(name)
        );
        fs::write(manifest_path(library, app_id), content).unwrap();
    }

    /// Replace the library folders descriptor with `content`
    pub fn overwrite_library_folders(&self, content: &str) {
        fs::write(self.library_folders_path(), content).unwrap();
    }

    pub fn library_folders_path(&self) -> PathBuf {
        self.dir.path().join("steamapps").join("libraryfolders.vdf")
    }

    fn write_library_folders(&self) {
        let mut content = String::from("\"libraryfolders\"\n{\n");
        for (index, (path, app_ids)) in self.libraries.iter().enumerate() {
            content.push_str(&format!("\t\"{}\"\n\t{{\n", index));
            content.push_str(&format!(
                "\t\t\"path\"\t\t\"{}\"\n",
                escape(&path.display().to_string())
            ));
            content.push_str("\t\t\"apps\"\n\t\t{\n");
            for app_id in app_ids {
                content.push_str(&format!("\t\t\t\"{}\"\t\t\"1024\"\n", app_id));
            }
            content.push_str("\t\t}\n\t}\n");
        }
        content.push_str("}\n");
        fs::write(self.library_folders_path(), content).unwrap();
    }
}

pub fn manifest_path(library: &Path, app_id: u32) -> PathBuf {
    library
        .join("steamapps")
        .join(format!("appmanifest_{}.acf", app_id))
}

fn escape(text: &str) -> String {
    text.replace('\\', "\\\\").replace('"', "\\\"")
}
