use anyhow::{Context, Result};
use log::info;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Prefix of environment variables overriding the configuration file,
/// e.g. `GAME_DASHBOARD__STEAM__WORKERS=4`
pub const ENV_PREFIX: &str = "GAME_DASHBOARD";

/// Application configuration
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct Config {
    /// Local paths configuration
    pub paths: PathsConfig,

    /// Metadata search configuration
    pub metadata: MetadataConfig,

    /// Steam integration configuration
    pub steam: SteamConfig,
}

/// Local paths configuration
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct PathsConfig {
    /// Directory for the game catalogue and the Steam entry cache
    pub data_dir: PathBuf,

    /// Directory for caching images
    pub cache_dir: PathBuf,
}

/// Which metadata service answers searches
#[derive(Debug, Clone, Copy, Deserialize, Serialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum MetadataProvider {
    /// Game search proxy with an API key
    #[default]
    Api,
    /// IGDB directly, authenticated through Twitch
    Igdb,
}

/// Metadata search configuration
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct MetadataConfig {
    /// Service used for searches
    pub provider: MetadataProvider,

    /// Base URL of the search proxy
    pub base_url: String,

    /// API key for the search proxy
    pub api_key: String,

    /// IGDB (Twitch) client ID
    pub client_id: String,

    /// IGDB (Twitch) client secret
    pub client_secret: String,

    /// Per-request timeout in seconds
    pub timeout_secs: u64,
}

/// Steam integration configuration
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct SteamConfig {
    /// Steam install directory, empty when not configured
    pub location: String,

    /// Concurrent metadata searches while importing Steam titles
    pub workers: usize,
}

impl Default for Config {
    fn default() -> Self {
        let home_dir = dirs::home_dir().unwrap_or_else(|| PathBuf::from("."));

        Self {
            paths: PathsConfig {
                data_dir: dirs::data_dir()
                    .unwrap_or_else(|| home_dir.join(".local").join("share"))
                    .join("game-dashboard"),
                cache_dir: dirs::cache_dir()
                    .unwrap_or_else(|| home_dir.join(".cache"))
                    .join("game-dashboard"),
            },
            metadata: MetadataConfig {
                provider: MetadataProvider::Api,
                base_url: "https://api.turtywurty.dev/".to_string(),
                api_key: "".to_string(),
                client_id: "".to_string(),
                client_secret: "".to_string(),
                timeout_secs: 15,
            },
            steam: SteamConfig {
                location: "".to_string(),
                workers: 2,
            },
        }
    }
}

impl MetadataConfig {
    /// Per-request timeout
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs.max(1))
    }
}

impl SteamConfig {
    /// Worker pool size, never zero
    pub fn worker_count(&self) -> usize {
        self.workers.max(1)
    }
}

impl Config {
    /// Get the configuration file path
    pub fn config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("game-dashboard")
            .join("config.toml")
    }

    /// Load configuration from the default file
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::config_path())
    }

    /// Load configuration from `path`, layered over the defaults and
    /// overridden by `GAME_DASHBOARD__*` environment variables
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            info!("Configuration file not found at {}, using defaults", path.display());
        }

        let defaults = ::config::Config::try_from(&Config::default())
            .context("Failed to build default configuration")?;

        let settings = ::config::Config::builder()
            .add_source(defaults)
            .add_source(
                ::config::File::from(path)
                    .format(::config::FileFormat::Toml)
                    .required(false),
            )
            .add_source(::config::Environment::with_prefix(ENV_PREFIX).separator("__"))
            .build()
            .with_context(|| format!("Failed to read configuration from {}", path.display()))?;

        let config: Config = settings
            .try_deserialize()
            .context("Invalid configuration")?;

        info!("Configuration loaded from {}", path.display());
        Ok(config)
    }

    /// Save configuration to the default file
    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::config_path())
    }

    /// Save configuration to `path`
    pub fn save_to(&self, path: &Path) -> Result<()> {
        // Create parent directory if it doesn't exist
        if let Some(parent) = path.parent() {
            if !parent.exists() {
                fs::create_dir_all(parent)?;
            }
        }

        let config_str = toml::to_string(self).context("Failed to serialize configuration")?;
        fs::write(path, config_str)
            .with_context(|| format!("Failed to write configuration to {}", path.display()))?;

        info!("Configuration saved to {}", path.display());
        Ok(())
    }

    /// Ensure all configured directories exist
    pub fn ensure_directories(&self) -> Result<()> {
        for dir in [&self.paths.data_dir, &self.paths.cache_dir] {
            if !dir.exists() {
                info!("Creating directory: {}", dir.display());
                fs::create_dir_all(dir)
                    .with_context(|| format!("Failed to create {}", dir.display()))?;
            }
        }

        Ok(())
    }

    /// Path of the persisted game catalogue
    pub fn catalogue_path(&self) -> PathBuf {
        self.paths.data_dir.join("games.json")
    }

    /// Path of the Steam entry cache
    pub fn steam_cache_path(&self) -> PathBuf {
        self.paths.data_dir.join("steam_cache.json")
    }
}
