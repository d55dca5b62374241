use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Main configuration structure
///
/// Loaded from a TOML file, with CLI flags layered on top by the binary.
/// Priority: CLI > File > Defaults.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub lookup: LookupConfig,
    #[serde(default)]
    pub store: StoreConfig,
    #[serde(default)]
    pub user: UserConfig,
}

impl Config {
    /// Load config from the default location, falling back to defaults when
    /// no file exists yet.
    pub fn load() -> crate::Result<Self> {
        let config_path = Self::config_path()?;

        if config_path.exists() {
            let contents = std::fs::read_to_string(&config_path)?;
            let config: Config = toml::from_str(&contents)
                .map_err(|e| crate::Error::Config(format!("Failed to parse config: {}", e)))?;
            Ok(config)
        } else {
            Ok(Self::default())
        }
    }

    /// Save config to disk
    pub fn save(&self) -> crate::Result<()> {
        let config_path = Self::config_path()?;

        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let contents = toml::to_string_pretty(self)
            .map_err(|e| crate::Error::Config(format!("Failed to serialize config: {}", e)))?;

        std::fs::write(&config_path, contents)?;
        Ok(())
    }

    /// Config file path: XDG config dir on Linux/macOS, AppData on Windows.
    fn config_path() -> crate::Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| crate::Error::Config("Could not find config directory".into()))?
            .join("larder");

        Ok(config_dir.join("config.toml"))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LookupConfig {
    /// Base URL of the food database API. Point this at a mirror if the
    /// public instance is slow from where you are.
    #[serde(default = "default_api_url")]
    pub api_url: String,
}

fn default_api_url() -> String {
    "https://world.openfoodfacts.org".to_string()
}

impl Default for LookupConfig {
    fn default() -> Self {
        Self {
            api_url: default_api_url(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct StoreConfig {
    /// Where the inventory database lives. Defaults to the platform data
    /// dir when unset.
    #[serde(default)]
    pub db_path: Option<PathBuf>,
}

impl StoreConfig {
    /// The database path to open, resolving the platform default.
    pub fn resolved_db_path(&self) -> crate::Result<PathBuf> {
        if let Some(path) = &self.db_path {
            return Ok(path.clone());
        }

        let data_dir = dirs::data_dir()
            .ok_or_else(|| crate::Error::Config("Could not find data directory".into()))?
            .join("larder");

        Ok(data_dir.join("inventory.db"))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct UserConfig {
    /// Default owner for saves and views when --user is not given.
    #[serde(default)]
    pub name: Option<String>,
}
