use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;

const APP_NAME: &str = "dsff";
const CONFIG_FILE: &str = "config.json";

/// Application configuration stored in the app data directory
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AppConfig {
    /// Location of the corpus (gzipped or plain JSON array of entries)
    #[serde(default = "default_data_path")]
    pub data_path: PathBuf,

    /// Number of entries per search results page
    #[serde(default = "default_page_size")]
    pub page_size: usize,

    /// Capacity of the daemon's ranked-results cache
    #[serde(default = "default_cache_size")]
    pub cache_size: usize,
}

fn default_data_path() -> PathBuf {
    PathBuf::from("data.json.gz")
}

fn default_page_size() -> usize {
    10
}

fn default_cache_size() -> usize {
    128
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            data_path: default_data_path(),
            page_size: default_page_size(),
            cache_size: default_cache_size(),
        }
    }
}

impl AppConfig {
    /// Load config from the app data directory, or return default if not found
    pub fn load() -> Result<Self> {
        let config_path = get_config_path()?;

        if config_path.exists() {
            let content = fs::read_to_string(&config_path)
                .context("Failed to read config file")?;
            Self::from_json(&content)
        } else {
            Ok(Self::default())
        }
    }

    /// Parse a config document, filling missing fields with defaults
    pub fn from_json(content: &str) -> Result<Self> {
        let config: AppConfig = serde_json::from_str(content)
            .context("Failed to parse config file")?;
        Ok(config)
    }

    /// Save config to the app data directory
    pub fn save(&self) -> Result<()> {
        let config_path = get_config_path()?;
        let content = serde_json::to_string_pretty(self)
            .context("Failed to serialize config")?;
        fs::write(&config_path, content)
            .context("Failed to write config file")?;
        Ok(())
    }

    /// Page size with a floor of one entry per page
    pub fn effective_page_size(&self) -> usize {
        self.page_size.max(1)
    }

    /// Cache capacity with a floor of one slot
    pub fn effective_cache_size(&self) -> usize {
        self.cache_size.max(1)
    }
}

/// Get the path to the config file
pub fn get_config_path() -> Result<PathBuf> {
    let app_dir = get_app_data_dir()?;
    Ok(app_dir.join(CONFIG_FILE))
}

/// Get the application data directory
pub fn get_app_data_dir() -> Result<PathBuf> {
    let base = if cfg!(target_os = "macos") {
        dirs::home_dir()
            .map(|h| h.join("Library").join("Application Support"))
    } else if cfg!(target_os = "windows") {
        dirs::data_local_dir()
    } else {
        // Linux/Unix: use XDG_DATA_HOME or ~/.local/share
        dirs::data_dir()
    };

    let base = base.context("Could not determine app data directory")?;
    let app_dir = base.join(APP_NAME);

    fs::create_dir_all(&app_dir)?;
    Ok(app_dir)
}
