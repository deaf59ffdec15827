use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::app::domain::history::DEFAULT_HISTORY_LIMIT;
use crate::app::infrastructure::error::AppError;

pub const SERVER_URL_ENV: &str = "QUILLPAD_SERVER_URL";

/// Client configuration, read once at startup.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClientConfig {
    #[serde(default = "default_server_url")]
    pub server_url: String,

    #[serde(default = "default_preview_delay_ms")]
    pub preview_delay_ms: u64,

    /// Hard limit for a generate round-trip.
    #[serde(default = "default_generate_timeout_secs")]
    pub generate_timeout_secs: u64,

    /// Timeout for preview and auto-structure requests.
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,

    #[serde(default = "default_history_limit")]
    pub history_limit: usize,

    #[serde(default)]
    pub download_dir: Option<PathBuf>,
}

fn default_server_url() -> String {
    "http://127.0.0.1:5000".to_string()
}

fn default_preview_delay_ms() -> u64 {
    300
}

fn default_generate_timeout_secs() -> u64 {
    90
}

fn default_request_timeout_secs() -> u64 {
    15
}

fn default_history_limit() -> usize {
    DEFAULT_HISTORY_LIMIT
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            server_url: default_server_url(),
            preview_delay_ms: default_preview_delay_ms(),
            generate_timeout_secs: default_generate_timeout_secs(),
            request_timeout_secs: default_request_timeout_secs(),
            history_limit: default_history_limit(),
            download_dir: None,
        }
    }
}

impl ClientConfig {
    /// Load from the config directory, falling back to defaults, then apply
    /// the environment override for the server URL.
    pub fn load() -> Self {
        let mut config = Self::load_from(&Self::get_config_path());
        if let Ok(url) = std::env::var(SERVER_URL_ENV) {
            if !url.trim().is_empty() {
                config.server_url = url.trim().to_string();
            }
        }
        config
    }

    /// Read `path`. A missing file is created with the defaults so there is
    /// something to edit next time; a corrupt one is left untouched.
    pub fn load_from(path: &Path) -> Self {
        match fs::read_to_string(path) {
            Ok(contents) => match serde_json::from_str(&contents) {
                Ok(config) => config,
                Err(e) => {
                    log::warn!("Failed to parse config: {}. Using defaults.", e);
                    Self::default()
                }
            },
            Err(_) => {
                let default = Self::default();
                if let Err(e) = default.save_to(path) {
                    log::debug!("could not write default config: {}", e);
                }
                default
            }
        }
    }

    pub fn save_to(&self, path: &Path) -> Result<(), AppError> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json)?;
        Ok(())
    }

    pub fn preview_delay(&self) -> Duration {
        Duration::from_millis(self.preview_delay_ms)
    }

    pub fn generate_timeout(&self) -> Duration {
        Duration::from_secs(self.generate_timeout_secs)
    }

    /// Where downloads and exports are written.
    pub fn download_dir(&self) -> PathBuf {
        self.download_dir
            .clone()
            .or_else(dirs::download_dir)
            .unwrap_or_else(|| PathBuf::from("."))
    }

    /// Directory holding config.json and the durable session keys.
    pub fn data_dir() -> PathBuf {
        let mut path = dirs::config_dir().unwrap_or_else(|| PathBuf::from("."));
        path.push("quillpad");
        path
    }

    pub fn get_config_path() -> PathBuf {
        Self::data_dir().join("config.json")
    }
}
