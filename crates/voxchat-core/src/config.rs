use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::error::{Result, VoxchatError};

/// Top-level configuration for voxchat.
///
/// Loaded from `~/.voxchat/config.toml` by default. Missing sections and
/// fields fall back to their defaults.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct VoxchatConfig {
    #[serde(default)]
    pub general: GeneralConfig,
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub alarm: AlarmConfig,
    #[serde(default)]
    pub notes: NotesConfig,
}

impl VoxchatConfig {
    /// Load configuration from a TOML file.
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: VoxchatConfig = toml::from_str(&content)?;
        info!("Configuration loaded from {}", path.display());
        Ok(config)
    }

    /// Load configuration from a TOML file, falling back to defaults if the
    /// file does not exist or cannot be parsed.
    pub fn load_or_default(path: &Path) -> Self {
        match Self::load(path) {
            Ok(config) => config,
            Err(e) => {
                warn!(
                    "Failed to load config from {}: {}. Using defaults.",
                    path.display(),
                    e
                );
                Self::default()
            }
        }
    }

    /// Render the configuration as TOML.
    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self).map_err(|e| VoxchatError::Config(e.to_string()))
    }

    /// Save the current configuration to a TOML file.
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, self.to_toml()?)?;
        info!("Configuration saved to {}", path.display());
        Ok(())
    }
}

/// General application settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// Directory holding the notes and alarm registry files.
    pub data_dir: String,
    /// Log level: trace, debug, info, warn, error.
    pub log_level: String,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            data_dir: "~/.voxchat/data".to_string(),
            log_level: "info".to_string(),
        }
    }
}

/// Assistant backend location.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Path of the form-POST endpoint that answers with `{"response": ...}`.
    pub path: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "10.64.195.116".to_string(),
            port: 5000,
            path: "/receive".to_string(),
        }
    }
}

impl ServerConfig {
    /// Full URL of the assistant endpoint.
    pub fn endpoint_url(&self) -> String {
        let path = if self.path.starts_with('/') {
            self.path.clone()
        } else {
            format!("/{}", self.path)
        };
        format!("http://{}:{}{}", self.host, self.port, path)
    }
}

/// Alarm scheduling settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AlarmConfig {
    /// How far in the past a requested alarm may be and still be scheduled.
    pub past_tolerance_secs: u64,
    /// Registry file name, relative to `general.data_dir`.
    pub alarms_file: String,
    /// How often `watch` re-reads the registry for alarms added elsewhere.
    pub watch_recheck_secs: u64,
}

impl Default for AlarmConfig {
    fn default() -> Self {
        Self {
            past_tolerance_secs: 60,
            alarms_file: "alarms.json".to_string(),
            watch_recheck_secs: 5,
        }
    }
}

/// Note storage settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NotesConfig {
    /// Notes file name, relative to `general.data_dir`.
    pub notes_file: String,
}

impl Default for NotesConfig {
    fn default() -> Self {
        Self {
            notes_file: "notes.json".to_string(),
        }
    }
}
