use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

pub const DEFAULT_EXPORT_URL: &str = "http://localhost:4000/api/export/pdf";
pub const DEFAULT_EXPORT_TIMEOUT_SECS: u64 = 60;
const DEFAULT_AUTOSAVE_PATH: &str = "~/.local/share/cvforge/autosave.json";
const DEFAULT_LOG_FILE: &str = "~/.cache/cvforge/cvforge.log";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file at {config_path}: {source}")]
    ConfigReadError {
        config_path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to parse config file at {config_path}: {source}")]
    ConfigParseError {
        config_path: PathBuf,
        source: toml::de::Error,
    },
}

/// User settings from `~/.config/cvforge/config.toml`. Every key is optional.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub export_url: String,
    pub export_timeout_secs: u64,
    /// Empty disables autosave
    pub autosave_path: PathBuf,
    pub log_file: PathBuf,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub editor: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            export_url: DEFAULT_EXPORT_URL.to_string(),
            export_timeout_secs: DEFAULT_EXPORT_TIMEOUT_SECS,
            autosave_path: Self::expand_path(Path::new(DEFAULT_AUTOSAVE_PATH))
                .unwrap_or_else(|| PathBuf::from(DEFAULT_AUTOSAVE_PATH)),
            log_file: Self::expand_path(Path::new(DEFAULT_LOG_FILE))
                .unwrap_or_else(|| PathBuf::from(DEFAULT_LOG_FILE)),
            editor: None,
        }
    }
}

impl Config {
    pub fn load_from_path<P: AsRef<Path>>(config_path: P) -> Result<Option<Self>, ConfigError> {
        let config_path = config_path.as_ref();
        if !config_path.exists() {
            return Ok(None);
        }

        let content = std::fs::read_to_string(config_path).map_err(|source| {
            ConfigError::ConfigReadError {
                config_path: config_path.to_path_buf(),
                source,
            }
        })?;

        let mut config: Config =
            toml::from_str(&content).map_err(|source| ConfigError::ConfigParseError {
                config_path: config_path.to_path_buf(),
                source,
            })?;

        // Expand shell variables and tilde in the loaded paths
        config.autosave_path =
            Self::expand_path(&config.autosave_path).unwrap_or(config.autosave_path);
        config.log_file = Self::expand_path(&config.log_file).unwrap_or(config.log_file);

        Ok(Some(config))
    }

    pub fn load() -> Result<Option<Self>, ConfigError> {
        let config_path = Self::config_path();
        Self::load_from_path(&config_path)
    }

    /// The user's config, or defaults when there is no config file
    pub fn load_or_default() -> Result<Self, ConfigError> {
        Ok(Self::load()?.unwrap_or_default())
    }

    pub fn save_to_path<P: AsRef<Path>>(&self, config_path: P) -> anyhow::Result<()> {
        let config_path = config_path.as_ref();
        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)?;
        std::fs::write(config_path, content)?;
        Ok(())
    }

    pub fn config_path() -> PathBuf {
        let config_dir = shellexpand::tilde("~/.config/cvforge");
        PathBuf::from(config_dir.as_ref()).join("config.toml")
    }

    pub fn export_timeout(&self) -> Duration {
        Duration::from_secs(self.export_timeout_secs)
    }

    pub fn autosave_path(&self) -> Option<&Path> {
        if self.autosave_path.as_os_str().is_empty() {
            None
        } else {
            Some(&self.autosave_path)
        }
    }

    /// Command used to edit section text: the configured editor, `$EDITOR`, or `vi`
    pub fn editor_command(&self) -> String {
        self.editor
            .clone()
            .or_else(|| std::env::var("EDITOR").ok().filter(|editor| !editor.is_empty()))
            .unwrap_or_else(|| "vi".to_string())
    }

    fn expand_path(path: &Path) -> Option<PathBuf> {
        let path_str = path.to_string_lossy();
        match shellexpand::full(&path_str) {
            Ok(expanded) => Some(PathBuf::from(expanded.as_ref())),
            Err(_) => None,
        }
    }
}
