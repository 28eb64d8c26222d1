//! Application configuration management.
//!
//! Settings live in `config.toml` under the user's config directory
//! (typically ~/.config/cyclefeed/). The file is optional; missing keys fall
//! back to defaults that reproduce a plain run: every directory entry is a
//! token, nothing is filtered, and the first failing action stops the run.
//! Command-line flags override whatever is stored here.

use crate::constants::{AUDIO_EXTENSIONS, CONFIG_DIR_NAME, DEFAULT_LOG_FILE};
use crate::error::ConfigError;
use crate::scheduler::FailurePolicy;
use crate::utils::scan::ScanOptions;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;

/// Keys accepted by `config set`.
pub const SETTABLE_KEYS: &[&str] = &[
    "audio_only",
    "skip_hidden",
    "recursive",
    "keep_going",
    "volume",
    "log_file",
    "audio_extensions",
];

/// A source stored in the config file, used when no `--source` is given.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceEntry {
    pub path: String,
    pub cycle: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct Config {
    #[serde(default = "default_audio_extensions")]
    pub audio_extensions: Vec<String>,
    #[serde(default)]
    pub audio_only: bool,
    #[serde(default)]
    pub skip_hidden: bool,
    #[serde(default)]
    pub recursive: bool,
    #[serde(default)]
    pub keep_going: bool,
    #[serde(default = "default_volume")]
    pub volume: f32,
    #[serde(default)]
    pub log_file: String,
    #[serde(default)]
    pub sources: Vec<SourceEntry>,
}

fn default_audio_extensions() -> Vec<String> {
    AUDIO_EXTENSIONS.iter().map(|e| e.to_string()).collect()
}

fn default_volume() -> f32 {
    1.0
}

fn parse_bool(key: &str, value: &str) -> Result<bool, ConfigError> {
    value.parse::<bool>().map_err(|_| ConfigError::InvalidValue {
        key: key.to_string(),
        value: value.to_string(),
        expected: "value must be 'true' or 'false'",
    })
}

impl Default for Config {
    fn default() -> Self {
        Self::new()
    }
}

impl Config {
    pub fn new() -> Self {
        Self {
            audio_extensions: default_audio_extensions(),
            audio_only: false,
            skip_hidden: false,
            recursive: false,
            keep_going: false,
            volume: default_volume(),
            log_file: String::new(),
            sources: Vec::new(),
        }
    }

    pub fn config_dir() -> Result<PathBuf, ConfigError> {
        // Check for XDG_CONFIG_HOME first (useful for testing)
        let config_dir = if let Ok(xdg_config) = std::env::var("XDG_CONFIG_HOME") {
            PathBuf::from(xdg_config).join(CONFIG_DIR_NAME)
        } else {
            dirs::config_dir()
                .ok_or(ConfigError::NoConfigDir)?
                .join(CONFIG_DIR_NAME)
        };
        Ok(config_dir)
    }

    pub fn config_path() -> Result<PathBuf, ConfigError> {
        Ok(Self::config_dir()?.join("config.toml"))
    }

    pub fn load() -> Result<Self, ConfigError> {
        let config_path = Self::config_path()?;

        if !config_path.exists() {
            return Ok(Default::default());
        }

        let contents = fs::read_to_string(&config_path)?;
        let config: Config = toml::from_str(&contents)?;
        Ok(config)
    }

    pub fn save(&self) -> Result<(), ConfigError> {
        let config_dir = Self::config_dir()?;

        if !config_dir.exists() {
            fs::create_dir_all(&config_dir)?;
        }

        let config_path = Self::config_path()?;
        let toml_string = toml::to_string_pretty(self)?;
        fs::write(&config_path, toml_string)?;

        Ok(())
    }

    pub fn exists() -> Result<bool, ConfigError> {
        Ok(Self::config_path()?.exists())
    }

    pub fn set_value(&mut self, key: &str, value: &str) -> Result<(), ConfigError> {
        match key {
            "audio_only" => self.audio_only = parse_bool(key, value)?,
            "skip_hidden" => self.skip_hidden = parse_bool(key, value)?,
            "recursive" => self.recursive = parse_bool(key, value)?,
            "keep_going" => self.keep_going = parse_bool(key, value)?,
            "volume" => {
                self.volume = value
                    .parse::<f32>()
                    .ok()
                    .filter(|v| v.is_finite() && *v >= 0.0)
                    .ok_or_else(|| ConfigError::InvalidValue {
                        key: key.to_string(),
                        value: value.to_string(),
                        expected: "a non-negative number",
                    })?;
            }
            "log_file" => self.log_file = value.to_string(),
            "audio_extensions" => {
                let exts: Vec<String> = value
                    .split(',')
                    .map(|e| e.trim().trim_start_matches('.').to_lowercase())
                    .filter(|e| !e.is_empty())
                    .collect();
                if exts.is_empty() {
                    return Err(ConfigError::InvalidValue {
                        key: key.to_string(),
                        value: value.to_string(),
                        expected: "a comma-separated list of extensions",
                    });
                }
                self.audio_extensions = exts;
            }
            _ => return Err(ConfigError::UnknownKey(key.to_string())),
        }
        Ok(())
    }

    /// Enumeration options implied by this config.
    pub fn scan_options(&self) -> ScanOptions {
        let options = ScanOptions {
            recursive: self.recursive,
            skip_hidden: self.skip_hidden,
            extensions: None,
        };
        if self.audio_only {
            options.with_extensions(&self.audio_extensions)
        } else {
            options
        }
    }

    pub fn failure_policy(&self) -> FailurePolicy {
        if self.keep_going {
            FailurePolicy::Skip
        } else {
            FailurePolicy::Abort
        }
    }

    /// Log destination, defaulting to the system temp directory.
    pub fn log_file_path(&self) -> PathBuf {
        if self.log_file.is_empty() {
            std::env::temp_dir().join(DEFAULT_LOG_FILE)
        } else {
            PathBuf::from(shellexpand::tilde(&self.log_file).into_owned())
        }
    }
}
