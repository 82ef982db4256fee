//! snippad configuration
//!
//! User-level configuration read from TOML. Every field has a default, so
//! a missing file or a partial file is fine.
//!
//! # Usage
//!
//! ```rust,no_run
//! use snippad::util::config::{load_user_config, UserConfig};
//!
//! let config: UserConfig = load_user_config().unwrap();
//! println!("{}", config.repl.prompt);
//! ```

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Directory name under the platform config root
const APP_DIR: &str = "snippad";

/// User-level configuration for snippad
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct UserConfig {
    /// Session settings
    #[serde(default)]
    pub session: SessionConfig,
    /// Import registry settings
    #[serde(default)]
    pub imports: ImportsConfig,
    /// Console settings
    #[serde(default)]
    pub console: ConsoleConfig,
    /// REPL settings
    #[serde(default)]
    pub repl: ReplConfig,
    /// Where registry lists are stored
    #[serde(default)]
    pub storage: StorageConfig,
}

/// Session configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct SessionConfig {
    /// Classpath entries loaded into every new session
    #[serde(default)]
    pub classpath: Vec<PathBuf>,
    /// Local artifact repository for dependency coordinates
    #[serde(default)]
    pub repository: Option<PathBuf>,
}

/// Import registry configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImportsConfig {
    /// Imports seeded on first launch
    #[serde(default = "default_imports")]
    pub defaults: Vec<String>,
}

fn default_imports() -> Vec<String> {
    vec!["io.*".to_string(), "math.*".to_string(), "text.*".to_string()]
}

impl Default for ImportsConfig {
    fn default() -> Self {
        Self {
            defaults: default_imports(),
        }
    }
}

/// Console configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConsoleConfig {
    /// Print a status line per evaluated snippet
    #[serde(default = "default_true")]
    pub status_lines: bool,
    /// Colour console output
    #[serde(default = "default_true")]
    pub colors: bool,
}

fn default_true() -> bool {
    true
}

impl Default for ConsoleConfig {
    fn default() -> Self {
        Self {
            status_lines: true,
            colors: true,
        }
    }
}

/// REPL configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReplConfig {
    /// Prompt string
    #[serde(default = "default_prompt")]
    pub prompt: String,
    /// Prompt while a snippet is incomplete
    #[serde(default = "default_continuation_prompt")]
    pub continuation_prompt: String,
    /// History file path
    #[serde(default)]
    pub history_file: Option<PathBuf>,
}

fn default_prompt() -> String {
    "sp> ".to_string()
}

fn default_continuation_prompt() -> String {
    "..> ".to_string()
}

impl Default for ReplConfig {
    fn default() -> Self {
        Self {
            prompt: default_prompt(),
            continuation_prompt: default_continuation_prompt(),
            history_file: None,
        }
    }
}

/// Storage configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct StorageConfig {
    /// Directory for `imports.json` and `classpath.json`; defaults to the
    /// config directory
    #[serde(default)]
    pub dir: Option<PathBuf>,
}

impl UserConfig {
    /// Directory holding the registry stores
    pub fn storage_dir(&self) -> Result<PathBuf, ConfigError> {
        match &self.storage.dir {
            Some(dir) => Ok(dir.clone()),
            None => get_config_dir().ok_or(ConfigError::NoConfigDir),
        }
    }

    /// Local artifact repository, `<config dir>/repository` unless set
    pub fn repository_dir(&self) -> Result<PathBuf, ConfigError> {
        match &self.session.repository {
            Some(dir) => Ok(dir.clone()),
            None => get_config_dir()
                .map(|dir| dir.join("repository"))
                .ok_or(ConfigError::NoConfigDir),
        }
    }
}

/// Get the user config directory
pub fn get_config_dir() -> Option<PathBuf> {
    // Try XDG config directory on Unix
    if let Ok(xdg_config) = std::env::var("XDG_CONFIG_HOME") {
        return Some(PathBuf::from(xdg_config).join(APP_DIR));
    }

    // Fallback to ~/.config/snippad
    if let Ok(home) = std::env::var("HOME") {
        return Some(PathBuf::from(home).join(".config").join(APP_DIR));
    }

    // On Windows, try %APPDATA%
    if let Ok(appdata) = std::env::var("APPDATA") {
        return Some(PathBuf::from(appdata).join(APP_DIR));
    }

    None
}

/// Get the user config file path (~/.config/snippad/config.toml)
pub fn get_config_path() -> Option<PathBuf> {
    get_config_dir().map(|dir| dir.join("config.toml"))
}

/// Check if user config exists
pub fn config_exists() -> bool {
    get_config_path().map(|p| p.exists()).unwrap_or(false)
}

/// Load user-level configuration
/// Returns default config if file doesn't exist
pub fn load_user_config() -> Result<UserConfig, ConfigError> {
    match get_config_path() {
        Some(path) if path.exists() => load_config_from(&path),
        _ => Ok(UserConfig::default()),
    }
}

/// Load configuration from an explicit file
pub fn load_config_from(path: &Path) -> Result<UserConfig, ConfigError> {
    let content = fs::read_to_string(path).map_err(ConfigError::IoError)?;
    toml::from_str(&content).map_err(ConfigError::ParseError)
}

/// Load user-level config, creating default if not exists
pub fn load_or_create_user_config() -> Result<UserConfig, ConfigError> {
    let path = match get_config_path() {
        Some(p) => p,
        None => return Ok(UserConfig::default()),
    };

    if !path.exists() {
        let config = UserConfig::default();
        save_user_config(&config)?;
        return Ok(config);
    }

    load_config_from(&path)
}

/// Save user-level configuration
pub fn save_user_config(config: &UserConfig) -> Result<(), ConfigError> {
    let dir = get_config_dir().ok_or(ConfigError::NoConfigDir)?;
    let path = dir.join("config.toml");

    // Create directory if not exists
    if !dir.exists() {
        fs::create_dir_all(&dir).map_err(ConfigError::IoError)?;
    }

    let content = toml::to_string_pretty(config).map_err(ConfigError::SerializeError)?;
    fs::write(&path, content).map_err(ConfigError::IoError)?;

    Ok(())
}

/// Configuration errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    IoError(std::io::Error),
    #[error("Config parse error: {0}")]
    ParseError(toml::de::Error),
    #[error("Config serialize error: {0}")]
    SerializeError(toml::ser::Error),
    #[error("Cannot determine config directory")]
    NoConfigDir,
}
