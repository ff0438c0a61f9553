//! Persisted settings
//!
//! Settings live in a small JSON file under the platform configuration
//! directory (`~/.config/litelog/settings.json` on Linux). A missing file is
//! the same as an empty one. Zero values for the numeric settings mean
//! "unset" and fall back to the defaults; everything else is clamped into
//! its accepted range.

use litelog_core::error::{LitelogError, Result};
use litelog_core::types::{
    DEFAULT_LOOKBACK_HOURS, DEFAULT_PAGE_SIZE, KeyToken, MAX_LOOKBACK_HOURS, MAX_PAGE_SIZE,
    MIN_LOOKBACK_HOURS, MIN_PAGE_SIZE, WindowParams,
};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Directory name under the platform config dir
const APP_DIR: &str = "litelog";
/// Settings file name
const SETTINGS_FILE: &str = "settings.json";

/// Connection and paging settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub base_url: String,
    pub admin_api_key: String,
    pub lookback_hours: u32,
    pub page_size: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_selected_key: Option<KeyToken>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            base_url: String::new(),
            admin_api_key: String::new(),
            lookback_hours: DEFAULT_LOOKBACK_HOURS,
            page_size: DEFAULT_PAGE_SIZE,
            last_selected_key: None,
        }
    }
}

impl Settings {
    /// Whether both the base URL and the admin key are present
    pub fn is_configured(&self) -> bool {
        !self.base_url.trim().is_empty() && !self.admin_api_key.trim().is_empty()
    }

    /// Replace unset numeric values with defaults and clamp the rest
    pub fn normalized(mut self) -> Self {
        if self.lookback_hours == 0 {
            self.lookback_hours = DEFAULT_LOOKBACK_HOURS;
        }
        if self.page_size == 0 {
            self.page_size = DEFAULT_PAGE_SIZE;
        }
        self.lookback_hours = self
            .lookback_hours
            .clamp(MIN_LOOKBACK_HOURS, MAX_LOOKBACK_HOURS);
        self.page_size = self.page_size.clamp(MIN_PAGE_SIZE, MAX_PAGE_SIZE);
        self
    }

    /// Lookback and page size for the pagination controller
    pub fn window_params(&self) -> WindowParams {
        WindowParams::new(self.lookback_hours, self.page_size)
    }
}

/// Values given on the command line for a single invocation
#[derive(Debug, Clone, Default)]
pub struct SettingsOverrides {
    pub base_url: Option<String>,
    pub admin_api_key: Option<String>,
    pub lookback_hours: Option<u32>,
    pub page_size: Option<u32>,
}

impl SettingsOverrides {
    /// Layer these values over `settings`
    pub fn apply(&self, mut settings: Settings) -> Settings {
        if let Some(base_url) = &self.base_url {
            settings.base_url = base_url.clone();
        }
        if let Some(admin_api_key) = &self.admin_api_key {
            settings.admin_api_key = admin_api_key.clone();
        }
        if let Some(hours) = self.lookback_hours {
            settings.lookback_hours = hours;
        }
        if let Some(size) = self.page_size {
            settings.page_size = size;
        }
        settings.normalized()
    }
}

/// Reads and writes the settings file
#[derive(Debug, Clone)]
pub struct SettingsStore {
    path: PathBuf,
}

impl SettingsStore {
    /// Store backed by an explicit file
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Store at `path` if given, otherwise at the platform default location
    pub fn resolve(path: Option<PathBuf>) -> Result<Self> {
        match path.or_else(default_path) {
            Some(path) => Ok(Self::new(path)),
            None => Err(LitelogError::InvalidConfiguration(
                "Cannot determine the configuration directory; pass --config <path>.".to_string(),
            )),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load settings; a missing file yields the defaults
    pub fn load(&self) -> Result<Settings> {
        if !self.path.exists() {
            debug!("No settings file at {}", self.path.display());
            return Ok(Settings::default());
        }
        let content = fs::read_to_string(&self.path)?;
        if content.trim().is_empty() {
            return Ok(Settings::default());
        }
        let settings: Settings = serde_json::from_str(&content)?;
        Ok(settings.normalized())
    }

    /// Validate, clamp and persist `settings`
    pub fn save(&self, settings: &Settings) -> Result<Settings> {
        if !settings.is_configured() {
            return Err(LitelogError::InvalidConfiguration(
                "Base URL and Admin API Key cannot be empty.".to_string(),
            ));
        }
        let settings = Settings {
            base_url: settings.base_url.trim().to_string(),
            admin_api_key: settings.admin_api_key.trim().to_string(),
            ..settings.clone()
        }
        .normalized();
        self.write(&settings)?;
        info!("Settings saved to {}", self.path.display());
        Ok(settings)
    }

    /// Record the last selected key, leaving every other stored value alone
    pub fn remember_key(&self, token: &KeyToken) -> Result<()> {
        let mut stored = self.load()?;
        if stored.last_selected_key.as_ref() == Some(token) {
            return Ok(());
        }
        stored.last_selected_key = Some(token.clone());
        self.write(&stored)
    }

    fn write(&self, settings: &Settings) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let content = serde_json::to_string_pretty(settings)?;
        fs::write(&self.path, content)?;
        Ok(())
    }
}

/// `<config dir>/litelog/settings.json`
pub fn default_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join(APP_DIR).join(SETTINGS_FILE))
}

/// Show the first and last four characters of a secret
pub fn mask_secret(secret: &str) -> String {
    let chars: Vec<char> = secret.chars().collect();
    if chars.len() <= 8 {
        return "*".repeat(chars.len());
    }
    let head: String = chars[..4].iter().collect();
    let tail: String = chars[chars.len() - 4..].iter().collect();
    format!("{head}...{tail}")
}
