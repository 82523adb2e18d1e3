//! User configuration
//!
//! Stored as JSON in `~/.daybrief/user_config.json`, created with
//! defaults on first run. The aggregation core only ever consumes the
//! parsed struct; loading and saving are plumbing around it.

use crate::types::{DaybriefError, Result};
use directories::BaseDirs;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct UserConfig {
    pub canvas: CanvasConfig,
    pub weather: ToggleConfig,
    pub news: ToggleConfig,
    pub location: LocationConfig,
    pub emails: EmailsConfig,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CanvasConfig {
    pub enabled: bool,
    pub token: String,
    /// User-supplied display-name overrides keyed by course id; an alias
    /// always beats the shortening heuristic.
    pub course_aliases: HashMap<String, String>,
}

/// Enabled-by-default sources (weather, news)
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ToggleConfig {
    pub enabled: bool,
}

impl Default for ToggleConfig {
    fn default() -> Self {
        Self { enabled: true }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct LocationConfig {
    pub zip_code: String,
    pub lat: String,
    pub lon: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct EmailsConfig {
    pub enabled: bool,
    pub accounts: Vec<EmailAccount>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct EmailAccount {
    pub label: String,
    pub email: String,
    pub app_password: String,
    pub imap_host: String,
}

impl EmailAccount {
    /// Label shown next to each summary, falling back to the address
    pub fn display_label(&self) -> &str {
        if !self.label.is_empty() {
            &self.label
        } else if !self.email.is_empty() {
            &self.email
        } else {
            "Mail"
        }
    }
}

/// Default config location (`~/.daybrief/user_config.json`)
pub fn default_config_path() -> Result<PathBuf> {
    let base_dirs = BaseDirs::new()
        .ok_or_else(|| DaybriefError::Config("Cannot determine home directory".into()))?;
    Ok(base_dirs
        .home_dir()
        .join(".daybrief")
        .join("user_config.json"))
}

/// Load the config, writing defaults on first run. A corrupt file is
/// reported and replaced by defaults in memory (never overwritten on
/// disk, so the user can recover it).
pub fn load_or_init(path: &Path) -> Result<UserConfig> {
    if !path.exists() {
        let config = UserConfig::default();
        save(path, &config)?;
        return Ok(config);
    }

    let content = fs::read_to_string(path)?;
    match serde_json::from_str(&content) {
        Ok(config) => Ok(config),
        Err(e) => {
            eprintln!(
                "[daybrief] Warning: config at {:?} is unreadable ({}), using defaults",
                path, e
            );
            Ok(UserConfig::default())
        }
    }
}

/// Save the config as pretty JSON, creating parent directories
pub fn save(path: &Path, config: &UserConfig) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let content = serde_json::to_string_pretty(config)
        .map_err(|e| DaybriefError::Config(format!("Serialization failed: {}", e)))?;
    fs::write(path, content)?;
    Ok(())
}
