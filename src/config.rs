//! Session settings loaded from a TOML file.
//!
//! Every key is optional; missing keys take the values from
//! `config/settings.toml`, which is also embedded as a template.

use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tempfile::NamedTempFile;
use tracing::{debug, info};

use crate::error::ChamberError;

/// The documented default settings file, embedded at compile time.
const SETTINGS_TEMPLATE: &str = include_str!("../config/settings.toml");

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub measurement_period_secs: u64,
    pub period_hours: u32,
    pub subperiod_minutes: u32,
    pub cycle_cap_days: u32,
    pub save_delay_secs: u64,
    pub default_email: String,
    /// Directory for temporary (not yet user-saved) archives.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data_dir: Option<PathBuf>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            measurement_period_secs: 60,
            period_hours: 24,
            subperiod_minutes: 60,
            cycle_cap_days: 31,
            save_delay_secs: 2,
            default_email: String::new(),
            data_dir: None,
        }
    }
}

impl Settings {
    /// Platform location of the settings file (e.g. `~/.config/envchamber/settings.toml`).
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("envchamber").join("settings.toml"))
    }

    /// The commented settings template shipped with the crate.
    pub fn template() -> &'static str {
        SETTINGS_TEMPLATE
    }

    /// Load settings from a TOML file. Fails if the file is missing or invalid.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read settings {:?}", path))?;
        let settings: Settings = toml::from_str(&content)
            .with_context(|| format!("Failed to parse settings {:?}", path))?;
        settings.validate()?;
        debug!("Loaded settings from {:?}", path);
        Ok(settings)
    }

    /// Load settings, falling back to defaults when the file does not exist.
    pub fn load_or_default(path: &Path) -> Result<Self> {
        if !path.exists() {
            info!("No settings file at {:?}, using defaults", path);
            return Ok(Self::default());
        }
        Self::load(path)
    }

    /// Write the settings atomically (temp file in the same directory, then rename).
    pub fn save(&self, path: &Path) -> Result<()> {
        self.validate()?;
        let content = toml::to_string_pretty(self).context("Failed to serialize settings")?;

        let parent = path
            .parent()
            .ok_or_else(|| anyhow::anyhow!("Settings path has no parent directory: {:?}", path))?;
        std::fs::create_dir_all(parent)?;

        let mut temp = NamedTempFile::new_in(parent)?;
        temp.write_all(content.as_bytes())?;
        temp.flush()?;
        temp.persist(path)?;

        info!("Wrote settings to {:?}", path);
        Ok(())
    }

    pub fn validate(&self) -> Result<(), ChamberError> {
        let checks = [
            ("measurement_period_secs", self.measurement_period_secs == 0),
            ("period_hours", self.period_hours == 0),
            ("subperiod_minutes", self.subperiod_minutes == 0),
            ("cycle_cap_days", self.cycle_cap_days == 0),
        ];
        for (key, is_zero) in checks {
            if is_zero {
                return Err(ChamberError::Config(format!("{} must be greater than zero", key)));
            }
        }
        Ok(())
    }

    pub fn measurement_period(&self) -> std::time::Duration {
        std::time::Duration::from_secs(self.measurement_period_secs)
    }

    pub fn save_delay(&self) -> std::time::Duration {
        std::time::Duration::from_secs(self.save_delay_secs)
    }

    pub fn period_length(&self) -> chrono::Duration {
        chrono::Duration::hours(i64::from(self.period_hours))
    }

    pub fn subperiod_length(&self) -> chrono::Duration {
        chrono::Duration::minutes(i64::from(self.subperiod_minutes))
    }

    pub fn cycle_cap(&self) -> chrono::Duration {
        chrono::Duration::days(i64::from(self.cycle_cap_days))
    }

    /// Resolved directory for temporary archives.
    pub fn data_dir(&self) -> PathBuf {
        self.data_dir
            .clone()
            .or_else(|| dirs::data_dir().map(|dir| dir.join("envchamber")))
            .unwrap_or_else(|| std::env::temp_dir().join("envchamber"))
    }
}
