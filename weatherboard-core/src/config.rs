use anyhow::{Context, Result, anyhow};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::{fmt, fs, path::Path, path::PathBuf, time::Duration};

use crate::model::Coordinates;

/// How the dashboard finds the device position when no cities are saved.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LocatorMode {
    /// No geolocation capability; the user must add a city by hand.
    #[default]
    None,
    /// Use the coordinates stored in `[location]`.
    Fixed,
    /// Ask an IP geolocation service.
    Ip,
}

impl LocatorMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            LocatorMode::None => "none",
            LocatorMode::Fixed => "fixed",
            LocatorMode::Ip => "ip",
        }
    }

    pub const fn all() -> &'static [LocatorMode] {
        &[LocatorMode::None, LocatorMode::Fixed, LocatorMode::Ip]
    }
}

impl fmt::Display for LocatorMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<&str> for LocatorMode {
    type Error = anyhow::Error;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value.to_lowercase().as_str() {
            "none" => Ok(LocatorMode::None),
            "fixed" => Ok(LocatorMode::Fixed),
            "ip" => Ok(LocatorMode::Ip),
            _ => Err(anyhow!("Unknown location mode '{value}'. Supported modes: none, fixed, ip.")),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LocationConfig {
    #[serde(default)]
    pub mode: LocatorMode,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    #[serde(default = "default_ip_url")]
    pub ip_url: String,
}

impl Default for LocationConfig {
    fn default() -> Self {
        Self { mode: LocatorMode::default(), latitude: None, longitude: None, ip_url: default_ip_url() }
    }
}

impl LocationConfig {
    /// Fixed coordinates, if both halves are present.
    pub fn coordinates(&self) -> Option<Coordinates> {
        Some(Coordinates { latitude: self.latitude?, longitude: self.longitude? })
    }
}

/// Top-level configuration stored on disk.
///
/// Example TOML:
/// ```toml
/// timeout_secs = 10
///
/// [location]
/// mode = "fixed"
/// latitude = 51.5
/// longitude = -0.1
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default = "default_geocoding_url")]
    pub geocoding_url: String,

    #[serde(default = "default_forecast_url")]
    pub forecast_url: String,

    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,

    /// Where saved cities live. Defaults to the platform data directory.
    pub data_dir: Option<PathBuf>,

    #[serde(default)]
    pub location: LocationConfig,
}

fn default_geocoding_url() -> String {
    "https://geocoding-api.open-meteo.com/v1".to_string()
}

fn default_forecast_url() -> String {
    "https://api.open-meteo.com/v1".to_string()
}

fn default_ip_url() -> String {
    "http://ip-api.com".to_string()
}

const fn default_timeout() -> u64 {
    10
}

impl Default for Config {
    fn default() -> Self {
        Self {
            geocoding_url: default_geocoding_url(),
            forecast_url: default_forecast_url(),
            timeout_secs: default_timeout(),
            data_dir: None,
            location: LocationConfig::default(),
        }
    }
}

impl Config {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Load config from disk, or return defaults if it doesn't exist yet.
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::config_file_path()?)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            // First run: no config file.
            return Ok(Self::default());
        }

        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let cfg: Config = toml::from_str(&contents)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(cfg)
    }

    /// Save config to disk, creating parent directories as needed.
    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::config_file_path()?)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create config directory: {}", parent.display())
            })?;
        }

        let toml =
            toml::to_string_pretty(self).context("Failed to serialize configuration to TOML")?;

        fs::write(path, toml)
            .with_context(|| format!("Failed to write config file: {}", path.display()))?;

        Ok(())
    }

    pub fn config_file_path() -> Result<PathBuf> {
        Ok(Self::project_dirs()?.config_dir().join("config.toml"))
    }

    /// Directory holding the city store: `data_dir` if set, else the platform default.
    pub fn resolve_data_dir(&self) -> Result<PathBuf> {
        match &self.data_dir {
            Some(dir) => Ok(dir.clone()),
            None => Ok(Self::project_dirs()?.data_dir().to_path_buf()),
        }
    }

    /// Switch to fixed coordinates, replacing any previous location setup.
    pub fn set_fixed_location(&mut self, coords: Coordinates) {
        self.location.mode = LocatorMode::Fixed;
        self.location.latitude = Some(coords.latitude);
        self.location.longitude = Some(coords.longitude);
    }

    fn project_dirs() -> Result<ProjectDirs> {
        ProjectDirs::from("dev", "weatherboard", "weatherboard")
            .ok_or_else(|| anyhow!("Could not determine platform config directory"))
    }
}
