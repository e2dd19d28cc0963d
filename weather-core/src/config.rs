use anyhow::{Context, Result, anyhow};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::{
    fs,
    path::{Path, PathBuf},
};

use crate::model::{Coordinates, Units};

/// Environment variable that overrides the configured API key.
pub const API_KEY_ENV: &str = "OPENWEATHER_API_KEY";

/// How the automatic lookup obtains the device position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GeolocationMode {
    /// Approximate the position from the public IP address.
    #[default]
    Ip,
    /// Use `latitude`/`longitude` from the config file.
    Fixed,
    /// Behave as if the user refused the permission prompt.
    Denied,
    /// Behave as if no position capability exists.
    Unsupported,
}

impl GeolocationMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            GeolocationMode::Ip => "ip",
            GeolocationMode::Fixed => "fixed",
            GeolocationMode::Denied => "denied",
            GeolocationMode::Unsupported => "unsupported",
        }
    }

    pub const fn all() -> &'static [GeolocationMode] {
        &[
            GeolocationMode::Ip,
            GeolocationMode::Fixed,
            GeolocationMode::Denied,
            GeolocationMode::Unsupported,
        ]
    }
}

impl std::fmt::Display for GeolocationMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Example TOML:
/// [geolocation]
/// mode = "fixed"
/// latitude = 51.5
/// longitude = -0.12
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GeolocationConfig {
    #[serde(default)]
    pub mode: GeolocationMode,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub latitude: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub longitude: Option<f64>,
}

impl GeolocationConfig {
    pub fn fixed(coords: Coordinates) -> Self {
        Self {
            mode: GeolocationMode::Fixed,
            latitude: Some(coords.latitude),
            longitude: Some(coords.longitude),
        }
    }

    /// Coordinates for `mode = "fixed"`.
    pub fn fixed_coordinates(&self) -> Result<Coordinates> {
        match (self.latitude, self.longitude) {
            (Some(latitude), Some(longitude)) => Ok(Coordinates { latitude, longitude }),
            _ => Err(anyhow!(
                "Geolocation mode 'fixed' needs both latitude and longitude.\n\
                 Hint: run `weather-panel configure` to set them."
            )),
        }
    }
}

/// Top-level configuration stored on disk.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// OpenWeather API key. The `OPENWEATHER_API_KEY` variable takes precedence.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    /// Override for the OpenWeather endpoint root.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,

    /// Units active when the panel starts.
    #[serde(default)]
    pub units: Units,

    #[serde(default)]
    pub geolocation: GeolocationConfig,
}

impl Config {
    /// Load config from disk, or return an empty default if it doesn't exist yet.
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::config_file_path()?)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            // First run: no config file, return empty.
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

    fn project_dirs() -> Result<ProjectDirs> {
        ProjectDirs::from("dev", "weather-panel", "weather-panel")
            .ok_or_else(|| anyhow!("Could not determine platform config directory"))
    }

    /// Path to the config file.
    pub fn config_file_path() -> Result<PathBuf> {
        Ok(Self::project_dirs()?.config_dir().join("config.toml"))
    }

    /// Path to the file holding the last searched location.
    pub fn state_file_path() -> Result<PathBuf> {
        Ok(Self::project_dirs()?.data_dir().join("state.json"))
    }

    /// Pick the API key: a non-empty environment value wins over the config file.
    pub fn resolve_api_key(&self, env_value: Option<String>) -> Result<String> {
        env_value
            .filter(|key| !key.trim().is_empty())
            .or_else(|| self.api_key.clone().filter(|key| !key.trim().is_empty()))
            .ok_or_else(|| {
                anyhow!(
                    "No OpenWeather API key configured.\n\
                     Hint: run `weather-panel configure` or set {API_KEY_ENV}."
                )
            })
    }

    /// Same as [`Config::resolve_api_key`], reading the process environment.
    pub fn api_key(&self) -> Result<String> {
        self.resolve_api_key(std::env::var(API_KEY_ENV).ok())
    }

    pub fn set_api_key(&mut self, api_key: String) {
        self.api_key = Some(api_key);
    }
}
