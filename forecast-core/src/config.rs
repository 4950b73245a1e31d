use anyhow::{Context, Result, anyhow};
use chrono_tz::Tz;
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::{collections::HashMap, env, fs, path::PathBuf, time::Duration};

use crate::{
    provider::ProviderId,
    units::{TempUnit, WindUnit},
};

/// Environment variable that overrides the config file location.
pub const CONFIG_PATH_ENV: &str = "FORECAST_CONFIG";

/// Where the station is and which clock it keeps.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Station {
    /// ISO 3166 alpha-2 country code, e.g. "GB".
    pub country: String,
    /// IANA timezone name, e.g. "Europe/London".
    pub timezone: String,
    pub latitude: f64,
    pub longitude: f64,
    /// Met Office DataPoint site id, only used for stations in GB.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub met_office_id: Option<String>,
}

impl Default for Station {
    fn default() -> Self {
        Self {
            country: String::new(),
            timezone: "UTC".to_string(),
            latitude: 0.0,
            longitude: 0.0,
            met_office_id: None,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct Units {
    pub temp: TempUnit,
    pub wind: WindUnit,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct System {
    /// HTTP request timeout in seconds.
    pub timeout_secs: u64,
    /// Delay between successful downloads in `watch` mode, in minutes.
    pub refresh_minutes: u64,
}

impl Default for System {
    fn default() -> Self {
        Self { timeout_secs: 20, refresh_minutes: 60 }
    }
}

impl System {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn refresh_interval(&self) -> Duration {
        Duration::from_secs(self.refresh_minutes.saturating_mul(60))
    }
}

/// Credentials for a single provider.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderConfig {
    pub api_key: String,
}

/// Station configuration stored on disk.
///
/// Example TOML:
/// ```toml
/// [station]
/// country = "GB"
/// timezone = "Europe/London"
/// met_office_id = "310004"
///
/// [units]
/// temp = "c"
/// wind = "mph"
///
/// [providers.metoffice]
/// api_key = "..."
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct StationConfig {
    pub station: Station,
    pub units: Units,
    pub system: System,
    pub providers: HashMap<String, ProviderConfig>,
}

impl StationConfig {
    /// Parse the configured timezone name.
    pub fn timezone(&self) -> Result<Tz> {
        self.station.timezone.parse::<Tz>().map_err(|err| {
            anyhow!(
                "Invalid station timezone '{}': {err}.\n\
                 Hint: run `forecast station` and enter an IANA name such as Europe/London.",
                self.station.timezone
            )
        })
    }

    /// Load config from disk, or return an empty default if it doesn't exist yet.
    pub fn load() -> Result<Self> {
        let path = Self::config_file_path()?;
        if !path.exists() {
            return Ok(Self::default());
        }

        let contents = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        Self::from_toml(&contents)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))
    }

    pub fn from_toml(contents: &str) -> Result<Self> {
        Ok(toml::from_str(contents)?)
    }

    /// Save config to disk, creating parent directories as needed.
    pub fn save(&self) -> Result<()> {
        let path = Self::config_file_path()?;

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create config directory: {}", parent.display())
            })?;
        }

        let toml =
            toml::to_string_pretty(self).context("Failed to serialize configuration to TOML")?;

        fs::write(&path, toml)
            .with_context(|| format!("Failed to write config file: {}", path.display()))?;

        Ok(())
    }

    /// Path to the config file; `FORECAST_CONFIG` wins over the platform default.
    pub fn config_file_path() -> Result<PathBuf> {
        if let Some(path) = env::var_os(CONFIG_PATH_ENV) {
            return Ok(PathBuf::from(path));
        }

        let dirs = ProjectDirs::from("dev", "weather-station", "forecast")
            .ok_or_else(|| anyhow!("Could not determine platform config directory"))?;

        Ok(dirs.config_dir().join("config.toml"))
    }

    /// Set or replace a provider API key.
    pub fn upsert_provider_api_key(&mut self, provider_id: ProviderId, api_key: String) {
        self.providers.insert(provider_id.as_str().to_string(), ProviderConfig { api_key });
    }

    /// Returns the API key for a provider, if present and non-empty.
    pub fn provider_api_key(&self, provider_id: ProviderId) -> Option<&str> {
        self.providers
            .get(provider_id.as_str())
            .map(|cfg| cfg.api_key.trim())
            .filter(|key| !key.is_empty())
    }

    pub fn is_provider_configured(&self, provider_id: ProviderId) -> bool {
        self.provider_api_key(provider_id).is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_when_sections_missing() {
        let cfg = StationConfig::from_toml("[station]\ncountry = \"US\"\n").unwrap();

        assert_eq!(cfg.station.country, "US");
        assert_eq!(cfg.station.timezone, "UTC");
        assert_eq!(cfg.units.temp, TempUnit::C);
        assert_eq!(cfg.units.wind, WindUnit::Mph);
        assert_eq!(cfg.system.timeout_secs, 20);
        assert!(cfg.providers.is_empty());
    }

    #[test]
    fn parses_full_station_file() {
        let cfg = StationConfig::from_toml(
            r#"
            [station]
            country = "GB"
            timezone = "Europe/London"
            latitude = 51.5
            longitude = -0.12
            met_office_id = "310004"

            [units]
            temp = "f"
            wind = "kts"

            [system]
            timeout_secs = 5

            [providers.metoffice]
            api_key = "MO_KEY"
            "#,
        )
        .unwrap();

        assert_eq!(cfg.station.met_office_id.as_deref(), Some("310004"));
        assert_eq!(cfg.units.temp, TempUnit::F);
        assert_eq!(cfg.units.wind, WindUnit::Kts);
        assert_eq!(cfg.system.timeout(), Duration::from_secs(5));
        assert_eq!(cfg.provider_api_key(ProviderId::MetOffice), Some("MO_KEY"));
        assert_eq!(cfg.timezone().unwrap(), chrono_tz::Europe::London);
    }

    #[test]
    fn invalid_timezone_is_reported() {
        let mut cfg = StationConfig::default();
        cfg.station.timezone = "Mars/Olympus".to_string();

        let err = cfg.timezone().unwrap_err();
        assert!(err.to_string().contains("Invalid station timezone"));
    }

    #[test]
    fn blank_api_key_is_not_configured() {
        let mut cfg = StationConfig::default();
        cfg.upsert_provider_api_key(ProviderId::DarkSky, "   ".into());

        assert!(!cfg.is_provider_configured(ProviderId::DarkSky));
        assert_eq!(cfg.provider_api_key(ProviderId::DarkSky), None);
    }

    #[test]
    fn upsert_replaces_existing_key() {
        let mut cfg = StationConfig::default();

        cfg.upsert_provider_api_key(ProviderId::OpenWeather, "OLD".into());
        cfg.upsert_provider_api_key(ProviderId::OpenWeather, "NEW".into());

        assert_eq!(cfg.provider_api_key(ProviderId::OpenWeather), Some("NEW"));
        assert!(cfg.is_provider_configured(ProviderId::OpenWeather));
        assert!(!cfg.is_provider_configured(ProviderId::DarkSky));
    }

    #[test]
    fn huge_refresh_interval_saturates() {
        let cfg =
            StationConfig::from_toml("[system]\nrefresh_minutes = 9223372036854775807\n").unwrap();

        assert_eq!(cfg.system.refresh_interval(), Duration::from_secs(u64::MAX));
        assert_eq!(System::default().refresh_interval(), Duration::from_secs(3600));
    }
}
