use async_trait::async_trait;
use chrono::DateTime;
use chrono_tz::Tz;
use reqwest::Client;
use serde::Deserialize;
use serde_json::Value;

use crate::{
    StationConfig,
    error::{ExtractError, FetchError},
    model::{BLANK, FORECAST_UNAVAILABLE, NormalizedForecast},
    provider::{current_period, display_temp, display_wind_speed, get_json, local_hhmm, percent},
    units::cardinal_direction,
};

use super::ForecastProvider;
use super::ProviderId;

const DEFAULT_BASE_URL: &str = "https://api.openweathermap.org";

/// Scale applied to the hourly `wind_speed`, read as km/h, to get m/s.
pub const WIND_SPEED_TO_MPS: f64 = 0.2778;

/// OpenWeather icon code to console weather code.
const ICON_MAP: [(&str, &str); 18] = [
    ("01n", "0"),
    ("01d", "1"),
    ("02n", "2"),
    ("02d", "3"),
    ("50d", "6"),
    ("50n", "6"),
    ("03d", "7"),
    ("03n", "7"),
    ("04d", "8"),
    ("04n", "8"),
    ("09n", "9"),
    ("09d", "10"),
    ("10n", "13"),
    ("10d", "14"),
    ("13n", "22"),
    ("13d", "23"),
    ("11n", "28"),
    ("11d", "29"),
];

#[derive(Debug, Clone)]
pub struct OpenWeatherProvider {
    api_key: String,
    latitude: f64,
    longitude: f64,
    base_url: String,
    http: Client,
}

impl OpenWeatherProvider {
    pub fn new(api_key: String, latitude: f64, longitude: f64, http: Client) -> Self {
        Self { api_key, latitude, longitude, base_url: DEFAULT_BASE_URL.to_string(), http }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }
}

#[derive(Debug, Deserialize)]
struct OwOneCallResponse {
    hourly: Vec<OwHour>,
}

#[derive(Debug, Deserialize)]
struct OwWeather {
    icon: String,
}

#[derive(Debug, Deserialize)]
struct OwHour {
    dt: i64,
    temp: f64,
    wind_speed: f64,
    wind_deg: Option<f64>,
    /// Probability of precipitation, 0..1.
    pop: Option<f64>,
    #[serde(default)]
    weather: Vec<OwWeather>,
}

pub fn map_icon(icon: &str) -> &'static str {
    ICON_MAP
        .iter()
        .find(|(key, _)| *key == icon)
        .map_or(FORECAST_UNAVAILABLE, |(_, code)| code)
}

#[async_trait]
impl ForecastProvider for OpenWeatherProvider {
    fn id(&self) -> ProviderId {
        ProviderId::OpenWeather
    }

    async fn download(&self) -> Result<Value, FetchError> {
        let url = format!("{}/data/2.5/onecall", self.base_url);
        let request = self.http.get(url).query(&[
            ("appid", self.api_key.clone()),
            ("lat", self.latitude.to_string()),
            ("lon", self.longitude.to_string()),
            ("exclude", "current,minutely,daily".to_string()),
            ("units", "metric".to_string()),
        ]);

        get_json(self.id(), request).await
    }

    fn extract(
        &self,
        raw: &Value,
        now: DateTime<Tz>,
        config: &StationConfig,
    ) -> Result<NormalizedForecast, ExtractError> {
        let parsed = OwOneCallResponse::deserialize(raw)?;
        let hours = parsed.hourly;
        let tz = now.timezone();

        let times: Vec<i64> = hours.iter().map(|hour| hour.dt).collect();
        let idx = current_period(&times, &now.timestamp())
            .ok_or_else(|| ExtractError::NoCurrentPeriod(now.to_rfc3339()))?;
        let next = times.get(idx + 1).ok_or_else(|| ExtractError::NoNextPeriod(now.to_rfc3339()))?;
        let hour = &hours[idx];

        let weather = hour
            .weather
            .first()
            .map_or(FORECAST_UNAVAILABLE, |weather| map_icon(&weather.icon));

        Ok(NormalizedForecast {
            issued: local_hhmm(times[0], tz)?,
            valid: local_hhmm(*next, tz)?,
            temp: display_temp(hour.temp, config),
            wind_dir: hour
                .wind_deg
                .map_or_else(|| BLANK.to_string(), |deg| cardinal_direction(deg).to_string()),
            wind_spd: display_wind_speed(hour.wind_speed * WIND_SPEED_TO_MPS, config),
            weather: weather.to_string(),
            precip: hour.pop.map_or_else(|| BLANK.to_string(), percent),
            source: self.id(),
        })
    }
}
