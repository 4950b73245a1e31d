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
    units::{cardinal_direction, mph_to_mps},
};

use super::{ForecastProvider, ProviderId};

const DEFAULT_BASE_URL: &str = "https://api.darksky.net";

#[derive(Debug, Clone)]
pub struct DarkSkyProvider {
    api_key: String,
    latitude: f64,
    longitude: f64,
    base_url: String,
    http: Client,
}

impl DarkSkyProvider {
    pub fn new(api_key: String, latitude: f64, longitude: f64, http: Client) -> Self {
        Self { api_key, latitude, longitude, base_url: DEFAULT_BASE_URL.to_string(), http }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }
}

#[derive(Debug, Deserialize)]
struct DsResponse {
    hourly: DsHourly,
}

#[derive(Debug, Deserialize)]
struct DsHourly {
    data: Vec<DsHour>,
}

/// Hourly block requested with `units=uk2`: Celsius and mph.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct DsHour {
    time: i64,
    temperature: f64,
    wind_speed: f64,
    // Omitted by the API when the wind is calm.
    wind_bearing: Option<f64>,
    precip_probability: f64,
    #[serde(default)]
    icon: String,
}

/// Console weather code for a DarkSky icon name.
pub fn map_icon(icon: &str) -> &'static str {
    match icon {
        "clear-day" => "1",
        "clear-night" => "0",
        "rain" => "12",
        "snow" => "27",
        "sleet" => "18",
        "wind" => "wind",
        "fog" => "6",
        "cloudy" => "7",
        "partly-cloudy-day" => "3",
        "partly-cloudy-night" => "2",
        _ => FORECAST_UNAVAILABLE,
    }
}

#[async_trait]
impl ForecastProvider for DarkSkyProvider {
    fn id(&self) -> ProviderId {
        ProviderId::DarkSky
    }

    async fn download(&self) -> Result<Value, FetchError> {
        let url = format!(
            "{}/forecast/{}/{},{}",
            self.base_url, self.api_key, self.latitude, self.longitude
        );
        let request = self
            .http
            .get(url)
            .query(&[("exclude", "currently,minutely,alerts,flags"), ("units", "uk2")]);

        get_json(self.id(), request).await
    }

    fn extract(
        &self,
        raw: &Value,
        now: DateTime<Tz>,
        config: &StationConfig,
    ) -> Result<NormalizedForecast, ExtractError> {
        let parsed = DsResponse::deserialize(raw)?;
        let hours = parsed.hourly.data;
        let tz = now.timezone();

        let times: Vec<i64> = hours.iter().map(|hour| hour.time).collect();
        let idx = current_period(&times, &now.timestamp())
            .ok_or_else(|| ExtractError::NoCurrentPeriod(now.to_rfc3339()))?;
        let next = times.get(idx + 1).ok_or_else(|| ExtractError::NoNextPeriod(now.to_rfc3339()))?;
        let hour = &hours[idx];

        Ok(NormalizedForecast {
            issued: local_hhmm(times[0], tz)?,
            valid: local_hhmm(*next, tz)?,
            temp: display_temp(hour.temperature, config),
            wind_dir: hour
                .wind_bearing
                .map_or_else(|| BLANK.to_string(), |bearing| cardinal_direction(bearing).to_string()),
            wind_spd: display_wind_speed(mph_to_mps(hour.wind_speed), config),
            weather: map_icon(&hour.icon).to_string(),
            precip: percent(hour.precip_probability),
            source: self.id(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::units::WindUnit;
    use chrono::{TimeZone, Utc};
    use chrono_tz::America::New_York;
    use serde_json::json;

    const TABLE: [(&str, &str); 10] = [
        ("clear-day", "1"),
        ("clear-night", "0"),
        ("rain", "12"),
        ("snow", "27"),
        ("sleet", "18"),
        ("wind", "wind"),
        ("fog", "6"),
        ("cloudy", "7"),
        ("partly-cloudy-day", "3"),
        ("partly-cloudy-night", "2"),
    ];

    fn provider() -> DarkSkyProvider {
        DarkSkyProvider::new("KEY".into(), 40.7, -74.0, Client::new())
    }

    fn config() -> StationConfig {
        let mut cfg = StationConfig::default();
        cfg.station.country = "US".into();
        cfg.station.timezone = "America/New_York".into();
        cfg
    }

    fn payload() -> Value {
        let start = Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap().timestamp();
        let data: Vec<Value> = (0..6)
            .map(|i| {
                json!({
                    "time": start + i * 3600,
                    "summary": "Cloudy",
                    "icon": if i == 2 { "rain" } else { "cloudy" },
                    "temperature": 18.3 + i as f64,
                    "windSpeed": 10.0,
                    "windBearing": 225,
                    "precipProbability": 0.35,
                })
            })
            .collect();

        json!({ "latitude": 40.7, "longitude": -74.0, "hourly": { "summary": "Rain", "data": data } })
    }

    #[test]
    fn icon_table_is_exact() {
        for (icon, code) in TABLE {
            assert_eq!(map_icon(icon), code, "icon {icon}");
        }
        assert_eq!(map_icon("tornado"), FORECAST_UNAVAILABLE);
        assert_eq!(map_icon(""), FORECAST_UNAVAILABLE);
    }

    #[test]
    fn extracts_current_hour() {
        let now = Utc.with_ymd_and_hms(2024, 6, 1, 14, 20, 0).unwrap().with_timezone(&New_York);

        let forecast = provider().extract(&payload(), now, &config()).unwrap();

        assert_eq!(forecast.issued, "08:00");
        assert_eq!(forecast.valid, "11:00");
        assert_eq!(forecast.temp.value, "20.3");
        assert_eq!(forecast.wind_dir, "SW");
        assert_eq!(forecast.wind_spd.value, "10");
        assert_eq!(forecast.wind_spd.unit.as_deref(), Some("mph"));
        assert_eq!(forecast.precip, "35");
        assert_eq!(forecast.weather, "12");
        assert_eq!(forecast.source, ProviderId::DarkSky);
    }

    #[test]
    fn wind_reported_in_meters_per_second() {
        let now = Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap().with_timezone(&New_York);
        let mut cfg = config();
        cfg.units.wind = WindUnit::Mps;

        let forecast = provider().extract(&payload(), now, &cfg).unwrap();

        assert_eq!(forecast.wind_spd.value, "4");
        assert_eq!(forecast.wind_spd.unit.as_deref(), Some("mps"));
    }

    #[test]
    fn calm_hour_has_blank_direction() {
        let now = Utc.with_ymd_and_hms(2024, 6, 1, 12, 30, 0).unwrap().with_timezone(&New_York);
        let mut raw = payload();
        raw["hourly"]["data"][0].as_object_mut().unwrap().remove("windBearing");

        let forecast = provider().extract(&raw, now, &config()).unwrap();
        assert_eq!(forecast.wind_dir, BLANK);
    }

    #[test]
    fn before_first_hour_is_an_error() {
        let now = Utc.with_ymd_and_hms(2024, 6, 1, 11, 0, 0).unwrap().with_timezone(&New_York);
        let err = provider().extract(&payload(), now, &config()).unwrap_err();
        assert!(matches!(err, ExtractError::NoCurrentPeriod(_)));
    }

    #[test]
    fn last_hour_has_no_valid_time() {
        let now = Utc.with_ymd_and_hms(2024, 6, 1, 17, 30, 0).unwrap().with_timezone(&New_York);
        let err = provider().extract(&payload(), now, &config()).unwrap_err();
        assert!(matches!(err, ExtractError::NoNextPeriod(_)));
    }

    #[test]
    fn missing_hourly_block_is_schema_error() {
        let now = Utc.with_ymd_and_hms(2024, 6, 1, 14, 0, 0).unwrap().with_timezone(&New_York);
        let err = provider().extract(&json!({ "daily": {} }), now, &config()).unwrap_err();
        assert!(matches!(err, ExtractError::Schema(_)));
    }
}
