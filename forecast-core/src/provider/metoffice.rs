//! Met Office DataPoint three-hourly site forecast.

use async_trait::async_trait;
use chrono::{DateTime, Timelike};
use chrono_tz::Tz;
use reqwest::Client;
use serde::Deserialize;
use serde_json::Value;
use std::str::FromStr;

use crate::{
    StationConfig,
    error::{ExtractError, FetchError},
    model::NormalizedForecast,
    provider::{current_period, display_temp, display_wind_speed, get_json},
    units::mph_to_mps,
};

use super::{ForecastProvider, ProviderId};

const DEFAULT_BASE_URL: &str = "http://datapoint.metoffice.gov.uk";

/// Length of one DataPoint forecast period, in hours.
const PERIOD_HOURS: u32 = 3;

#[derive(Debug, Clone)]
pub struct MetOfficeProvider {
    api_key: String,
    site_id: String,
    base_url: String,
    http: Client,
}

impl MetOfficeProvider {
    pub fn new(api_key: String, site_id: String, http: Client) -> Self {
        Self { api_key, site_id, base_url: DEFAULT_BASE_URL.to_string(), http }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }
}

#[derive(Debug, Deserialize)]
struct MoResponse {
    #[serde(rename = "SiteRep")]
    site_rep: MoSiteRep,
}

#[derive(Debug, Deserialize)]
struct MoSiteRep {
    #[serde(rename = "DV")]
    dv: MoDataValues,
}

#[derive(Debug, Deserialize)]
struct MoDataValues {
    #[serde(rename = "dataDate")]
    data_date: String,
    #[serde(rename = "Location")]
    location: MoLocation,
}

#[derive(Debug, Deserialize)]
struct MoLocation {
    #[serde(rename = "Period")]
    period: Vec<MoPeriod>,
}

/// One forecast day; `value` looks like `2024-06-01Z`.
#[derive(Debug, Deserialize)]
struct MoPeriod {
    value: String,
    #[serde(rename = "Rep")]
    rep: Vec<MoRep>,
}

/// DataPoint sends every value as a string.
#[derive(Debug, Deserialize)]
struct MoRep {
    /// Minutes after local midnight at which the period starts.
    #[serde(rename = "$")]
    minutes: String,
    #[serde(rename = "T")]
    temperature: String,
    /// Wind speed in mph.
    #[serde(rename = "S")]
    wind_speed: String,
    #[serde(rename = "D")]
    wind_direction: String,
    #[serde(rename = "Pp")]
    precip_probability: String,
    #[serde(rename = "W")]
    weather_type: String,
}

#[async_trait]
impl ForecastProvider for MetOfficeProvider {
    fn id(&self) -> ProviderId {
        ProviderId::MetOffice
    }

    async fn download(&self) -> Result<Value, FetchError> {
        let url = format!("{}/public/data/val/wxfcs/all/json/{}", self.base_url, self.site_id);
        let request =
            self.http.get(url).query(&[("res", "3hourly"), ("key", self.api_key.as_str())]);

        get_json(self.id(), request).await
    }

    fn extract(
        &self,
        raw: &Value,
        now: DateTime<Tz>,
        config: &StationConfig,
    ) -> Result<NormalizedForecast, ExtractError> {
        let parsed = MoResponse::deserialize(raw)?;
        let dv = parsed.site_rep.dv;
        let issued = issued_time(&dv.data_date)?;

        let today = now.format("%Y-%m-%dZ").to_string();
        let day = dv
            .location
            .period
            .into_iter()
            .find(|period| period.value == today)
            .ok_or(ExtractError::NoForecastDay(today))?;

        let starts = day
            .rep
            .iter()
            .map(|rep| parse_field::<u32>("$", &rep.minutes).map(|minutes| minutes / 60))
            .collect::<Result<Vec<_>, _>>()?;

        let idx = current_period(&starts, &now.hour())
            .ok_or_else(|| ExtractError::NoCurrentPeriod(now.format("%H:%M").to_string()))?;
        let rep = &day.rep[idx];

        let valid = match starts[idx] + PERIOD_HOURS {
            24 => 0,
            hour => hour,
        };

        let celsius = parse_field::<f64>("T", &rep.temperature)?;
        let mph = parse_field::<f64>("S", &rep.wind_speed)?;

        Ok(NormalizedForecast {
            issued,
            valid: format!("{valid:02}:00"),
            temp: display_temp(celsius, config),
            wind_dir: rep.wind_direction.clone(),
            wind_spd: display_wind_speed(mph_to_mps(mph), config),
            weather: rep.weather_type.clone(),
            precip: rep.precip_probability.clone(),
            source: self.id(),
        })
    }
}

/// `HH:MM` out of a DataPoint timestamp such as `2024-06-01T13:00:00Z`.
fn issued_time(data_date: &str) -> Result<String, ExtractError> {
    data_date
        .len()
        .checked_sub(4)
        .and_then(|end| data_date.get(11..end))
        .filter(|time| !time.is_empty())
        .map(str::to_string)
        .ok_or_else(|| ExtractError::InvalidValue { field: "dataDate", value: data_date.into() })
}

fn parse_field<T: FromStr>(field: &'static str, value: &str) -> Result<T, ExtractError> {
    value
        .trim()
        .parse()
        .map_err(|_| ExtractError::InvalidValue { field, value: value.to_string() })
}
