use crate::{
    StationConfig,
    error::{ExtractError, FetchError},
    model::{NormalizedForecast, Reading},
    provider::{darksky::DarkSkyProvider, metoffice::MetOfficeProvider, openweather::OpenWeatherProvider},
    units::{convert_temperature, convert_wind_speed},
};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use reqwest::{Client, RequestBuilder};
use serde::Serialize;
use serde_json::Value;
use std::fmt::Debug;

pub mod darksky;
pub mod metoffice;
pub mod openweather;

/// Stations in this country are always served by the Met Office.
pub const NATIONAL_COUNTRY: &str = "GB";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderId {
    MetOffice,
    DarkSky,
    OpenWeather,
}

impl ProviderId {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProviderId::MetOffice => "metoffice",
            ProviderId::DarkSky => "darksky",
            ProviderId::OpenWeather => "openweather",
        }
    }

    /// Name shown in the console's source label.
    pub fn source_name(&self) -> &'static str {
        match self {
            ProviderId::MetOffice => "MetOffice",
            ProviderId::DarkSky => "DarkSky",
            ProviderId::OpenWeather => "OpenWeather",
        }
    }

    /// Top-level key a well-formed response must carry.
    pub fn required_field(&self) -> &'static str {
        match self {
            ProviderId::MetOffice => "SiteRep",
            ProviderId::DarkSky | ProviderId::OpenWeather => "hourly",
        }
    }

    pub const fn all() -> &'static [ProviderId] {
        &[ProviderId::MetOffice, ProviderId::DarkSky, ProviderId::OpenWeather]
    }
}

impl std::fmt::Display for ProviderId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<&str> for ProviderId {
    type Error = anyhow::Error;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        let lower = value.to_lowercase();

        match lower.as_str() {
            "metoffice" => Ok(ProviderId::MetOffice),
            "darksky" => Ok(ProviderId::DarkSky),
            "openweather" => Ok(ProviderId::OpenWeather),
            _ => Err(anyhow::anyhow!(
                "Unknown provider '{value}'. Supported providers: metoffice, darksky, openweather."
            )),
        }
    }
}

/// One forecast source: how to download it, check it and read it.
#[async_trait]
pub trait ForecastProvider: Send + Sync + Debug {
    fn id(&self) -> ProviderId;

    /// Download the raw forecast payload.
    async fn download(&self) -> Result<Value, FetchError>;

    /// Shape check on a downloaded payload.
    fn validate(&self, raw: &Value) -> bool {
        verify_response(raw, self.id().required_field())
    }

    /// Normalize the period that is current at `now` (already in station time).
    fn extract(
        &self,
        raw: &Value,
        now: DateTime<Tz>,
        config: &StationConfig,
    ) -> Result<NormalizedForecast, ExtractError>;
}

/// True when `raw` is a JSON object whose `field` is present and non-null.
pub fn verify_response(raw: &Value, field: &str) -> bool {
    raw.as_object().and_then(|obj| obj.get(field)).is_some_and(|value| !value.is_null())
}

/// Pick the single provider for a station: Met Office for GB, then DarkSky,
/// then OpenWeather, whichever has a key first.
pub fn select_provider(config: &StationConfig) -> Option<ProviderId> {
    if config.station.country.trim().eq_ignore_ascii_case(NATIONAL_COUNTRY) {
        return Some(ProviderId::MetOffice);
    }

    [ProviderId::DarkSky, ProviderId::OpenWeather]
        .into_iter()
        .find(|id| config.is_provider_configured(*id))
}

/// Construct a provider from config and explicit ProviderId.
pub fn provider_from_config(
    id: ProviderId,
    config: &StationConfig,
) -> anyhow::Result<Box<dyn ForecastProvider>> {
    let api_key = config.provider_api_key(id).ok_or_else(|| {
        anyhow::anyhow!(
            "No API key configured for provider '{id}'.\n\
                 Hint: run `forecast configure {id}` and enter your API key."
        )
    })?;

    let http = Client::builder().timeout(config.system.timeout()).build()?;

    let boxed: Box<dyn ForecastProvider> = match id {
        ProviderId::MetOffice => {
            let site_id = config.station.met_office_id.as_deref().ok_or_else(|| {
                anyhow::anyhow!(
                    "No Met Office site id configured.\n\
                     Hint: run `forecast configure metoffice` and enter the DataPoint site id."
                )
            })?;
            Box::new(MetOfficeProvider::new(api_key.to_owned(), site_id.to_owned(), http))
        }
        ProviderId::DarkSky => Box::new(DarkSkyProvider::new(
            api_key.to_owned(),
            config.station.latitude,
            config.station.longitude,
            http,
        )),
        ProviderId::OpenWeather => Box::new(OpenWeatherProvider::new(
            api_key.to_owned(),
            config.station.latitude,
            config.station.longitude,
            http,
        )),
    };

    Ok(boxed)
}

/// Construct the provider selected for this station, if any.
pub fn selected_provider_from_config(
    config: &StationConfig,
) -> anyhow::Result<Option<Box<dyn ForecastProvider>>> {
    select_provider(config).map(|id| provider_from_config(id, config)).transpose()
}

/// Index of the latest period starting at or before `now`, given ascending starts.
pub(crate) fn current_period<T: PartialOrd>(starts: &[T], now: &T) -> Option<usize> {
    starts.partition_point(|start| start <= now).checked_sub(1)
}

/// Send a request and decode the body as JSON, keeping HTTP errors readable.
pub(crate) async fn get_json(provider: ProviderId, request: RequestBuilder) -> Result<Value, FetchError> {
    let res = request.send().await.map_err(|source| FetchError::Request { provider, source })?;

    let status = res.status();
    let body = res.text().await.map_err(|source| FetchError::Request { provider, source })?;

    if !status.is_success() {
        return Err(FetchError::Status { provider, status, body: truncate_body(&body) });
    }

    serde_json::from_str(&body).map_err(|source| FetchError::Json { provider, source })
}

pub(crate) fn display_temp(celsius: f64, config: &StationConfig) -> Reading {
    let (value, unit) = convert_temperature(celsius, config.units.temp);
    Reading::new(format!("{value:.1}"), unit)
}

pub(crate) fn display_wind_speed(mps: f64, config: &StationConfig) -> Reading {
    let (value, unit) = convert_wind_speed(mps, config.units.wind);
    Reading::new(format!("{value:.0}"), unit)
}

/// `HH:MM` of a unix timestamp in the station timezone.
pub(crate) fn local_hhmm(ts: i64, tz: Tz) -> Result<String, ExtractError> {
    DateTime::<Utc>::from_timestamp(ts, 0)
        .map(|dt| dt.with_timezone(&tz).format("%H:%M").to_string())
        .ok_or_else(|| ExtractError::InvalidValue { field: "timestamp", value: ts.to_string() })
}

/// Percent string from a 0..1 probability.
pub(crate) fn percent(probability: f64) -> String {
    format!("{:.0}", probability * 100.0)
}

fn truncate_body(body: &str) -> String {
    const MAX: usize = 200;
    match body.char_indices().nth(MAX) {
        Some((idx, _)) => format!("{}...", &body[..idx]),
        None => body.to_string(),
    }
}
