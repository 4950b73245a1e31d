use chrono::DateTime;
use chrono_tz::Tz;
use serde::Serialize;
use serde_json::Value;

use crate::provider::ProviderId;

/// Placeholder shown in place of any value that could not be derived.
pub const BLANK: &str = "--";

/// Weather code shown when no forecast (or no icon mapping) is available.
pub const FORECAST_UNAVAILABLE: &str = "ForecastUnavailable";

/// A formatted value paired with its unit label, e.g. `("12.3", "c")`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Reading {
    pub value: String,
    pub unit: Option<String>,
}

impl Reading {
    pub fn new(value: impl Into<String>, unit: impl Into<String>) -> Self {
        Self { value: value.into(), unit: Some(unit.into()) }
    }

    pub fn blank() -> Self {
        Self { value: BLANK.to_string(), unit: None }
    }

    pub fn is_blank(&self) -> bool {
        self.value == BLANK && self.unit.is_none()
    }
}

impl std::fmt::Display for Reading {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.unit {
            Some(unit) => write!(f, "{} {}", self.value, unit),
            None => f.write_str(&self.value),
        }
    }
}

/// Display-ready fields produced by one provider extraction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NormalizedForecast {
    pub issued: String,
    pub valid: String,
    pub temp: Reading,
    pub wind_dir: String,
    pub wind_spd: Reading,
    pub weather: String,
    pub precip: String,
    pub source: ProviderId,
}

/// Forecast record owned by the station and refreshed in place.
///
/// Every display field is replaced in one step, either from a
/// [`NormalizedForecast`] or with the unavailable placeholders.
#[derive(Debug, Clone, Serialize)]
pub struct ForecastState {
    /// Last provider payload that passed the shape check.
    #[serde(skip)]
    pub raw: Option<Value>,
    pub time: Option<DateTime<Tz>>,
    pub issued: String,
    pub valid: String,
    pub temp: Reading,
    pub wind_dir: String,
    pub wind_spd: Reading,
    pub weather: String,
    pub precip: String,
    pub source: String,
}

impl Default for ForecastState {
    fn default() -> Self {
        Self {
            raw: None,
            time: None,
            issued: BLANK.to_string(),
            valid: BLANK.to_string(),
            temp: Reading::blank(),
            wind_dir: BLANK.to_string(),
            wind_spd: Reading::blank(),
            weather: FORECAST_UNAVAILABLE.to_string(),
            precip: BLANK.to_string(),
            source: BLANK.to_string(),
        }
    }
}

impl ForecastState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Overwrite every display field from a successful extraction.
    pub fn apply(&mut self, now: DateTime<Tz>, forecast: NormalizedForecast) {
        let NormalizedForecast { issued, valid, temp, wind_dir, wind_spd, weather, precip, source } =
            forecast;

        *self = Self {
            raw: self.raw.take(),
            time: Some(now),
            issued,
            valid,
            temp,
            wind_dir,
            wind_spd,
            weather,
            precip,
            source: source.source_name().to_string(),
        };
    }

    /// Overwrite every display field with the unavailable placeholders.
    pub fn mark_unavailable(&mut self, now: DateTime<Tz>) {
        *self = Self { raw: self.raw.take(), time: Some(now), ..Self::default() };
    }

    pub fn is_unavailable(&self) -> bool {
        self.weather == FORECAST_UNAVAILABLE
            && self.temp.is_blank()
            && self.wind_spd.is_blank()
            && [&self.issued, &self.valid, &self.wind_dir, &self.precip, &self.source]
                .iter()
                .all(|field| field.as_str() == BLANK)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn sample() -> NormalizedForecast {
        NormalizedForecast {
            issued: "14:00".into(),
            valid: "15:00".into(),
            temp: Reading::new("12.0", "c"),
            wind_dir: "SSW".into(),
            wind_spd: Reading::new("9", "mph"),
            weather: "7".into(),
            precip: "5".into(),
            source: ProviderId::MetOffice,
        }
    }

    #[test]
    fn apply_then_blank_keeps_raw_payload() {
        let now = chrono_tz::Europe::London.with_ymd_and_hms(2024, 6, 1, 14, 5, 0).unwrap();
        let mut state = ForecastState::new();
        state.raw = Some(serde_json::json!({ "SiteRep": {} }));

        state.apply(now, sample());
        assert_eq!(state.source, "MetOffice");
        assert_eq!(state.temp.to_string(), "12.0 c");
        assert!(!state.is_unavailable());

        state.mark_unavailable(now);
        assert!(state.is_unavailable());
        assert_eq!(state.time, Some(now));
        assert!(state.raw.is_some());
    }

    #[test]
    fn blank_reading_displays_placeholder() {
        assert_eq!(Reading::blank().to_string(), BLANK);
    }
}
