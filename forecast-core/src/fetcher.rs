//! Download-and-normalize cycle for a station's forecast.
//!
//! [`ForecastFetcher::download`] never fails. Problems leave the placeholders
//! in the [`ForecastState`] and come back as [`Outcome::RetryAfter`]; the host
//! decides when to call again.

use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use serde_json::{Map, Value};
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::{
    StationConfig,
    model::ForecastState,
    provider::{ForecastProvider, ProviderId, selected_provider_from_config},
};

/// Fixed delay before a failed download is attempted again.
pub const RETRY_DELAY: Duration = Duration::from_secs(600);

/// What the host should do after a download cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// Fresh data was downloaded and normalized.
    Updated,
    /// Something failed; call `download` again after the delay.
    RetryAfter(Duration),
    /// No provider is configured for this station; the state was not touched.
    NoProvider,
}

#[derive(Debug)]
pub struct ForecastFetcher {
    config: StationConfig,
    tz: Tz,
    provider: Option<Box<dyn ForecastProvider>>,
}

impl ForecastFetcher {
    /// Build a fetcher for the provider the station configuration selects.
    pub fn from_config(config: StationConfig) -> anyhow::Result<Self> {
        let tz = config.timezone()?;
        let provider = selected_provider_from_config(&config)?;

        match &provider {
            Some(provider) => info!(provider = %provider.id(), "selected forecast provider"),
            None => warn!(
                country = %config.station.country,
                "no forecast provider configured for this station"
            ),
        }

        Ok(Self { config, tz, provider })
    }

    /// Build a fetcher around an explicit provider.
    pub fn with_provider(
        config: StationConfig,
        provider: Box<dyn ForecastProvider>,
    ) -> anyhow::Result<Self> {
        let tz = config.timezone()?;
        Ok(Self { config, tz, provider: Some(provider) })
    }

    pub fn provider_id(&self) -> Option<ProviderId> {
        self.provider.as_ref().map(|provider| provider.id())
    }

    pub fn config(&self) -> &StationConfig {
        &self.config
    }

    /// Download the forecast and refresh `state` in place.
    pub async fn download(&self, state: &mut ForecastState) -> Outcome {
        self.download_at(state, Utc::now()).await
    }

    /// [`download`](Self::download) with an explicit clock.
    pub async fn download_at(&self, state: &mut ForecastState, now: DateTime<Utc>) -> Outcome {
        let Some(provider) = self.provider.as_deref() else {
            return Outcome::NoProvider;
        };

        let mut retry = false;
        match provider.download().await {
            Ok(raw) if provider.validate(&raw) => {
                debug!(provider = %provider.id(), "forecast downloaded");
                state.raw = Some(raw);
            }
            Ok(_) => {
                warn!(
                    provider = %provider.id(),
                    field = provider.id().required_field(),
                    "forecast response missing top-level field"
                );
                retry = true;
            }
            Err(err) => {
                warn!(provider = %provider.id(), error = %err, "forecast download failed");
                retry = true;
            }
        }

        if retry && state.raw.is_none() {
            state.raw = Some(Value::Object(Map::new()));
        }

        // Extraction runs even after a failed download, against cached data.
        let extracted = self.extract_with(provider, state, now);

        if retry || !extracted {
            info!(delay_secs = RETRY_DELAY.as_secs(), "forecast retry scheduled");
            Outcome::RetryAfter(RETRY_DELAY)
        } else {
            Outcome::Updated
        }
    }

    fn extract_with(
        &self,
        provider: &dyn ForecastProvider,
        state: &mut ForecastState,
        now: DateTime<Utc>,
    ) -> bool {
        let local_now = now.with_timezone(&self.tz);
        let empty = Value::Null;
        let raw = state.raw.as_ref().unwrap_or(&empty);

        match provider.extract(raw, local_now, &self.config) {
            Ok(forecast) => {
                state.apply(local_now, forecast);
                true
            }
            Err(err) => {
                warn!(provider = %provider.id(), error = %err, "forecast unavailable");
                state.mark_unavailable(local_now);
                false
            }
        }
    }
}
