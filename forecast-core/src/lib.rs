//! Core library for the `forecast` station console tool.
//!
//! This crate defines:
//! - Station configuration & credentials handling
//! - Provider adapters for the Met Office, DarkSky and OpenWeather forecasts
//! - Unit and wind-direction helpers
//! - The fetcher that keeps a station's [`ForecastState`] current
//!
//! It is used by `forecast-cli`, but can also be driven by any other host
//! that owns a timer or task scheduler.

pub mod config;
pub mod error;
pub mod fetcher;
pub mod model;
pub mod provider;
pub mod units;

pub use config::{ProviderConfig, StationConfig};
pub use error::{ExtractError, FetchError};
pub use fetcher::{ForecastFetcher, Outcome, RETRY_DELAY};
pub use model::{BLANK, FORECAST_UNAVAILABLE, ForecastState, NormalizedForecast, Reading};
pub use provider::{ForecastProvider, ProviderId, select_provider};
pub use units::{TempUnit, WindUnit};
