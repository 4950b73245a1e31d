use reqwest::StatusCode;

use crate::provider::ProviderId;

/// Failure to obtain a JSON payload from a provider.
#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    #[error("Failed to send request to {provider}: {source}")]
    Request { provider: ProviderId, source: reqwest::Error },

    #[error("{provider} request failed with status {status}: {body}")]
    Status { provider: ProviderId, status: StatusCode, body: String },

    #[error("Failed to parse {provider} JSON: {source}")]
    Json { provider: ProviderId, source: serde_json::Error },
}

/// Failure to read the current period out of a provider payload.
#[derive(Debug, thiserror::Error)]
pub enum ExtractError {
    #[error("forecast payload is missing expected data: {0}")]
    Schema(#[from] serde_json::Error),

    #[error("forecast has no entry for {0}")]
    NoForecastDay(String),

    #[error("no forecast period starts at or before {0}")]
    NoCurrentPeriod(String),

    #[error("no forecast period follows {0}")]
    NoNextPeriod(String),

    #[error("invalid {field} value '{value}'")]
    InvalidValue { field: &'static str, value: String },
}
