use crate::averaging::error::AveragingError;
use crate::geocoding::error::GeocodeError;
use crate::rate_limit::limiter::Usage;
use crate::regression::error::RegressionError;
use crate::weather_data::error::WeatherDataError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum TrendError {
    #[error("Rate limit exceeded ({usage})")]
    RateLimitExceeded { usage: Usage },

    #[error("Geocoding failed")]
    GeocodingFailed(#[from] GeocodeError),

    #[error("Fetching weather data failed")]
    WeatherFetchFailed(#[from] WeatherDataError),

    #[error("Regression failed")]
    RegressionFailed(#[from] RegressionError),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Failed to build HTTP client")]
    ClientBuild(#[source] reqwest::Error),
}

impl From<AveragingError> for TrendError {
    fn from(value: AveragingError) -> Self {
        TrendError::InvalidInput(value.to_string())
    }
}
