use crate::types::metric::WeatherMetric;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum RegressionError {
    #[error("Network request failed for {0}")]
    NetworkRequest(String, #[source] reqwest::Error),

    #[error("HTTP request failed for {url} with status {status}")]
    HttpStatus {
        url: String,
        status: reqwest::StatusCode,
        #[source]
        source: reqwest::Error,
    },

    #[error("Failed to decode regression solver response")]
    Decode(#[source] reqwest::Error),

    #[error("Regression solver returned a malformed result: {0}")]
    MalformedResponse(String),

    #[error("Regression degree must be at least 1, got {0}")]
    InvalidDegree(u32),

    #[error("Significance level must be between 0 and 1 (exclusive), got {0}")]
    InvalidAlpha(f64),

    #[error("{metric} has {samples} samples, too few for a degree {degree} fit")]
    InsufficientSamples {
        metric: WeatherMetric,
        samples: usize,
        degree: u32,
    },

    #[error("Regression for {metric} failed")]
    MetricFailed {
        metric: WeatherMetric,
        #[source]
        source: Box<RegressionError>,
    },

    #[error("Background regression task failed to complete")]
    TaskJoin(#[from] tokio::task::JoinError),
}
