use thiserror::Error;

#[derive(Debug, Error)]
pub enum WeatherDataError {
    #[error("Network request failed for {0}")]
    NetworkRequest(String, #[source] reqwest::Error),

    #[error("HTTP request failed for {url} with status {status}")]
    HttpStatus {
        url: String,
        status: reqwest::StatusCode,
        #[source]
        source: reqwest::Error,
    },

    #[error("Failed to decode weather archive response")]
    Decode(#[source] reqwest::Error),

    #[error("Weather archive response has no daily block")]
    MissingDailyBlock,

    #[error("Weather archive response has no 'time' column")]
    MissingTimeColumn,

    #[error("Weather archive returned unknown daily field '{0}'")]
    UnknownField(String),

    #[error("Failed to parse archive date '{value}'")]
    DateParse {
        value: String,
        #[source]
        source: chrono::ParseError,
    },

    #[error("Field '{field}' has {found} values but there are {expected} dates")]
    SeriesLengthMismatch {
        field: String,
        expected: usize,
        found: usize,
    },

    #[error("Invalid archive request: {0}")]
    InvalidRequest(String),
}
