use thiserror::Error;

#[derive(Debug, Error)]
pub enum GeocodeError {
    #[error("Network request failed for {0}")]
    NetworkRequest(String, #[source] reqwest::Error),

    #[error("HTTP request failed for {url} with status {status}")]
    HttpStatus {
        url: String,
        status: reqwest::StatusCode,
        #[source]
        source: reqwest::Error,
    },

    #[error("Failed to decode geocoding response for '{address}'")]
    Decode {
        address: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("No geocoding results for '{0}'")]
    NoResults(String),

    #[error("Geocoding result for '{address}' has missing or invalid coordinates")]
    InvalidCoordinates { address: String },
}
