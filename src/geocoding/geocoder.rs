//! Resolves free-form place names to coordinates.

use crate::geocoding::error::GeocodeError;
use crate::types::location::{GeocodedLocation, LatLon};
use async_trait::async_trait;
use log::{info, warn};
use reqwest::Client;
use serde::Deserialize;

pub const DEFAULT_GEOCODER_URL: &str = "https://geocode.maps.co/search";

/// Turns an address into coordinates.
#[async_trait]
pub trait Geocoder: Send + Sync {
    async fn geocode(&self, address: &str) -> Result<GeocodedLocation, GeocodeError>;
}

/// The geocoder reports coordinates as strings, some mirrors as numbers.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum Coordinate {
    Number(f64),
    Text(String),
}

impl Coordinate {
    fn value(&self) -> Option<f64> {
        match self {
            Coordinate::Number(n) => Some(*n),
            Coordinate::Text(s) => s.trim().parse().ok(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct SearchHit {
    lat: Option<Coordinate>,
    lon: Option<Coordinate>,
    display_name: Option<String>,
}

/// [`Geocoder`] backed by a maps.co compatible search endpoint.
pub struct HttpGeocoder {
    client: Client,
    base_url: String,
    api_key: String,
}

impl HttpGeocoder {
    pub fn new(client: Client, base_url: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into(),
            api_key: api_key.into(),
        }
    }
}

/// Picks the first hit and validates its coordinates.
fn location_from_hits(address: &str, hits: Vec<SearchHit>) -> Result<GeocodedLocation, GeocodeError> {
    let hit = hits
        .into_iter()
        .next()
        .ok_or_else(|| GeocodeError::NoResults(address.to_string()))?;

    let invalid = || GeocodeError::InvalidCoordinates {
        address: address.to_string(),
    };
    let latitude = hit.lat.as_ref().and_then(Coordinate::value).ok_or_else(invalid)?;
    let longitude = hit.lon.as_ref().and_then(Coordinate::value).ok_or_else(invalid)?;

    let coordinates = LatLon(latitude, longitude);
    if !coordinates.is_valid() {
        return Err(invalid());
    }
    Ok(GeocodedLocation {
        coordinates,
        display_name: hit.display_name,
    })
}

#[async_trait]
impl Geocoder for HttpGeocoder {
    async fn geocode(&self, address: &str) -> Result<GeocodedLocation, GeocodeError> {
        info!("Geocoding '{}'", address);

        // Errors drop the request url, it carries the api key.
        let response = self
            .client
            .get(&self.base_url)
            .query(&[("q", address), ("api_key", self.api_key.as_str())])
            .send()
            .await
            .map_err(|e| GeocodeError::NetworkRequest(self.base_url.clone(), e.without_url()))?;

        let response = match response.error_for_status() {
            Ok(resp) => resp,
            Err(e) => {
                let e = e.without_url();
                warn!("HTTP error while geocoding '{}': {:?}", address, e.status());
                return Err(if let Some(status) = e.status() {
                    GeocodeError::HttpStatus {
                        url: self.base_url.clone(),
                        status,
                        source: e,
                    }
                } else {
                    GeocodeError::NetworkRequest(self.base_url.clone(), e)
                });
            }
        };

        let hits: Vec<SearchHit> = response.json().await.map_err(|e| GeocodeError::Decode {
            address: address.to_string(),
            source: e.without_url(),
        })?;

        let location = location_from_hits(address, hits)?;
        info!(
            "Geocoded '{}' to ({}, {})",
            address,
            location.coordinates.latitude(),
            location.coordinates.longitude()
        );
        Ok(location)
    }
}
