//! Client for the Open-Meteo historical weather archive.
//!
//! The archive answers with a column-oriented `daily` block: one `time` column of
//! ISO dates plus one column per requested variable. This module flattens that
//! into [`MetricSample`]s.

use crate::types::location::LatLon;
use crate::types::metric::WeatherMetric;
use crate::types::sample::MetricSample;
use crate::utils::archive_end_date;
use crate::weather_data::error::WeatherDataError;
use crate::weather_data::source::DailyWeatherSource;
use async_trait::async_trait;
use chrono::{NaiveDate, Utc};
use log::{info, warn};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

pub const DEFAULT_ARCHIVE_URL: &str = "https://archive-api.open-meteo.com/v1/archive";

/// Units the archive reports values in.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UnitSystem {
    /// Fahrenheit, mph, inch.
    #[default]
    Imperial,
    /// Celsius, km/h, millimeter.
    Metric,
}

impl UnitSystem {
    fn query_params(&self) -> [(&'static str, &'static str); 3] {
        match self {
            UnitSystem::Imperial => [
                ("temperature_unit", "fahrenheit"),
                ("wind_speed_unit", "mph"),
                ("precipitation_unit", "inch"),
            ],
            UnitSystem::Metric => [
                ("temperature_unit", "celsius"),
                ("wind_speed_unit", "kmh"),
                ("precipitation_unit", "mm"),
            ],
        }
    }
}

impl fmt::Display for UnitSystem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UnitSystem::Imperial => write!(f, "imperial"),
            UnitSystem::Metric => write!(f, "metric"),
        }
    }
}

impl FromStr for UnitSystem {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "imperial" => Ok(UnitSystem::Imperial),
            "metric" => Ok(UnitSystem::Metric),
            other => Err(format!("unknown unit system '{}'", other)),
        }
    }
}

#[derive(Debug, Deserialize)]
struct ArchiveResponse {
    daily: Option<DailyBlock>,
}

#[derive(Debug, Deserialize)]
struct DailyBlock {
    time: Option<Vec<String>>,
    #[serde(flatten)]
    series: HashMap<String, Vec<Option<f64>>>,
}

/// Flattens the archive's daily columns into samples, metric by metric in enum order.
fn samples_from_response(response: ArchiveResponse) -> Result<Vec<MetricSample>, WeatherDataError> {
    let daily = response.daily.ok_or(WeatherDataError::MissingDailyBlock)?;
    let times = daily.time.ok_or(WeatherDataError::MissingTimeColumn)?;

    let dates = times
        .iter()
        .map(|value| {
            NaiveDate::parse_from_str(value, "%Y-%m-%d").map_err(|source| {
                WeatherDataError::DateParse {
                    value: value.clone(),
                    source,
                }
            })
        })
        .collect::<Result<Vec<_>, _>>()?;

    let mut columns = daily
        .series
        .into_iter()
        .map(|(field, values)| {
            let metric = WeatherMetric::from_api_field(&field)
                .ok_or_else(|| WeatherDataError::UnknownField(field.clone()))?;
            if values.len() != dates.len() {
                return Err(WeatherDataError::SeriesLengthMismatch {
                    field,
                    expected: dates.len(),
                    found: values.len(),
                });
            }
            Ok((metric, values))
        })
        .collect::<Result<Vec<_>, _>>()?;
    columns.sort_by_key(|(metric, _)| *metric);

    Ok(columns
        .into_iter()
        .flat_map(|(metric, values)| {
            dates
                .iter()
                .zip(values)
                .map(move |(date, value)| MetricSample::new(*date, metric, value))
        })
        .collect())
}

/// [`DailyWeatherSource`] backed by the Open-Meteo archive API.
pub struct OpenMeteoClient {
    client: Client,
    base_url: String,
    units: UnitSystem,
}

impl OpenMeteoClient {
    pub fn new(client: Client, base_url: impl Into<String>, units: UnitSystem) -> Self {
        Self {
            client,
            base_url: base_url.into(),
            units,
        }
    }

    /// Start and end date to request, with the end clamped for archive latency.
    fn request_dates(
        start_year: i32,
        end_year: i32,
        today: NaiveDate,
    ) -> Result<(NaiveDate, NaiveDate), WeatherDataError> {
        let start = NaiveDate::from_ymd_opt(start_year, 1, 1).ok_or_else(|| {
            WeatherDataError::InvalidRequest(format!("start year {} is out of range", start_year))
        })?;
        let end = archive_end_date(end_year, today).ok_or_else(|| {
            WeatherDataError::InvalidRequest(format!("end year {} is out of range", end_year))
        })?;
        if start > end {
            return Err(WeatherDataError::InvalidRequest(format!(
                "start date {} is after end date {}",
                start, end
            )));
        }
        Ok((start, end))
    }
}

#[async_trait]
impl DailyWeatherSource for OpenMeteoClient {
    async fn fetch(
        &self,
        location: LatLon,
        start_year: i32,
        end_year: i32,
        metrics: &[WeatherMetric],
    ) -> Result<Vec<MetricSample>, WeatherDataError> {
        if metrics.is_empty() {
            return Err(WeatherDataError::InvalidRequest(
                "no metrics requested".to_string(),
            ));
        }
        let (start, end) = Self::request_dates(start_year, end_year, Utc::now().date_naive())?;
        let fields = metrics
            .iter()
            .map(WeatherMetric::api_field)
            .collect::<Vec<_>>()
            .join(",");

        info!(
            "Fetching daily {} for ({}, {}) from {} to {}",
            fields,
            location.latitude(),
            location.longitude(),
            start,
            end
        );

        let mut query: Vec<(&str, String)> = vec![
            ("latitude", location.latitude().to_string()),
            ("longitude", location.longitude().to_string()),
            ("start_date", start.to_string()),
            ("end_date", end.to_string()),
            ("daily", fields),
            ("timezone", "auto".to_string()),
        ];
        query.extend(
            self.units
                .query_params()
                .into_iter()
                .map(|(key, value)| (key, value.to_string())),
        );

        let response = self
            .client
            .get(&self.base_url)
            .query(&query)
            .send()
            .await
            .map_err(|e| WeatherDataError::NetworkRequest(self.base_url.clone(), e))?;

        let response = match response.error_for_status() {
            Ok(resp) => resp,
            Err(e) => {
                warn!("HTTP error for {}: {:?}", self.base_url, e);
                return Err(if let Some(status) = e.status() {
                    WeatherDataError::HttpStatus {
                        url: self.base_url.clone(),
                        status,
                        source: e,
                    }
                } else {
                    WeatherDataError::NetworkRequest(self.base_url.clone(), e)
                });
            }
        };

        let body: ArchiveResponse = response.json().await.map_err(WeatherDataError::Decode)?;
        let samples = samples_from_response(body)?;
        info!("Received {} daily samples", samples.len());
        Ok(samples)
    }
}
