//! Defines the weather metrics the pipeline can track and their mapping to the
//! daily variable names used by the weather archive.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// One tracked daily weather variable.
///
/// Serialized with the names used by the inbound API (`AVERAGE_TEMPERATURE`, ...).
/// Each variant maps to exactly one upstream archive field, see [`WeatherMetric::api_field`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum WeatherMetric {
    /// Mean air temperature at 2 meters.
    AverageTemperature,
    /// Mean apparent ("feels like") temperature.
    AverageApparentTemperature,
    /// Daily precipitation sum.
    Precipitation,
    /// Daily snowfall sum.
    Snowfall,
    /// Maximum wind speed at 10 meters.
    MaxWindSpeed,
}

impl WeatherMetric {
    /// Every metric, in declaration order.
    pub const ALL: [WeatherMetric; 5] = [
        WeatherMetric::AverageTemperature,
        WeatherMetric::AverageApparentTemperature,
        WeatherMetric::Precipitation,
        WeatherMetric::Snowfall,
        WeatherMetric::MaxWindSpeed,
    ];

    /// The daily variable name the weather archive uses for this metric.
    ///
    /// # Examples
    ///
    /// ```
    /// use climate_trends::WeatherMetric;
    ///
    /// assert_eq!(WeatherMetric::Snowfall.api_field(), "snowfall_sum");
    /// ```
    pub fn api_field(&self) -> &'static str {
        match self {
            WeatherMetric::AverageTemperature => "temperature_2m_mean",
            WeatherMetric::AverageApparentTemperature => "apparent_temperature_mean",
            WeatherMetric::Precipitation => "precipitation_sum",
            WeatherMetric::Snowfall => "snowfall_sum",
            WeatherMetric::MaxWindSpeed => "wind_speed_10m_max",
        }
    }

    /// Reverse of [`WeatherMetric::api_field`]. Returns `None` for names outside the table.
    pub fn from_api_field(field: &str) -> Option<WeatherMetric> {
        match field {
            "temperature_2m_mean" => Some(WeatherMetric::AverageTemperature),
            "apparent_temperature_mean" => Some(WeatherMetric::AverageApparentTemperature),
            "precipitation_sum" => Some(WeatherMetric::Precipitation),
            "snowfall_sum" => Some(WeatherMetric::Snowfall),
            "wind_speed_10m_max" => Some(WeatherMetric::MaxWindSpeed),
            _ => None,
        }
    }

    /// The inbound API name of the metric, e.g. `AVERAGE_TEMPERATURE`.
    pub fn name(&self) -> &'static str {
        match self {
            WeatherMetric::AverageTemperature => "AVERAGE_TEMPERATURE",
            WeatherMetric::AverageApparentTemperature => "AVERAGE_APPARENT_TEMPERATURE",
            WeatherMetric::Precipitation => "PRECIPITATION",
            WeatherMetric::Snowfall => "SNOWFALL",
            WeatherMetric::MaxWindSpeed => "MAX_WIND_SPEED",
        }
    }
}

impl fmt::Display for WeatherMetric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Unknown weather metric '{0}'")]
pub struct UnknownMetric(pub String);

/// Parses either the inbound API name (`PRECIPITATION`) or the archive field
/// name (`precipitation_sum`), ignoring case.
impl FromStr for WeatherMetric {
    type Err = UnknownMetric;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        WeatherMetric::ALL
            .into_iter()
            .find(|metric| {
                metric.name().eq_ignore_ascii_case(trimmed)
                    || metric.api_field().eq_ignore_ascii_case(trimmed)
            })
            .ok_or_else(|| UnknownMetric(s.to_string()))
    }
}
