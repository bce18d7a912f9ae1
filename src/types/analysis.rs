//! Request and response types of a single trend analysis.

use crate::types::metric::WeatherMetric;
use crate::types::regression_result::RegressionResult;
use crate::types::sample::AveragedSample;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Significance threshold used when the caller does not pick one.
pub const DEFAULT_ALPHA: f64 = 0.05;

/// How raw daily samples are smoothed before the regression.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Granularity {
    /// One averaged value per day, over a trailing window of
    /// `floor(average_years * 365.25)` days.
    #[default]
    Days,
    /// One averaged value per calendar year, over the trailing `average_years`
    /// calendar years. Dated January 1 of the target year.
    CalendarYears,
}

impl fmt::Display for Granularity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Granularity::Days => write!(f, "days"),
            Granularity::CalendarYears => write!(f, "years"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Unknown granularity '{0}', expected 'days' or 'years'")]
pub struct UnknownGranularity(pub String);

impl FromStr for Granularity {
    type Err = UnknownGranularity;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "days" | "day" => Ok(Granularity::Days),
            "years" | "year" | "calendar_years" => Ok(Granularity::CalendarYears),
            _ => Err(UnknownGranularity(s.to_string())),
        }
    }
}

fn default_alpha() -> f64 {
    DEFAULT_ALPHA
}

/// Everything needed for one pipeline invocation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisRequest {
    /// Free-form place name, resolved through the geocoder.
    pub location: String,
    pub start_year: i32,
    pub end_year: i32,
    pub average_years: u32,
    pub regression_degree: u32,
    pub metrics: Vec<WeatherMetric>,
    #[serde(default)]
    pub granularity: Granularity,
    #[serde(default = "default_alpha")]
    pub alpha: f64,
}

/// The assembled answer of one pipeline invocation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WeatherAnalysis {
    pub historical_data: Vec<AveragedSample>,
    pub regression: Vec<RegressionResult>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location_name: Option<String>,
}
