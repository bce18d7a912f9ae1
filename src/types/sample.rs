use crate::types::metric::WeatherMetric;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// A single raw daily observation as delivered by the weather archive.
///
/// `value` is `None` when the archive reported no value for that day.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MetricSample {
    pub date: NaiveDate,
    pub metric: WeatherMetric,
    pub value: Option<f64>,
}

impl MetricSample {
    pub fn new(date: NaiveDate, metric: WeatherMetric, value: Option<f64>) -> Self {
        Self {
            date,
            metric,
            value,
        }
    }
}

/// A smoothed value: the mean of every raw sample of `metric` inside the
/// trailing window that ends at `date`.
///
/// A window without any raw values averages to `0.0`, not to a missing value.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AveragedSample {
    pub date: NaiveDate,
    pub metric: WeatherMetric,
    pub value: f64,
}

impl AveragedSample {
    pub fn new(date: NaiveDate, metric: WeatherMetric, value: f64) -> Self {
        Self {
            date,
            metric,
            value,
        }
    }
}
