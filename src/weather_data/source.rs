use crate::types::location::LatLon;
use crate::types::metric::WeatherMetric;
use crate::types::sample::MetricSample;
use crate::weather_data::error::WeatherDataError;
use async_trait::async_trait;

/// Supplies raw daily observations for a location.
#[async_trait]
pub trait DailyWeatherSource: Send + Sync {
    /// Fetches one sample per day and requested metric for
    /// `start_year-01-01` through the end of `end_year` (or the latest available day).
    async fn fetch(
        &self,
        location: LatLon,
        start_year: i32,
        end_year: i32,
        metrics: &[WeatherMetric],
    ) -> Result<Vec<MetricSample>, WeatherDataError>;
}
