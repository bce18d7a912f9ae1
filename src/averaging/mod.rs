//! Smoothing of raw daily samples into a regular grid of moving averages.

pub mod error;
pub mod window;
pub mod yearly;

use crate::types::metric::WeatherMetric;
use crate::types::sample::MetricSample;

/// Groups samples by metric, keeping metrics in the order they first occur.
pub(crate) fn group_by_metric(samples: &[MetricSample]) -> Vec<(WeatherMetric, Vec<&MetricSample>)> {
    let mut groups: Vec<(WeatherMetric, Vec<&MetricSample>)> = Vec::new();
    for sample in samples {
        match groups.iter_mut().find(|(metric, _)| *metric == sample.metric) {
            Some((_, group)) => group.push(sample),
            None => groups.push((sample.metric, vec![sample])),
        }
    }
    groups
}
