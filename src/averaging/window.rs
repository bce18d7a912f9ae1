//! Trailing day-window averaging of raw daily samples.

use crate::averaging::error::AveragingError;
use crate::averaging::group_by_metric;
use crate::types::sample::{AveragedSample, MetricSample};
use crate::utils::date_range;
use chrono::{Duration, NaiveDate};
use log::debug;

/// Number of days in a window spanning `average_years` years, `floor(years * 365.25)`.
pub fn window_size_days(average_years: u32) -> i64 {
    (average_years as f64 * 365.25).floor() as i64
}

/// Present values of one metric sorted by date, with running sums for O(log n) window means.
struct SortedSeries {
    dates: Vec<NaiveDate>,
    /// `prefix_sums[i]` is the sum of the first `i` values.
    prefix_sums: Vec<f64>,
}

impl SortedSeries {
    fn new(samples: &[&MetricSample]) -> Self {
        let mut present: Vec<(NaiveDate, f64)> = samples
            .iter()
            .filter_map(|sample| sample.value.map(|value| (sample.date, value)))
            .collect();
        present.sort_by_key(|(date, _)| *date);

        let mut prefix_sums = Vec::with_capacity(present.len() + 1);
        prefix_sums.push(0.0);
        let mut running = 0.0;
        for (_, value) in &present {
            running += value;
            prefix_sums.push(running);
        }

        Self {
            dates: present.into_iter().map(|(date, _)| date).collect(),
            prefix_sums,
        }
    }

    /// Mean of all values dated within `[first, last]`, or 0 if there are none.
    fn mean_between(&self, first: NaiveDate, last: NaiveDate) -> f64 {
        let lo = self.dates.partition_point(|date| *date < first);
        let hi = self.dates.partition_point(|date| *date <= last);
        if hi <= lo {
            return 0.0;
        }
        (self.prefix_sums[hi] - self.prefix_sums[lo]) / (hi - lo) as f64
    }
}

/// Turns irregular raw daily samples into one trailing-window mean per date and metric.
///
/// For every date `d` in `start..=end` and every metric that occurs in `samples`,
/// the output holds the unweighted mean of all present values of that metric dated
/// within `[d - window_size_days + 1, d]`. A window without values yields `0.0`.
///
/// Output is date-major: all metrics for `start`, then all metrics for the next day,
/// with metrics in the order they first appear in `samples`. A metric without any
/// raw sample does not appear at all. Duplicate samples are all counted.
///
/// # Errors
///
/// Returns [`AveragingError::InvalidWindowSize`] if `window_size_days < 1`.
///
/// # Examples
///
/// ```
/// use chrono::NaiveDate;
/// use climate_trends::{average_window, MetricSample, WeatherMetric};
///
/// let jan_1 = NaiveDate::from_ymd_opt(2020, 1, 1).unwrap();
/// let dec_31 = NaiveDate::from_ymd_opt(2020, 12, 31).unwrap();
/// let samples = vec![
///     MetricSample::new(jan_1, WeatherMetric::AverageTemperature, Some(10.0)),
///     MetricSample::new(dec_31, WeatherMetric::AverageTemperature, Some(20.0)),
/// ];
///
/// let averaged = average_window(&samples, dec_31, dec_31, 366).unwrap();
/// assert_eq!(averaged[0].value, 15.0);
/// ```
pub fn average_window(
    samples: &[MetricSample],
    start: NaiveDate,
    end: NaiveDate,
    window_size_days: i64,
) -> Result<Vec<AveragedSample>, AveragingError> {
    if window_size_days < 1 {
        return Err(AveragingError::InvalidWindowSize(window_size_days));
    }
    if start > end {
        return Ok(Vec::new());
    }

    let series: Vec<_> = group_by_metric(samples)
        .into_iter()
        .map(|(metric, group)| (metric, SortedSeries::new(&group)))
        .collect();

    // Windows longer than chrono can represent reach back to the earliest date
    let lookback = Duration::try_days(window_size_days - 1);
    let mut averaged = Vec::with_capacity(series.len() * ((end - start).num_days() as usize + 1));
    for date in date_range(start, end) {
        let window_start = lookback
            .and_then(|lookback| date.checked_sub_signed(lookback))
            .unwrap_or(NaiveDate::MIN);
        for (metric, values) in &series {
            averaged.push(AveragedSample::new(
                date,
                *metric,
                values.mean_between(window_start, date),
            ));
        }
    }

    debug!(
        "Averaged {} raw samples into {} values ({} metrics, {}-day window, {} to {})",
        samples.len(),
        averaged.len(),
        series.len(),
        window_size_days,
        start,
        end
    );
    Ok(averaged)
}
