//! Calendar-year moving averages.

use crate::averaging::error::AveragingError;
use crate::averaging::group_by_metric;
use crate::types::sample::{AveragedSample, MetricSample};
use chrono::{Datelike, NaiveDate};

/// Averages raw samples over trailing blocks of whole calendar years.
///
/// For each target year `Y` in `start_year..=end_year` and each metric present in
/// `samples`, takes the mean of every present value whose calendar year lies in
/// `[Y - window_years + 1, Y]`, or `0.0` when there is none. Each output sample is
/// dated January 1 of `Y`. Ordering follows [`crate::average_window`]: year-major,
/// metrics in first-seen order.
///
/// # Errors
///
/// Returns [`AveragingError::InvalidWindowSize`] if `window_years < 1`, and
/// [`AveragingError::YearOutOfRange`] for a target year chrono cannot represent.
pub fn average_by_year(
    samples: &[MetricSample],
    start_year: i32,
    end_year: i32,
    window_years: u32,
) -> Result<Vec<AveragedSample>, AveragingError> {
    if window_years < 1 {
        return Err(AveragingError::InvalidWindowSize(i64::from(window_years)));
    }

    let groups = group_by_metric(samples);
    let mut averaged = Vec::new();
    for year in start_year..=end_year {
        let date = NaiveDate::from_ymd_opt(year, 1, 1).ok_or(AveragingError::YearOutOfRange(year))?;
        let first_year = i64::from(year) - i64::from(window_years) + 1;

        for (metric, group) in &groups {
            let (sum, count) = group
                .iter()
                .filter(|sample| {
                    (first_year..=i64::from(year)).contains(&i64::from(sample.date.year()))
                })
                .filter_map(|sample| sample.value)
                .fold((0.0, 0usize), |(sum, count), value| (sum + value, count + 1));
            let mean = if count > 0 { sum / count as f64 } else { 0.0 };
            averaged.push(AveragedSample::new(date, *metric, mean));
        }
    }
    Ok(averaged)
}
