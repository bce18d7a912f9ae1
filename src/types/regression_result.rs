use crate::types::metric::WeatherMetric;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Outcome of the overall model significance test (F-test).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TestResults {
    pub f_statistic: f64,
    pub p_value: f64,
    /// `p_value < alpha`, evaluated with the caller's alpha.
    pub significant: bool,
}

/// A fitted polynomial trend for one metric.
///
/// The x-axis of the fit is "days elapsed since `base_date`", so evaluating the
/// polynomial for a calendar date `d` means plugging in `(d - base_date).num_days()`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegressionResult {
    pub metric: WeatherMetric,
    /// Coefficients in ascending power order: `c0 + c1*x + c2*x^2 + ...`.
    pub coefficients: Vec<f64>,
    pub r_squared: f64,
    pub base_date: NaiveDate,
    pub test_results: TestResults,
}

impl RegressionResult {
    /// Evaluates the fitted polynomial at `date`.
    ///
    /// # Examples
    ///
    /// ```
    /// use chrono::NaiveDate;
    /// use climate_trends::{RegressionResult, TestResults, WeatherMetric};
    ///
    /// let base_date = NaiveDate::from_ymd_opt(2000, 1, 1).unwrap();
    /// let fit = RegressionResult {
    ///     metric: WeatherMetric::AverageTemperature,
    ///     coefficients: vec![50.0, 0.001],
    ///     r_squared: 0.8,
    ///     base_date,
    ///     test_results: TestResults { f_statistic: 12.0, p_value: 0.01, significant: true },
    /// };
    /// let later = NaiveDate::from_ymd_opt(2000, 1, 11).unwrap();
    /// assert!((fit.predict(later) - 50.01).abs() < 1e-9);
    /// ```
    pub fn predict(&self, date: NaiveDate) -> f64 {
        let x = (date - self.base_date).num_days() as f64;
        // Horner's scheme, highest power first
        self.coefficients
            .iter()
            .rev()
            .fold(0.0, |acc, coefficient| acc * x + coefficient)
    }
}
