//! Fans out one solver call per metric and assembles annotated trend results.

use crate::regression::error::RegressionError;
use crate::regression::solver::{PolynomialFit, RegressionSolver, SolverRequest};
use crate::types::metric::WeatherMetric;
use crate::types::regression_result::{RegressionResult, TestResults};
use crate::types::sample::AveragedSample;
use chrono::NaiveDate;
use log::{debug, info, warn};
use std::sync::Arc;
use tokio::task::JoinSet;

/// One metric's series converted to the solver's numeric axis.
#[derive(Debug, Clone, PartialEq)]
pub struct MetricSeries {
    pub metric: WeatherMetric,
    /// Earliest date of the series; x = 0.
    pub base_date: NaiveDate,
    pub request: SolverRequest,
}

impl MetricSeries {
    /// Filters `samples` to `metric`, sorts by date and maps dates to elapsed days
    /// since the earliest one. `None` if the metric has no samples.
    pub fn build(samples: &[AveragedSample], metric: WeatherMetric, degree: u32) -> Option<Self> {
        let mut relevant: Vec<&AveragedSample> =
            samples.iter().filter(|s| s.metric == metric).collect();
        relevant.sort_by_key(|s| s.date);

        let base_date = relevant.first()?.date;
        let x = relevant
            .iter()
            .map(|s| (s.date - base_date).num_days() as f64)
            .collect();
        let y = relevant.iter().map(|s| s.value).collect();

        Some(Self {
            metric,
            base_date,
            request: SolverRequest { x, y, degree },
        })
    }

    fn into_result(self, fit: PolynomialFit, alpha: f64) -> RegressionResult {
        RegressionResult {
            metric: self.metric,
            coefficients: fit.coefficients,
            r_squared: fit.r_squared,
            base_date: self.base_date,
            test_results: TestResults {
                f_statistic: fit.test_results.f_statistic,
                p_value: fit.test_results.p_value,
                // The solver's own notion of significance is ignored
                significant: fit.test_results.p_value < alpha,
            },
        }
    }
}

/// Metrics from `requested` in the order they first occur in `samples`.
fn metrics_in_sample_order(
    samples: &[AveragedSample],
    requested: &[WeatherMetric],
) -> Vec<WeatherMetric> {
    let mut ordered: Vec<WeatherMetric> = Vec::new();
    for sample in samples {
        if requested.contains(&sample.metric) && !ordered.contains(&sample.metric) {
            ordered.push(sample.metric);
        }
    }
    ordered
}

/// Runs polynomial trend fits for several metrics concurrently.
pub struct RegressionOrchestrator {
    solver: Arc<dyn RegressionSolver>,
}

impl RegressionOrchestrator {
    pub fn new(solver: Arc<dyn RegressionSolver>) -> Self {
        Self { solver }
    }

    /// Fits a polynomial of `degree` to every requested metric present in `samples`.
    ///
    /// Results come back in the order the metrics first occur in `samples`, no
    /// matter which solver call finishes first. Requested metrics without samples
    /// are left out. Each result is marked significant when the solver's p-value
    /// is below `alpha`.
    ///
    /// # Errors
    ///
    /// All or nothing: if any metric's fit fails, the whole call fails with
    /// [`RegressionError::MetricFailed`] and the other in-flight fits are aborted.
    /// Also fails up front with [`RegressionError::InvalidDegree`],
    /// [`RegressionError::InvalidAlpha`] or [`RegressionError::InsufficientSamples`].
    pub async fn regress(
        &self,
        samples: &[AveragedSample],
        degree: u32,
        metrics: &[WeatherMetric],
        alpha: f64,
    ) -> Result<Vec<RegressionResult>, RegressionError> {
        if degree < 1 {
            return Err(RegressionError::InvalidDegree(degree));
        }
        if !(alpha > 0.0 && alpha < 1.0) {
            return Err(RegressionError::InvalidAlpha(alpha));
        }

        let series = metrics_in_sample_order(samples, metrics)
            .into_iter()
            .filter_map(|metric| MetricSeries::build(samples, metric, degree))
            .collect::<Vec<_>>();

        for s in &series {
            if s.request.x.len() <= degree as usize {
                return Err(RegressionError::InsufficientSamples {
                    metric: s.metric,
                    samples: s.request.x.len(),
                    degree,
                });
            }
        }

        info!(
            "Dispatching {} degree {} regressions ({} metrics requested)",
            series.len(),
            degree,
            metrics.len()
        );

        let mut tasks = JoinSet::new();
        for (index, metric_series) in series.into_iter().enumerate() {
            let solver = Arc::clone(&self.solver);
            tasks.spawn(async move {
                let fit = solver
                    .fit(metric_series.metric, &metric_series.request)
                    .await;
                (index, metric_series, fit)
            });
        }

        let mut slots: Vec<Option<RegressionResult>> = (0..tasks.len()).map(|_| None).collect();
        while let Some(joined) = tasks.join_next().await {
            let (index, metric_series, fit) = joined?;
            let metric = metric_series.metric;
            let fit = fit.and_then(|fit| fit.validate().map(|_| fit)).map_err(|e| {
                warn!("Regression for {} failed: {}", metric, e);
                RegressionError::MetricFailed {
                    metric,
                    source: Box::new(e),
                }
            })?;
            debug!(
                "Regression for {} done: r² = {:.4}, p = {:.4}",
                metric, fit.r_squared, fit.test_results.p_value
            );
            slots[index] = Some(metric_series.into_result(fit, alpha));
        }

        Ok(slots.into_iter().flatten().collect())
    }
}
