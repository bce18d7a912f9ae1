use async_trait::async_trait;
use chrono::{Datelike, NaiveDate};
use climate_trends::{
    average_by_year, average_window, window_size_days, AveragedSample, FTest, MetricSample,
    PolynomialFit, RegressionError, RegressionOrchestrator, RegressionSolver, SolverRequest,
    WeatherMetric,
};
use criterion::{black_box, criterion_group, criterion_main, Criterion};
use std::sync::Arc;

const METRICS: [WeatherMetric; 3] = [
    WeatherMetric::AverageTemperature,
    WeatherMetric::Precipitation,
    WeatherMetric::Snowfall,
];

fn daily_samples(first_year: i32, last_year: i32) -> Vec<MetricSample> {
    let start = NaiveDate::from_ymd_opt(first_year, 1, 1).unwrap();
    let end = NaiveDate::from_ymd_opt(last_year, 12, 31).unwrap();
    start
        .iter_days()
        .take_while(|d| *d <= end)
        .flat_map(|date| {
            METRICS.iter().map(move |&metric| {
                let value = (date.ordinal() % 7 == 0).then_some(date.ordinal() as f64 * 0.1);
                MetricSample::new(date, metric, value)
            })
        })
        .collect()
}

struct InstantSolver;

#[async_trait]
impl RegressionSolver for InstantSolver {
    async fn fit(
        &self,
        _metric: WeatherMetric,
        request: &SolverRequest,
    ) -> Result<PolynomialFit, RegressionError> {
        Ok(PolynomialFit {
            coefficients: vec![0.0; request.degree as usize + 1],
            r_squared: 0.0,
            test_results: FTest {
                p_value: 0.5,
                f_statistic: 0.0,
            },
        })
    }
}

fn bench_averaging(c: &mut Criterion) {
    let samples = daily_samples(2000, 2020);
    let start = NaiveDate::from_ymd_opt(2005, 1, 1).unwrap();
    let end = NaiveDate::from_ymd_opt(2020, 12, 31).unwrap();

    c.bench_function("average_window_5y", |b| {
        b.iter(|| average_window(black_box(&samples), start, end, window_size_days(5)))
    });
    c.bench_function("average_by_year_5y", |b| {
        b.iter(|| average_by_year(black_box(&samples), 2005, 2020, 5))
    });
}

fn bench_regression(c: &mut Criterion) {
    let runtime = tokio::runtime::Runtime::new().unwrap();
    let samples = daily_samples(2000, 2020);
    let start = NaiveDate::from_ymd_opt(2005, 1, 1).unwrap();
    let end = NaiveDate::from_ymd_opt(2020, 12, 31).unwrap();
    let averaged: Vec<AveragedSample> =
        average_window(&samples, start, end, window_size_days(5)).unwrap();
    let orchestrator = RegressionOrchestrator::new(Arc::new(InstantSolver));

    c.bench_function("regress_three_metrics", |b| {
        b.to_async(&runtime)
            .iter(|| orchestrator.regress(black_box(&averaged), 2, &METRICS, 0.05))
    });
}

criterion_group!(benches, bench_averaging, bench_regression);
criterion_main!(benches);
