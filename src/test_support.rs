//! In-memory stand-ins for the external services, shared by unit tests.

use crate::geocoding::error::GeocodeError;
use crate::geocoding::geocoder::Geocoder;
use crate::rate_limit::clock::Clock;
use crate::regression::error::RegressionError;
use crate::regression::solver::{FTest, PolynomialFit, RegressionSolver, SolverRequest};
use crate::types::location::{GeocodedLocation, LatLon};
use crate::types::metric::WeatherMetric;
use crate::types::sample::MetricSample;
use crate::weather_data::error::WeatherDataError;
use crate::weather_data::source::DailyWeatherSource;
use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

/// A clock that only moves when told to.
pub struct ManualClock {
    now: Mutex<DateTime<Utc>>,
}

impl ManualClock {
    pub fn new(start: DateTime<Utc>) -> Self {
        Self {
            now: Mutex::new(start),
        }
    }

    pub fn advance(&self, by: Duration) {
        let mut now = self.now.lock().unwrap();
        *now += by;
    }

    pub fn set(&self, to: DateTime<Utc>) {
        *self.now.lock().unwrap() = to;
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        *self.now.lock().unwrap()
    }
}

pub struct FakeGeocoder {
    answer: Option<GeocodedLocation>,
    calls: AtomicUsize,
}

impl FakeGeocoder {
    pub fn resolving(coordinates: LatLon, display_name: &str) -> Self {
        Self {
            answer: Some(GeocodedLocation {
                coordinates,
                display_name: Some(display_name.to_string()),
            }),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn failing() -> Self {
        Self {
            answer: None,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Geocoder for FakeGeocoder {
    async fn geocode(&self, address: &str) -> Result<GeocodedLocation, GeocodeError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.answer
            .clone()
            .ok_or_else(|| GeocodeError::NoResults(address.to_string()))
    }
}

/// What a [`FakeWeatherSource`] was asked for.
#[derive(Debug, Clone, PartialEq)]
pub struct FetchCall {
    pub location: LatLon,
    pub start_year: i32,
    pub end_year: i32,
    pub metrics: Vec<WeatherMetric>,
}

pub struct FakeWeatherSource {
    samples: Option<Vec<MetricSample>>,
    calls: Mutex<Vec<FetchCall>>,
}

impl FakeWeatherSource {
    /// Answers every fetch with `samples`, whatever range was asked for.
    pub fn with_samples(samples: Vec<MetricSample>) -> Self {
        Self {
            samples: Some(samples),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn failing() -> Self {
        Self {
            samples: None,
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn calls(&self) -> Vec<FetchCall> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl DailyWeatherSource for FakeWeatherSource {
    async fn fetch(
        &self,
        location: LatLon,
        start_year: i32,
        end_year: i32,
        metrics: &[WeatherMetric],
    ) -> Result<Vec<MetricSample>, WeatherDataError> {
        self.calls.lock().unwrap().push(FetchCall {
            location,
            start_year,
            end_year,
            metrics: metrics.to_vec(),
        });
        self.samples
            .clone()
            .ok_or(WeatherDataError::MissingDailyBlock)
    }
}

/// Answers every fit with the same p-value, optionally slowed down or failing per metric.
pub struct FakeSolver {
    p_value: f64,
    delays: HashMap<WeatherMetric, std::time::Duration>,
    failing: Option<WeatherMetric>,
    requests: Mutex<Vec<SolverRequest>>,
}

impl FakeSolver {
    pub fn with_p_value(p_value: f64) -> Self {
        Self {
            p_value,
            delays: HashMap::new(),
            failing: None,
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn delay(mut self, metric: WeatherMetric, by: std::time::Duration) -> Self {
        self.delays.insert(metric, by);
        self
    }

    pub fn failing_for(mut self, metric: WeatherMetric) -> Self {
        self.failing = Some(metric);
        self
    }

    pub fn requests(&self) -> Vec<SolverRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl RegressionSolver for FakeSolver {
    async fn fit(
        &self,
        metric: WeatherMetric,
        request: &SolverRequest,
    ) -> Result<PolynomialFit, RegressionError> {
        self.requests.lock().unwrap().push(request.clone());
        if let Some(delay) = self.delays.get(&metric) {
            tokio::time::sleep(*delay).await;
        }
        if self.failing == Some(metric) {
            return Err(RegressionError::MalformedResponse(format!(
                "solver refused {}",
                metric
            )));
        }
        Ok(PolynomialFit {
            coefficients: vec![1.0; request.degree as usize + 1],
            r_squared: 0.5,
            test_results: FTest {
                p_value: self.p_value,
                f_statistic: 2.0,
            },
        })
    }
}
