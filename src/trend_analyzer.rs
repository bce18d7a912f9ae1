//! The pipeline entry point: admission, geocoding, raw fetch, smoothing and
//! per-metric trend fits, assembled into one [`WeatherAnalysis`].

use crate::averaging::window::{average_window, window_size_days};
use crate::averaging::yearly::average_by_year;
use crate::config::Config;
use crate::error::TrendError;
use crate::geocoding::cache::CachedGeocoder;
use crate::geocoding::geocoder::{Geocoder, HttpGeocoder};
use crate::rate_limit::limiter::RateLimiter;
use crate::regression::orchestrator::RegressionOrchestrator;
use crate::regression::solver::{HttpRegressionSolver, RegressionSolver};
use crate::types::analysis::{AnalysisRequest, Granularity, WeatherAnalysis, DEFAULT_ALPHA};
use crate::types::metric::WeatherMetric;
use crate::weather_data::open_meteo::OpenMeteoClient;
use crate::weather_data::source::DailyWeatherSource;
use bon::bon;
use chrono::{Datelike, NaiveDate, Utc};
use log::{debug, info, warn};
use std::sync::Arc;

/// Runs climate trend analyses against the configured geocoder, weather archive
/// and regression solver.
///
/// Every analysis first has to pass the shared [`RateLimiter`]. Any failure along
/// the way aborts the whole analysis; partial results are never returned.
///
/// # Examples
///
/// ```rust
/// # use climate_trends::{Granularity, TrendAnalyzer, TrendError, WeatherMetric};
/// # async fn run(analyzer: &TrendAnalyzer) -> Result<(), TrendError> {
/// let analysis = analyzer
///     .analyze()
///     .location("Denver, CO")
///     .start_year(2000)
///     .end_year(2020)
///     .average_years(5)
///     .regression_degree(2)
///     .metrics(vec![WeatherMetric::AverageTemperature, WeatherMetric::Snowfall])
///     .granularity(Granularity::Days)
///     .call()
///     .await?;
/// println!("{} trends", analysis.regression.len());
/// # Ok(())
/// # }
/// ```
pub struct TrendAnalyzer {
    rate_limiter: Arc<RateLimiter>,
    geocoder: Arc<dyn Geocoder>,
    weather: Arc<dyn DailyWeatherSource>,
    orchestrator: RegressionOrchestrator,
}

#[bon]
impl TrendAnalyzer {
    /// Wires an analyzer from its collaborators.
    ///
    /// The rate limiter is shared: pass the same `Arc` to every analyzer that
    /// draws from the same upstream budget.
    pub fn new(
        rate_limiter: Arc<RateLimiter>,
        geocoder: Arc<dyn Geocoder>,
        weather: Arc<dyn DailyWeatherSource>,
        solver: Arc<dyn RegressionSolver>,
    ) -> Self {
        Self {
            rate_limiter,
            geocoder,
            weather,
            orchestrator: RegressionOrchestrator::new(solver),
        }
    }

    /// Builds an analyzer with the HTTP collaborators described by `config`.
    ///
    /// Geocoding results are cached in memory for the analyzer's lifetime.
    ///
    /// # Errors
    ///
    /// Returns [`TrendError::ClientBuild`] if the HTTP client cannot be constructed.
    pub fn from_config(config: &Config) -> Result<Self, TrendError> {
        let client = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .gzip(true)
            .build()
            .map_err(TrendError::ClientBuild)?;

        let geocoder = HttpGeocoder::new(
            client.clone(),
            &config.geocoder_url,
            &config.geocoder_api_key,
        );
        let weather = OpenMeteoClient::new(client.clone(), &config.weather_archive_url, config.units);
        let solver = HttpRegressionSolver::new(client, &config.regression_api_url);

        Ok(Self::new(
            Arc::new(RateLimiter::with_limits(config.rate_limits)),
            Arc::new(CachedGeocoder::new(Arc::new(geocoder))),
            Arc::new(weather),
            Arc::new(solver),
        ))
    }

    pub fn rate_limiter(&self) -> &Arc<RateLimiter> {
        &self.rate_limiter
    }

    /// Analyzes long-term weather trends for a place.
    ///
    /// This method uses a builder pattern.
    ///
    /// # Arguments
    ///
    /// * `.location(impl Into<String>)`: **Required.** Free-form place name, resolved through the geocoder.
    /// * `.start_year(i32)`: **Required.** First year of the analysed range.
    /// * `.end_year(i32)`: **Required.** Last year of the analysed range, at most the current year.
    /// * `.average_years(u32)`: **Required.** Length of the trailing smoothing window in years.
    /// * `.regression_degree(u32)`: **Required.** Degree of the fitted polynomial.
    /// * `.metrics(Vec<WeatherMetric>)`: **Required.** Metrics to fetch and fit.
    /// * `.granularity(Granularity)`: Optional. Defaults to [`Granularity::Days`].
    /// * `.alpha(f64)`: Optional. Significance threshold, defaults to [`DEFAULT_ALPHA`].
    ///
    /// # Errors
    ///
    /// See [`TrendAnalyzer::run`].
    #[builder]
    pub async fn analyze(
        &self,
        #[builder(into)] location: String,
        start_year: i32,
        end_year: i32,
        average_years: u32,
        regression_degree: u32,
        metrics: Vec<WeatherMetric>,
        granularity: Option<Granularity>,
        alpha: Option<f64>,
    ) -> Result<WeatherAnalysis, TrendError> {
        let request = AnalysisRequest {
            location,
            start_year,
            end_year,
            average_years,
            regression_degree,
            metrics,
            granularity: granularity.unwrap_or_default(),
            alpha: alpha.unwrap_or(DEFAULT_ALPHA),
        };
        self.run(&request).await
    }

    /// Runs one analysis.
    ///
    /// # Errors
    ///
    /// * [`TrendError::InvalidInput`] if the request is inconsistent. Checked before
    ///   the request counts against the rate limit.
    /// * [`TrendError::RateLimitExceeded`] if the limiter rejects the call. No
    ///   external service is contacted in that case.
    /// * [`TrendError::GeocodingFailed`], [`TrendError::WeatherFetchFailed`] or
    ///   [`TrendError::RegressionFailed`] when the matching step fails.
    pub async fn run(&self, request: &AnalysisRequest) -> Result<WeatherAnalysis, TrendError> {
        validate_request(request, Utc::now().year())?;

        if !self.rate_limiter.admit() {
            let usage = self.rate_limiter.usage();
            warn!("Rejecting analysis for '{}': {}", request.location, usage);
            return Err(TrendError::RateLimitExceeded { usage });
        }

        info!(
            "Analyzing {} metrics for '{}' from {} to {} ({}-year {} averages, degree {})",
            request.metrics.len(),
            request.location,
            request.start_year,
            request.end_year,
            request.average_years,
            request.granularity,
            request.regression_degree
        );

        let location = self.geocoder.geocode(&request.location).await?;
        debug!(
            "'{}' resolved to ({}, {})",
            request.location,
            location.coordinates.latitude(),
            location.coordinates.longitude()
        );

        let fetch_start = fetch_start_year(request).ok_or_else(|| {
            invalid(format!("{} average years reach too far back", request.average_years))
        })?;
        let raw = self
            .weather
            .fetch(location.coordinates, fetch_start, request.end_year, &request.metrics)
            .await?;
        debug!("Fetched {} raw samples from {}", raw.len(), fetch_start);

        let historical_data = match request.granularity {
            Granularity::Days => {
                let (start, end) = analysis_dates(request)?;
                average_window(&raw, start, end, window_size_days(request.average_years))?
            }
            Granularity::CalendarYears => average_by_year(
                &raw,
                request.start_year,
                request.end_year,
                request.average_years,
            )?,
        };

        let regression = self
            .orchestrator
            .regress(
                &historical_data,
                request.regression_degree,
                &request.metrics,
                request.alpha,
            )
            .await?;

        info!(
            "Analysis for '{}' done: {} averaged samples, {} trends",
            request.location,
            historical_data.len(),
            regression.len()
        );

        Ok(WeatherAnalysis {
            historical_data,
            regression,
            location_name: location.display_name,
        })
    }
}

/// First year to fetch raw data for, so the earliest window has data behind it.
///
/// `None` when that year lies outside the calendar chrono can represent.
fn fetch_start_year(request: &AnalysisRequest) -> Option<i32> {
    let lookback = match request.granularity {
        Granularity::Days => request.average_years,
        Granularity::CalendarYears => request.average_years.saturating_sub(1),
    };
    let year = i32::try_from(i64::from(request.start_year) - i64::from(lookback)).ok()?;
    NaiveDate::from_ymd_opt(year, 1, 1).map(|_| year)
}

fn analysis_dates(request: &AnalysisRequest) -> Result<(NaiveDate, NaiveDate), TrendError> {
    let start = NaiveDate::from_ymd_opt(request.start_year, 1, 1)
        .ok_or_else(|| invalid(format!("start year {} is out of range", request.start_year)))?;
    let end = NaiveDate::from_ymd_opt(request.end_year, 12, 31)
        .ok_or_else(|| invalid(format!("end year {} is out of range", request.end_year)))?;
    Ok((start, end))
}

/// Number of averaged points each metric's series will have.
fn points_per_metric(request: &AnalysisRequest) -> Result<i64, TrendError> {
    match request.granularity {
        Granularity::Days => {
            let (start, end) = analysis_dates(request)?;
            Ok((end - start).num_days() + 1)
        }
        Granularity::CalendarYears => {
            Ok(request.end_year as i64 - request.start_year as i64 + 1)
        }
    }
}

fn invalid(message: String) -> TrendError {
    TrendError::InvalidInput(message)
}

fn validate_request(request: &AnalysisRequest, current_year: i32) -> Result<(), TrendError> {
    if request.location.trim().is_empty() {
        return Err(invalid("location must not be empty".to_string()));
    }
    if request.start_year > request.end_year {
        return Err(invalid(format!(
            "start year {} is after end year {}",
            request.start_year, request.end_year
        )));
    }
    if request.end_year > current_year {
        return Err(invalid(format!(
            "end year {} is in the future",
            request.end_year
        )));
    }
    if request.average_years < 1 {
        return Err(invalid("average years must be at least 1".to_string()));
    }
    if request.regression_degree < 1 {
        return Err(invalid("regression degree must be at least 1".to_string()));
    }
    if request.metrics.is_empty() {
        return Err(invalid("at least one metric is required".to_string()));
    }
    if !(request.alpha > 0.0 && request.alpha < 1.0) {
        return Err(invalid(format!(
            "alpha must be between 0 and 1, got {}",
            request.alpha
        )));
    }
    if fetch_start_year(request).is_none() {
        return Err(invalid(format!(
            "{} average years reach back before the earliest supported year",
            request.average_years
        )));
    }
    let points = points_per_metric(request)?;
    if request.regression_degree as i64 >= points {
        return Err(invalid(format!(
            "degree {} needs more than the {} averaged points per metric",
            request.regression_degree, points
        )));
    }
    Ok(())
}
