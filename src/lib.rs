mod averaging;
mod config;
mod error;
mod geocoding;
mod rate_limit;
mod regression;
mod trend_analyzer;
mod types;
mod utils;
mod weather_data;

#[cfg(test)]
mod test_support;

pub use config::{Config, ConfigError};
pub use error::TrendError;
pub use trend_analyzer::TrendAnalyzer;

pub use types::analysis::{AnalysisRequest, Granularity, UnknownGranularity, WeatherAnalysis, DEFAULT_ALPHA};
pub use types::location::{GeocodedLocation, LatLon};
pub use types::metric::{UnknownMetric, WeatherMetric};
pub use types::regression_result::{RegressionResult, TestResults};
pub use types::sample::{AveragedSample, MetricSample};

pub use rate_limit::clock::{Clock, SystemClock};
pub use rate_limit::limiter::{RateLimiter, RateLimits, Usage, DAILY_LIMIT, MINUTE_LIMIT};

pub use averaging::window::{average_window, window_size_days};
pub use averaging::yearly::average_by_year;

pub use geocoding::cache::{CachedGeocoder, DEFAULT_CACHE_CAPACITY, DEFAULT_CACHE_TTL};
pub use geocoding::geocoder::{Geocoder, HttpGeocoder, DEFAULT_GEOCODER_URL};
pub use weather_data::open_meteo::{OpenMeteoClient, UnitSystem, DEFAULT_ARCHIVE_URL};
pub use weather_data::source::DailyWeatherSource;
pub use regression::orchestrator::{MetricSeries, RegressionOrchestrator};
pub use regression::solver::{FTest, HttpRegressionSolver, PolynomialFit, RegressionSolver, SolverRequest};

pub use averaging::error::AveragingError;
pub use geocoding::error::GeocodeError;
pub use regression::error::RegressionError;
pub use weather_data::error::WeatherDataError;
