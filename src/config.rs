use crate::geocoding::geocoder::DEFAULT_GEOCODER_URL;
use crate::rate_limit::limiter::{RateLimits, DAILY_LIMIT, MINUTE_LIMIT};
use crate::weather_data::open_meteo::{UnitSystem, DEFAULT_ARCHIVE_URL};
use log::warn;
use std::env;
use std::time::Duration;
use thiserror::Error;

pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingVariable(String),

    #[error("Invalid configuration value for {name}: {message}")]
    InvalidValue { name: String, message: String },
}

/// Runtime settings of the pipeline's outbound clients and rate limiter.
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub regression_api_url: String,
    pub geocoder_api_key: String,
    pub geocoder_url: String,
    pub weather_archive_url: String,
    pub request_timeout: Duration,
    pub rate_limits: RateLimits,
    pub units: UnitSystem,
}

impl Config {
    /// Reads the configuration from the process environment.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::MissingVariable`] if `REGRESSION_API_URL` or
    /// `GEOCODER_API_KEY` is unset, and [`ConfigError::InvalidValue`] for values
    /// that do not parse.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Builds the configuration from an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let required = |name: &str| {
            lookup(name)
                .filter(|value| !value.trim().is_empty())
                .ok_or_else(|| ConfigError::MissingVariable(name.to_string()))
        };

        let regression_api_url = required("REGRESSION_API_URL")?;
        require_http_url("REGRESSION_API_URL", &regression_api_url)?;
        let geocoder_api_key = required("GEOCODER_API_KEY")?;

        let geocoder_url =
            lookup("GEOCODER_URL").unwrap_or_else(|| DEFAULT_GEOCODER_URL.to_string());
        require_http_url("GEOCODER_URL", &geocoder_url)?;
        let weather_archive_url =
            lookup("WEATHER_ARCHIVE_URL").unwrap_or_else(|| DEFAULT_ARCHIVE_URL.to_string());
        require_http_url("WEATHER_ARCHIVE_URL", &weather_archive_url)?;

        let timeout_secs = parse_or(&lookup, "REQUEST_TIMEOUT_SECS", DEFAULT_TIMEOUT_SECS)?;
        if timeout_secs == 0 {
            return Err(invalid("REQUEST_TIMEOUT_SECS", "must be at least 1"));
        }

        let rate_limits = RateLimits {
            daily: parse_or(&lookup, "DAILY_CALL_LIMIT", DAILY_LIMIT)?,
            per_minute: parse_or(&lookup, "MINUTE_CALL_LIMIT", MINUTE_LIMIT)?,
        };

        let units = match lookup("WEATHER_UNITS") {
            Some(raw) => raw
                .parse::<UnitSystem>()
                .map_err(|message| invalid("WEATHER_UNITS", &message))?,
            None => UnitSystem::default(),
        };

        if rate_limits.daily < rate_limits.per_minute {
            warn!(
                "DAILY_CALL_LIMIT ({}) is below MINUTE_CALL_LIMIT ({})",
                rate_limits.daily, rate_limits.per_minute
            );
        }

        Ok(Self {
            regression_api_url,
            geocoder_api_key,
            geocoder_url,
            weather_archive_url,
            request_timeout: Duration::from_secs(timeout_secs),
            rate_limits,
            units,
        })
    }
}

fn invalid(name: &str, message: &str) -> ConfigError {
    ConfigError::InvalidValue {
        name: name.to_string(),
        message: message.to_string(),
    }
}

fn require_http_url(name: &str, value: &str) -> Result<(), ConfigError> {
    if value.starts_with("http://") || value.starts_with("https://") {
        Ok(())
    } else {
        Err(invalid(name, "must start with http:// or https://"))
    }
}

fn parse_or<F, T>(lookup: &F, name: &str, default: T) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match lookup(name) {
        Some(raw) => raw
            .trim()
            .parse::<T>()
            .map_err(|e| invalid(name, &format!("'{}': {}", raw, e))),
        None => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| vars.get(name).cloned()
    }

    const REQUIRED: [(&str, &str); 2] = [
        ("REGRESSION_API_URL", "http://localhost:8000/regress"),
        ("GEOCODER_API_KEY", "secret"),
    ];

    #[test]
    fn test_defaults() {
        let config = Config::from_lookup(lookup_from(&REQUIRED)).unwrap();

        assert_eq!(config.regression_api_url, "http://localhost:8000/regress");
        assert_eq!(config.geocoder_url, DEFAULT_GEOCODER_URL);
        assert_eq!(config.weather_archive_url, DEFAULT_ARCHIVE_URL);
        assert_eq!(config.request_timeout, Duration::from_secs(30));
        assert_eq!(config.rate_limits, RateLimits::default());
        assert_eq!(config.units, UnitSystem::Imperial);
    }

    #[test]
    fn test_overrides() {
        let mut vars = REQUIRED.to_vec();
        vars.extend([
            ("REQUEST_TIMEOUT_SECS", "5"),
            ("DAILY_CALL_LIMIT", "500"),
            ("MINUTE_CALL_LIMIT", "3"),
            ("WEATHER_UNITS", "metric"),
        ]);
        let config = Config::from_lookup(lookup_from(&vars)).unwrap();

        assert_eq!(config.request_timeout, Duration::from_secs(5));
        assert_eq!(
            config.rate_limits,
            RateLimits {
                daily: 500,
                per_minute: 3
            }
        );
        assert_eq!(config.units, UnitSystem::Metric);
    }

    #[test]
    fn test_missing_required() {
        let err = Config::from_lookup(lookup_from(&[("GEOCODER_API_KEY", "secret")])).unwrap_err();
        assert_eq!(
            err,
            ConfigError::MissingVariable("REGRESSION_API_URL".to_string())
        );

        let err = Config::from_lookup(lookup_from(&[
            ("REGRESSION_API_URL", "http://localhost:8000"),
            ("GEOCODER_API_KEY", "  "),
        ]))
        .unwrap_err();
        assert_eq!(err, ConfigError::MissingVariable("GEOCODER_API_KEY".to_string()));
    }

    #[test]
    fn test_invalid_values() {
        let cases = [
            ("REGRESSION_API_URL", "localhost:8000"),
            ("REQUEST_TIMEOUT_SECS", "soon"),
            ("REQUEST_TIMEOUT_SECS", "0"),
            ("MINUTE_CALL_LIMIT", "-1"),
            ("WEATHER_UNITS", "kelvin"),
        ];
        for (name, value) in cases {
            let mut vars = REQUIRED.to_vec();
            vars.push((name, value));
            let err = Config::from_lookup(lookup_from(&vars)).unwrap_err();
            assert!(
                matches!(&err, ConfigError::InvalidValue { name: n, .. } if n == name),
                "{}={} gave {:?}",
                name,
                value,
                err
            );
        }
    }
}
