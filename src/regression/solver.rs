//! The numeric solver seam: an unweighted least-squares polynomial fit with an
//! F-test for overall significance, computed by an external service.

use crate::regression::error::RegressionError;
use crate::types::metric::WeatherMetric;
use async_trait::async_trait;
use log::{debug, warn};
use reqwest::Client;
use serde::{Deserialize, Serialize};

/// Payload sent to the solver. `x` is in days since the series' base date.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SolverRequest {
    pub x: Vec<f64>,
    pub y: Vec<f64>,
    pub degree: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FTest {
    #[serde(alias = "pValue")]
    pub p_value: f64,
    #[serde(rename = "f_stat", alias = "fStatistic")]
    pub f_statistic: f64,
}

/// What the solver answers. Accepts both snake_case and camelCase field names.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PolynomialFit {
    /// Ascending power order.
    pub coefficients: Vec<f64>,
    #[serde(alias = "rSquared")]
    pub r_squared: f64,
    #[serde(alias = "testResults")]
    pub test_results: FTest,
}

impl PolynomialFit {
    /// Rejects answers that cannot be turned into a trend.
    pub fn validate(&self) -> Result<(), RegressionError> {
        if self.coefficients.is_empty() {
            return Err(RegressionError::MalformedResponse(
                "no coefficients".to_string(),
            ));
        }
        let p_value = self.test_results.p_value;
        if !p_value.is_finite() || !(0.0..=1.0).contains(&p_value) {
            return Err(RegressionError::MalformedResponse(format!(
                "p-value {} is not a probability",
                p_value
            )));
        }
        Ok(())
    }
}

#[async_trait]
pub trait RegressionSolver: Send + Sync {
    /// Fits `request`. `metric` only identifies the series for logging and tracing.
    async fn fit(
        &self,
        metric: WeatherMetric,
        request: &SolverRequest,
    ) -> Result<PolynomialFit, RegressionError>;
}

/// [`RegressionSolver`] that POSTs the request as JSON to a solver endpoint.
pub struct HttpRegressionSolver {
    client: Client,
    url: String,
}

impl HttpRegressionSolver {
    pub fn new(client: Client, url: impl Into<String>) -> Self {
        Self {
            client,
            url: url.into(),
        }
    }
}

#[async_trait]
impl RegressionSolver for HttpRegressionSolver {
    async fn fit(
        &self,
        metric: WeatherMetric,
        request: &SolverRequest,
    ) -> Result<PolynomialFit, RegressionError> {
        debug!(
            "Requesting degree {} fit of {} over {} points from {}",
            request.degree,
            metric,
            request.x.len(),
            self.url
        );
        let response = self
            .client
            .post(&self.url)
            .json(request)
            .send()
            .await
            .map_err(|e| RegressionError::NetworkRequest(self.url.clone(), e))?;

        let response = match response.error_for_status() {
            Ok(resp) => resp,
            Err(e) => {
                warn!("HTTP error for {}: {:?}", self.url, e);
                return Err(if let Some(status) = e.status() {
                    RegressionError::HttpStatus {
                        url: self.url.clone(),
                        status,
                        source: e,
                    }
                } else {
                    RegressionError::NetworkRequest(self.url.clone(), e)
                });
            }
        };

        response.json().await.map_err(RegressionError::Decode)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_wire_format() {
        let request = SolverRequest {
            x: vec![0.0, 366.0],
            y: vec![15.1, 15.5],
            degree: 1,
        };
        assert_eq!(
            serde_json::to_value(&request).unwrap(),
            serde_json::json!({"x": [0.0, 366.0], "y": [15.1, 15.5], "degree": 1})
        );
    }

    #[test]
    fn test_response_accepts_both_spellings() {
        let snake: PolynomialFit = serde_json::from_str(
            r#"{"coefficients": [1.0, 0.5], "r_squared": 0.9, "test_results": {"p_value": 0.01, "f_stat": 40.0}}"#,
        )
        .unwrap();
        let camel: PolynomialFit = serde_json::from_str(
            r#"{"coefficients": [1.0, 0.5], "rSquared": 0.9, "testResults": {"pValue": 0.01, "fStatistic": 40.0}}"#,
        )
        .unwrap();
        assert_eq!(snake, camel);
        assert_eq!(snake.test_results.f_statistic, 40.0);
    }

    #[test]
    fn test_validate() {
        let fit = |coefficients: Vec<f64>, p_value: f64| PolynomialFit {
            coefficients,
            r_squared: 0.5,
            test_results: FTest {
                p_value,
                f_statistic: 1.0,
            },
        };
        assert!(fit(vec![1.0], 0.2).validate().is_ok());
        assert!(fit(vec![], 0.2).validate().is_err());
        assert!(fit(vec![1.0], f64::NAN).validate().is_err());
        assert!(fit(vec![1.0], 1.5).validate().is_err());
    }
}
