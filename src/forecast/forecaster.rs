//! Boundary to the pre-trained sequence model.
//!
//! A forecaster maps a scaled `[len][FEATURE_COUNT]` window to one raw score
//! in scaled AC power units. Any failure here is treated by callers as the
//! model being unavailable.

use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

use crate::domain::{FeatureWindow, FEATURE_COUNT};

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Forecaster: Send + Sync {
    async fn predict(&self, window: &FeatureWindow) -> Result<f64>;
}

/// Linear model over the flattened window: `bias + Σ w[t][f] * x[t][f]`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LinearWindowForecaster {
    pub weights: Vec<[f64; FEATURE_COUNT]>,
    pub bias: f64,
}

impl LinearWindowForecaster {
    pub fn new(weights: Vec<[f64; FEATURE_COUNT]>, bias: f64) -> Self {
        Self { weights, bias }
    }

    /// Baseline that repeats the most recent scaled AC power.
    pub fn persistence(len: usize) -> Self {
        let mut weights = vec![[0.0; FEATURE_COUNT]; len];
        if let Some(last) = weights.last_mut() {
            last[0] = 1.0;
        }
        Self { weights, bias: 0.0 }
    }

    /// Load exported coefficients and check them against the expected window length.
    pub fn from_file(path: &Path, expected_len: usize) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("unable to read model weights {}", path.display()))?;
        let model: Self = serde_json::from_str(&raw)
            .with_context(|| format!("invalid model weights {}", path.display()))?;
        if model.weights.len() != expected_len {
            anyhow::bail!(
                "model {} expects {} steps, configured sequence length is {}",
                path.display(),
                model.weights.len(),
                expected_len
            );
        }
        Ok(model)
    }
}

#[async_trait]
impl Forecaster for LinearWindowForecaster {
    async fn predict(&self, window: &FeatureWindow) -> Result<f64> {
        if window.len() != self.weights.len() {
            anyhow::bail!(
                "window length mismatch: model expects {}, got {}",
                self.weights.len(),
                window.len()
            );
        }
        let score = window
            .scaled()
            .iter()
            .zip(&self.weights)
            .flat_map(|(x, w)| x.iter().zip(w.iter()).map(|(a, b)| a * b))
            .sum::<f64>()
            + self.bias;
        Ok(score)
    }
}

#[derive(Debug, Serialize)]
struct PredictRequest<'a> {
    instances: [&'a [[f64; FEATURE_COUNT]]; 1],
}

#[derive(Debug, Deserialize)]
struct PredictResponse {
    predictions: Vec<serde_json::Value>,
}

/// Remote model served over the TensorFlow Serving REST predict API.
#[derive(Debug, Clone)]
pub struct TfServingForecaster {
    client: reqwest::Client,
    url: String,
}

impl TfServingForecaster {
    pub fn new(url: impl Into<String>, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .context("building model server client")?;
        Ok(Self {
            client,
            url: url.into(),
        })
    }
}

/// First scalar of a prediction that may be nested, e.g. `[[0.42]]`.
fn first_scalar(value: &serde_json::Value) -> Option<f64> {
    match value {
        serde_json::Value::Number(n) => n.as_f64(),
        serde_json::Value::Array(items) => items.first().and_then(first_scalar),
        _ => None,
    }
}

#[async_trait]
impl Forecaster for TfServingForecaster {
    async fn predict(&self, window: &FeatureWindow) -> Result<f64> {
        let body = PredictRequest {
            instances: [window.scaled()],
        };
        let response: PredictResponse = self
            .client
            .post(&self.url)
            .json(&body)
            .send()
            .await
            .with_context(|| format!("model server {} unreachable", self.url))?
            .error_for_status()
            .context("model server rejected request")?
            .json()
            .await
            .context("model server returned malformed JSON")?;

        response
            .predictions
            .first()
            .and_then(first_scalar)
            .context("model server returned no prediction")
    }
}
