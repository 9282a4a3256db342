use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use super::time::format_timestamp;
use crate::error::QueryError;

/// Number of model inputs per time step.
pub const FEATURE_COUNT: usize = 4;

/// Model inputs for one time step, in physical units.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FeatureVector {
    pub timestamp: DateTime<Utc>,
    pub ac_power: f64,
    pub module_temperature: f64,
    pub ambient_temperature: f64,
    pub irradiation: f64,
}

impl FeatureVector {
    /// Inputs in model column order.
    pub fn as_array(&self) -> [f64; FEATURE_COUNT] {
        [
            self.ac_power,
            self.module_temperature,
            self.ambient_temperature,
            self.irradiation,
        ]
    }

    pub fn is_finite(&self) -> bool {
        self.as_array().iter().all(|v| v.is_finite())
    }
}

/// Fixed-length, gap-free history ending at (and including) `anchor`.
///
/// Only constructible through [`FeatureWindow::try_new`], which enforces
/// length, ordering and spacing.
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureWindow {
    anchor: DateTime<Utc>,
    step: Duration,
    vectors: Vec<FeatureVector>,
    scaled: Vec<[f64; FEATURE_COUNT]>,
}

impl FeatureWindow {
    pub fn try_new(
        anchor: DateTime<Utc>,
        step: Duration,
        len: usize,
        vectors: Vec<FeatureVector>,
        scaled: Vec<[f64; FEATURE_COUNT]>,
    ) -> Result<Self, QueryError> {
        if len == 0 || vectors.len() != len || scaled.len() != len {
            return Err(QueryError::DataIntegrity(format!(
                "window at {} has {} vectors ({} scaled), expected {}",
                format_timestamp(anchor),
                vectors.len(),
                scaled.len(),
                len
            )));
        }
        if vectors.last().map(|v| v.timestamp) != Some(anchor) {
            return Err(QueryError::DataIntegrity(format!(
                "window does not end at anchor {}",
                format_timestamp(anchor)
            )));
        }
        if let Some(pair) = vectors.windows(2).find(|w| w[1].timestamp - w[0].timestamp != step) {
            return Err(QueryError::DataIntegrity(format!(
                "window spacing broken between {} and {}",
                format_timestamp(pair[0].timestamp),
                format_timestamp(pair[1].timestamp)
            )));
        }
        Ok(Self {
            anchor,
            step,
            vectors,
            scaled,
        })
    }

    pub fn anchor(&self) -> DateTime<Utc> {
        self.anchor
    }

    pub fn step(&self) -> Duration {
        self.step
    }

    pub fn len(&self) -> usize {
        self.vectors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vectors.is_empty()
    }

    /// Unscaled inputs, oldest first.
    pub fn vectors(&self) -> &[FeatureVector] {
        &self.vectors
    }

    /// Scaled inputs in the shape the model was trained on: `[len][FEATURE_COUNT]`.
    pub fn scaled(&self) -> &[[f64; FEATURE_COUNT]] {
        &self.scaled
    }
}

/// A timestamp for which a complete window could be assembled when the
/// catalog was built.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct PredictionAnchor(pub DateTime<Utc>);

impl PredictionAnchor {
    pub fn timestamp(&self) -> DateTime<Utc> {
        self.0
    }
}

impl Serialize for PredictionAnchor {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&format_timestamp(self.0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn vector(minute: i64) -> FeatureVector {
        FeatureVector {
            timestamp: Utc.with_ymd_and_hms(2020, 5, 15, 0, 0, 0).unwrap() + Duration::minutes(minute),
            ac_power: 1.0,
            module_temperature: 2.0,
            ambient_temperature: 3.0,
            irradiation: 4.0,
        }
    }

    #[test]
    fn test_window_accepts_even_spacing() {
        let vectors: Vec<_> = [0, 15, 30].into_iter().map(vector).collect();
        let scaled = vec![[0.0; FEATURE_COUNT]; 3];
        let anchor = vectors[2].timestamp;
        let w = FeatureWindow::try_new(anchor, Duration::minutes(15), 3, vectors, scaled).unwrap();
        assert_eq!(w.len(), 3);
        assert_eq!(w.anchor(), anchor);
    }

    #[test]
    fn test_window_rejects_gap() {
        let vectors: Vec<_> = [0, 15, 45].into_iter().map(vector).collect();
        let scaled = vec![[0.0; FEATURE_COUNT]; 3];
        let anchor = vectors[2].timestamp;
        let err = FeatureWindow::try_new(anchor, Duration::minutes(15), 3, vectors, scaled).unwrap_err();
        assert!(matches!(err, QueryError::DataIntegrity(_)));
    }

    #[test]
    fn test_window_rejects_wrong_length() {
        let vectors: Vec<_> = [0, 15].into_iter().map(vector).collect();
        let scaled = vec![[0.0; FEATURE_COUNT]; 2];
        let anchor = vectors[1].timestamp;
        assert!(FeatureWindow::try_new(anchor, Duration::minutes(15), 3, vectors, scaled).is_err());
    }

    #[test]
    fn test_anchor_serializes_as_iso() {
        let a = PredictionAnchor(vector(15).timestamp);
        assert_eq!(serde_json::to_string(&a).unwrap(), "\"2020-05-15T00:15:00Z\"");
    }
}
