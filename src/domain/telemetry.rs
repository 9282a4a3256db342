use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{FeatureVector, Plant};

/// One sensor reading for one inverter at one instant.
///
/// Measurements are optional because ingested exports contain empty cells;
/// a point with any core measurement missing is still replayable but can
/// never fill a prediction window slot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TelemetryPoint {
    pub plant: Plant,
    pub source_key: String,
    pub timestamp: DateTime<Utc>,
    pub ac_power: Option<f64>,
    pub module_temperature: Option<f64>,
    pub ambient_temperature: Option<f64>,
    pub irradiation: Option<f64>,
    pub dc_power: Option<f64>,
    pub daily_yield: Option<f64>,
    pub total_yield: Option<f64>,
}

impl TelemetryPoint {
    /// Point with the four model inputs set and no auxiliary columns.
    pub fn new(
        plant: Plant,
        source_key: impl Into<String>,
        timestamp: DateTime<Utc>,
        ac_power: f64,
        module_temperature: f64,
        ambient_temperature: f64,
        irradiation: f64,
    ) -> Self {
        Self {
            plant,
            source_key: source_key.into(),
            timestamp,
            ac_power: Some(ac_power),
            module_temperature: Some(module_temperature),
            ambient_temperature: Some(ambient_temperature),
            irradiation: Some(irradiation),
            dc_power: None,
            daily_yield: None,
            total_yield: None,
        }
    }

    /// Unscaled model inputs, or `None` when any of them is missing or not finite.
    pub fn feature_vector(&self) -> Option<FeatureVector> {
        let v = FeatureVector {
            timestamp: self.timestamp,
            ac_power: self.ac_power?,
            module_temperature: self.module_temperature?,
            ambient_temperature: self.ambient_temperature?,
            irradiation: self.irradiation?,
        };
        v.is_finite().then_some(v)
    }

    pub fn is_complete(&self) -> bool {
        self.feature_vector().is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn ts() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2020, 5, 15, 12, 0, 0).unwrap()
    }

    #[test]
    fn test_complete_point_yields_vector() {
        let p = TelemetryPoint::new(Plant::Plant1, "1", ts(), 850.0, 48.0, 29.5, 0.71);
        let v = p.feature_vector().unwrap();
        assert_eq!(v.ac_power, 850.0);
        assert_eq!(v.as_array(), [850.0, 48.0, 29.5, 0.71]);
    }

    #[test]
    fn test_missing_field_is_incomplete() {
        let mut p = TelemetryPoint::new(Plant::Plant1, "1", ts(), 850.0, 48.0, 29.5, 0.71);
        p.irradiation = None;
        assert!(!p.is_complete());
    }

    #[test]
    fn test_nan_field_is_incomplete() {
        let p = TelemetryPoint::new(Plant::Plant1, "1", ts(), f64::NAN, 48.0, 29.5, 0.71);
        assert!(p.feature_vector().is_none());
    }
}
