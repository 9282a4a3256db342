//! Frozen feature scaling shared with the training pipeline.

use serde::{Deserialize, Serialize};

use crate::domain::{FeatureVector, FEATURE_COUNT};

/// Linear min-max transform onto `[0, 1]` with bounds fixed at training time.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MinMaxScaler {
    pub min: f64,
    pub max: f64,
}

impl MinMaxScaler {
    pub const fn new(min: f64, max: f64) -> Self {
        Self { min, max }
    }

    fn range(&self) -> f64 {
        self.max - self.min
    }

    pub fn is_valid(&self) -> bool {
        self.min.is_finite() && self.max.is_finite() && self.range() > 1e-10
    }

    pub fn transform(&self, value: f64) -> f64 {
        if self.range().abs() < 1e-10 {
            return 0.5;
        }
        (value - self.min) / self.range()
    }

    pub fn inverse(&self, scaled: f64) -> f64 {
        scaled * self.range() + self.min
    }
}

/// One scaler per model input. Output is in scaled AC power units.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FeatureScaling {
    pub ac_power: MinMaxScaler,
    pub module_temperature: MinMaxScaler,
    pub ambient_temperature: MinMaxScaler,
    pub irradiation: MinMaxScaler,
}

impl Default for FeatureScaling {
    /// Bounds observed over the Plant 1 training set (AC power in kW).
    fn default() -> Self {
        Self {
            ac_power: MinMaxScaler::new(0.0, 1410.0),
            module_temperature: MinMaxScaler::new(18.0, 66.0),
            ambient_temperature: MinMaxScaler::new(20.0, 40.0),
            irradiation: MinMaxScaler::new(0.0, 1.3),
        }
    }
}

impl FeatureScaling {
    fn scalers(&self) -> [MinMaxScaler; FEATURE_COUNT] {
        [
            self.ac_power,
            self.module_temperature,
            self.ambient_temperature,
            self.irradiation,
        ]
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        const NAMES: [&str; FEATURE_COUNT] =
            ["ac_power", "module_temperature", "ambient_temperature", "irradiation"];
        for (name, scaler) in NAMES.iter().zip(self.scalers()) {
            if !scaler.is_valid() {
                anyhow::bail!("scaler {name} has degenerate bounds [{}, {}]", scaler.min, scaler.max);
            }
        }
        Ok(())
    }

    pub fn scale(&self, vector: &FeatureVector) -> [f64; FEATURE_COUNT] {
        let raw = vector.as_array();
        let mut out = [0.0; FEATURE_COUNT];
        for ((slot, value), scaler) in out.iter_mut().zip(raw).zip(self.scalers()) {
            *slot = scaler.transform(value);
        }
        out
    }

    pub fn unscale(&self, scaled: &[f64; FEATURE_COUNT]) -> [f64; FEATURE_COUNT] {
        let mut out = [0.0; FEATURE_COUNT];
        for ((slot, value), scaler) in out.iter_mut().zip(scaled).zip(self.scalers()) {
            *slot = scaler.inverse(*value);
        }
        out
    }

    /// Model output back to physical AC power.
    pub fn unscale_output(&self, raw: f64) -> f64 {
        self.ac_power.inverse(raw)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use proptest::prelude::*;

    fn vector(ac: f64, module: f64, ambient: f64, irr: f64) -> FeatureVector {
        FeatureVector {
            timestamp: Utc.with_ymd_and_hms(2020, 5, 15, 12, 0, 0).unwrap(),
            ac_power: ac,
            module_temperature: module,
            ambient_temperature: ambient,
            irradiation: irr,
        }
    }

    #[test]
    fn test_bounds_map_to_unit_interval() {
        let s = MinMaxScaler::new(20.0, 40.0);
        assert_eq!(s.transform(20.0), 0.0);
        assert_eq!(s.transform(40.0), 1.0);
        assert_eq!(s.transform(30.0), 0.5);
    }

    #[test]
    fn test_out_of_range_values_are_not_clamped() {
        let s = MinMaxScaler::new(0.0, 100.0);
        assert_eq!(s.transform(150.0), 1.5);
        assert_eq!(s.inverse(-0.1), -10.0);
    }

    #[test]
    fn test_known_vector_round_trip() {
        let scaling = FeatureScaling::default();
        let v = vector(920.1, 55.7, 31.2, 0.82);
        let back = scaling.unscale(&scaling.scale(&v));
        for (orig, got) in v.as_array().iter().zip(back) {
            assert!((orig - got).abs() <= 1e-6 * orig.abs().max(1.0));
        }
    }

    #[test]
    fn test_default_scaling_is_valid() {
        assert!(FeatureScaling::default().validate().is_ok());
    }

    #[test]
    fn test_degenerate_scaler_rejected() {
        let mut scaling = FeatureScaling::default();
        scaling.irradiation = MinMaxScaler::new(1.0, 1.0);
        assert!(scaling.validate().is_err());
    }

    proptest! {
        #[test]
        fn prop_scaler_round_trip(
            min in -1000.0f64..1000.0,
            width in 0.01f64..5000.0,
            value in -10_000.0f64..10_000.0,
        ) {
            let s = MinMaxScaler::new(min, min + width);
            let back = s.inverse(s.transform(value));
            prop_assert!((back - value).abs() <= 1e-6 * value.abs().max(1.0));
        }

        #[test]
        fn prop_output_unscale_inverts_ac_scaling(ac in 0.0f64..1500.0) {
            let scaling = FeatureScaling::default();
            let raw = scaling.ac_power.transform(ac);
            prop_assert!((scaling.unscale_output(raw) - ac).abs() <= 1e-6 * ac.max(1.0));
        }
    }
}
