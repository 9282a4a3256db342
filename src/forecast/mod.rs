//! Prediction query core: anchor catalog, feature window assembly, and the
//! boundary to the pre-trained forecaster.

pub mod assembler;
pub mod catalog;
pub mod forecaster;
pub mod scaling;
pub mod service;

use chrono::Duration;

pub use assembler::FeatureWindowAssembler;
pub use catalog::{CatalogCache, CatalogCursor, TimestampCatalog};
pub use forecaster::{Forecaster, LinearWindowForecaster, TfServingForecaster};
pub use scaling::{FeatureScaling, MinMaxScaler};
pub use service::{Prediction, PredictionService};

/// Shape of the model input: `len` consecutive samples `step` apart.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WindowSpec {
    pub len: usize,
    pub step: Duration,
}

impl WindowSpec {
    pub fn new(len: usize, step_minutes: i64) -> anyhow::Result<Self> {
        if len == 0 {
            anyhow::bail!("sequence length must be at least 1");
        }
        if step_minutes <= 0 {
            anyhow::bail!("grid step must be positive, got {step_minutes} minutes");
        }
        Ok(Self {
            len,
            step: Duration::minutes(step_minutes),
        })
    }

    /// Time covered from the first slot to the anchor.
    pub fn span(&self) -> Duration {
        self.step * (self.len as i32 - 1)
    }
}
