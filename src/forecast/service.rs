use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{info, warn};

use super::{CatalogCache, FeatureWindowAssembler, Forecaster, TimestampCatalog};
use crate::domain::{format_timestamp, parse_timestamp, Plant};
use crate::error::QueryError;

/// Forecast for the step following `anchor`, in physical units.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Prediction {
    pub plant: Plant,
    pub inverter: String,
    #[serde(serialize_with = "serialize_ts")]
    pub anchor: DateTime<Utc>,
    pub predicted_ac_power: f64,
    /// Model output before inverse scaling.
    pub raw_score: f64,
}

fn serialize_ts<S: serde::Serializer>(ts: &DateTime<Utc>, s: S) -> Result<S::Ok, S::Error> {
    s.serialize_str(&format_timestamp(*ts))
}

/// Catalog lookup plus assemble → predict → unscale for each request.
pub struct PredictionService {
    catalogs: Arc<CatalogCache>,
    assembler: FeatureWindowAssembler,
    forecasters: HashMap<Plant, Arc<dyn Forecaster>>,
}

impl PredictionService {
    pub fn new(
        catalogs: Arc<CatalogCache>,
        assembler: FeatureWindowAssembler,
        forecasters: HashMap<Plant, Arc<dyn Forecaster>>,
    ) -> Self {
        Self {
            catalogs,
            assembler,
            forecasters,
        }
    }

    pub fn sequence_length(&self) -> usize {
        self.assembler.spec().len
    }

    pub fn has_model(&self, plant: Plant) -> bool {
        self.forecasters.contains_key(&plant)
    }

    pub async fn catalog(&self, plant: Plant, inverter: &str) -> Result<Arc<TimestampCatalog>, QueryError> {
        self.catalogs.get_or_build(plant, inverter).await
    }

    pub async fn catalog_query(&self, plant: &str, inverter: &str) -> Result<Arc<TimestampCatalog>, QueryError> {
        let plant: Plant = plant.parse()?;
        self.catalog(plant, inverter).await
    }

    pub async fn predict(
        &self,
        plant: Plant,
        inverter: &str,
        anchor: DateTime<Utc>,
    ) -> Result<Prediction, QueryError> {
        let window = self.assembler.assemble(plant, inverter, anchor).await?;
        let model = self
            .forecasters
            .get(&plant)
            .cloned()
            .ok_or_else(|| QueryError::ForecasterUnavailable(format!("no model configured for {plant}")))?;

        // Run on its own task so a panicking model surfaces as an error.
        let raw_score = match tokio::spawn(async move { model.predict(&window).await }).await {
            Ok(Ok(score)) => score,
            Ok(Err(e)) => {
                warn!(%plant, inverter, error = %format!("{e:#}"), "forecaster failed");
                return Err(QueryError::ForecasterUnavailable(format!("{e:#}")));
            }
            Err(join) => {
                warn!(%plant, inverter, error = %join, "forecaster task aborted");
                return Err(QueryError::ForecasterUnavailable(join.to_string()));
            }
        };
        if !raw_score.is_finite() {
            return Err(QueryError::ForecasterUnavailable(format!(
                "model returned non-finite score {raw_score}"
            )));
        }

        let predicted_ac_power = self.assembler.scaling().unscale_output(raw_score);
        info!(%plant, inverter, anchor = %format_timestamp(anchor), predicted_ac_power, "prediction served");

        Ok(Prediction {
            plant,
            inverter: inverter.to_string(),
            anchor,
            predicted_ac_power,
            raw_score,
        })
    }

    /// [`predict`](Self::predict) from raw request parameters.
    pub async fn predict_query(
        &self,
        plant: &str,
        inverter: &str,
        timestamp: &str,
    ) -> Result<Prediction, QueryError> {
        let plant: Plant = plant.parse()?;
        let anchor = parse_timestamp(timestamp)?;
        self.predict(plant, inverter, anchor).await
    }
}
