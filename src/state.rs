use anyhow::{Context, Result};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use strum::IntoEnumIterator;
use tracing::{info, warn};

use crate::config::{Config, ForecasterConfig};
use crate::domain::Plant;
use crate::forecast::{
    CatalogCache, FeatureScaling, FeatureWindowAssembler, Forecaster, LinearWindowForecaster,
    PredictionService, TfServingForecaster, WindowSpec,
};
use crate::replay::ReplayResolver;
use crate::repo::{self, PointStore};

/// Shared, read-only services handed to every request handler.
#[derive(Clone)]
pub struct AppState {
    pub replay: ReplayResolver,
    pub predictions: Arc<PredictionService>,
}

impl AppState {
    pub async fn new(cfg: &Config) -> Result<Self> {
        let spec = WindowSpec::new(cfg.model.sequence_length, cfg.model.step_minutes)?;
        let scaling: FeatureScaling = cfg.model.scaling.into();
        scaling.validate().context("invalid model scaling")?;

        let store: Arc<dyn PointStore> = Arc::new(repo::load_store(&cfg.data).await?);

        let mut forecasters: HashMap<Plant, Arc<dyn Forecaster>> = HashMap::new();
        for plant in Plant::iter() {
            match cfg.model.forecasters.for_plant(plant) {
                Some(fc) => {
                    let model = build_forecaster(fc, spec.len)
                        .with_context(|| format!("loading forecaster for {plant}"))?;
                    forecasters.insert(plant, model);
                }
                None => warn!(%plant, "no forecaster configured, predictions disabled"),
            }
        }

        info!(sequence_length = spec.len, step_minutes = cfg.model.step_minutes, models = forecasters.len(), "prediction core ready");
        Ok(Self::from_parts(store, spec, scaling, forecasters))
    }

    pub fn from_parts(
        store: Arc<dyn PointStore>,
        spec: WindowSpec,
        scaling: FeatureScaling,
        forecasters: HashMap<Plant, Arc<dyn Forecaster>>,
    ) -> Self {
        let catalogs = Arc::new(CatalogCache::new(Arc::clone(&store), spec));
        let assembler = FeatureWindowAssembler::new(Arc::clone(&store), spec, scaling);
        Self {
            replay: ReplayResolver::new(store),
            predictions: Arc::new(PredictionService::new(catalogs, assembler, forecasters)),
        }
    }
}

fn build_forecaster(cfg: &ForecasterConfig, len: usize) -> Result<Arc<dyn Forecaster>> {
    let model: Arc<dyn Forecaster> = match cfg {
        ForecasterConfig::Linear { weights: Some(path) } => {
            Arc::new(LinearWindowForecaster::from_file(path, len)?)
        }
        ForecasterConfig::Linear { weights: None } => {
            warn!("linear forecaster without weights, using persistence baseline");
            Arc::new(LinearWindowForecaster::persistence(len))
        }
        ForecasterConfig::TfServing { url, timeout_secs } => Arc::new(TfServingForecaster::new(
            url.clone(),
            Duration::from_secs(*timeout_secs),
        )?),
    };
    Ok(model)
}
