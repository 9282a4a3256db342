//! Telemetry point store boundary and its in-process implementation.

pub mod export;
pub mod memory;

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::path::Path;
use strum::IntoEnumIterator;
use tracing::{info, warn};

use crate::config::DataConfig;
use crate::domain::{Plant, TelemetryPoint};

pub use memory::InMemoryPointStore;

/// Read-only time-series store keyed by (plant, source key, timestamp).
///
/// All range bounds are inclusive.
#[async_trait]
pub trait PointStore: Send + Sync {
    /// Every inverter's reading at exactly `timestamp`, ordered by source key.
    async fn query_exact(&self, plant: Plant, timestamp: DateTime<Utc>) -> Result<Vec<TelemetryPoint>>;

    /// One inverter's readings in `[start, end]`, ascending by time.
    async fn query_range(
        &self,
        plant: Plant,
        source_key: &str,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<TelemetryPoint>>;

    /// Every inverter's readings in `[start, end]`, ascending by time then source key.
    async fn query_plant_range(
        &self,
        plant: Plant,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<TelemetryPoint>>;

    /// Distinct source keys with at least one point, ascending.
    async fn source_keys(&self, plant: Plant) -> Result<Vec<String>>;

    async fn has_source(&self, plant: Plant, source_key: &str) -> Result<bool> {
        Ok(self
            .source_keys(plant)
            .await?
            .iter()
            .any(|k| k == source_key))
    }
}

fn configured_path(cfg: &DataConfig, plant: Plant) -> Option<&Path> {
    match plant {
        Plant::Plant1 => cfg.plant1_csv.as_deref(),
        Plant::Plant2 => cfg.plant2_csv.as_deref(),
    }
}

/// Build the in-memory store from the configured per-plant exports.
///
/// A plant whose export is unset or missing on disk stays empty.
pub async fn load_store(cfg: &DataConfig) -> Result<InMemoryPointStore> {
    let store = InMemoryPointStore::new();

    for plant in Plant::iter() {
        let Some(path) = configured_path(cfg, plant) else {
            warn!(%plant, "no telemetry export configured");
            continue;
        };
        if !path.exists() {
            warn!(%plant, path = %path.display(), "telemetry export not found, plant left empty");
            continue;
        }

        let owned = path.to_path_buf();
        let points = tokio::task::spawn_blocking(move || export::load_plant_csv(&owned, plant))
            .await
            .context("telemetry loader task panicked")??;

        info!(%plant, points = points.len(), path = %path.display(), "telemetry loaded");
        store.extend(points);
    }

    Ok(store)
}
