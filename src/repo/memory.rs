use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use std::collections::{BTreeMap, HashMap};

use super::PointStore;
use crate::domain::{Plant, TelemetryPoint};

type SourceIndex = BTreeMap<String, Vec<TelemetryPoint>>;

/// Point store held in memory, one time-sorted series per (plant, source key).
///
/// Duplicate timestamps are kept, not merged, so that consumers which
/// require uniqueness can detect them.
#[derive(Debug, Default)]
pub struct InMemoryPointStore {
    plants: RwLock<HashMap<Plant, SourceIndex>>,
}

impl InMemoryPointStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_points(points: impl IntoIterator<Item = TelemetryPoint>) -> Self {
        let store = Self::new();
        store.extend(points);
        store
    }

    pub fn insert(&self, point: TelemetryPoint) {
        let mut plants = self.plants.write();
        let series = plants
            .entry(point.plant)
            .or_default()
            .entry(point.source_key.clone())
            .or_default();
        let at = series.partition_point(|p| p.timestamp <= point.timestamp);
        series.insert(at, point);
    }

    pub fn extend(&self, points: impl IntoIterator<Item = TelemetryPoint>) {
        for point in points {
            self.insert(point);
        }
    }

    /// Remove every point at `timestamp` for the source; returns how many went.
    pub fn remove(&self, plant: Plant, source_key: &str, timestamp: DateTime<Utc>) -> usize {
        let mut plants = self.plants.write();
        let Some(series) = plants.get_mut(&plant).and_then(|s| s.get_mut(source_key)) else {
            return 0;
        };
        let before = series.len();
        series.retain(|p| p.timestamp != timestamp);
        let removed = before - series.len();

        if series.is_empty() {
            if let Some(sources) = plants.get_mut(&plant) {
                sources.remove(source_key);
            }
        }
        removed
    }

    pub fn len(&self) -> usize {
        self.plants
            .read()
            .values()
            .flat_map(|sources| sources.values())
            .map(Vec::len)
            .sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

fn slice_range(
    series: &[TelemetryPoint],
    start: DateTime<Utc>,
    end: DateTime<Utc>,
) -> &[TelemetryPoint] {
    let lo = series.partition_point(|p| p.timestamp < start);
    let hi = series.partition_point(|p| p.timestamp <= end);
    if lo >= hi {
        &[]
    } else {
        &series[lo..hi]
    }
}

#[async_trait]
impl PointStore for InMemoryPointStore {
    async fn query_exact(&self, plant: Plant, timestamp: DateTime<Utc>) -> Result<Vec<TelemetryPoint>> {
        let plants = self.plants.read();
        Ok(plants
            .get(&plant)
            .map(|sources| {
                sources
                    .values()
                    .flat_map(|series| slice_range(series, timestamp, timestamp).iter().cloned())
                    .collect()
            })
            .unwrap_or_default())
    }

    async fn query_range(
        &self,
        plant: Plant,
        source_key: &str,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<TelemetryPoint>> {
        let plants = self.plants.read();
        Ok(plants
            .get(&plant)
            .and_then(|sources| sources.get(source_key))
            .map(|series| slice_range(series, start, end).to_vec())
            .unwrap_or_default())
    }

    async fn query_plant_range(
        &self,
        plant: Plant,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<TelemetryPoint>> {
        let plants = self.plants.read();
        let mut points: Vec<TelemetryPoint> = plants
            .get(&plant)
            .map(|sources| {
                sources
                    .values()
                    .flat_map(|series| slice_range(series, start, end).iter().cloned())
                    .collect()
            })
            .unwrap_or_default();
        // Sources are visited in key order, so a stable sort by time keeps
        // the key order within each instant.
        points.sort_by_key(|p| p.timestamp);
        Ok(points)
    }

    async fn source_keys(&self, plant: Plant) -> Result<Vec<String>> {
        let plants = self.plants.read();
        Ok(plants
            .get(&plant)
            .map(|sources| sources.keys().cloned().collect())
            .unwrap_or_default())
    }

    async fn has_source(&self, plant: Plant, source_key: &str) -> Result<bool> {
        let plants = self.plants.read();
        Ok(plants
            .get(&plant)
            .is_some_and(|sources| sources.contains_key(source_key)))
    }
}
