//! Enumeration of prediction anchors and client-side navigation over them.

use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tracing::{debug, info};

use super::WindowSpec;
use crate::domain::{format_timestamp, grid_slots, Plant, PredictionAnchor, TelemetryPoint};
use crate::error::QueryError;
use crate::repo::PointStore;

/// Ascending anchors for one (plant, inverter) pair.
#[derive(Debug, Clone, PartialEq)]
pub struct TimestampCatalog {
    pub plant: Plant,
    pub inverter: String,
    pub spec: WindowSpec,
    anchors: Vec<PredictionAnchor>,
}

impl TimestampCatalog {
    pub fn anchors(&self) -> &[PredictionAnchor] {
        &self.anchors
    }

    pub fn len(&self) -> usize {
        self.anchors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.anchors.is_empty()
    }

    pub fn first(&self) -> Option<PredictionAnchor> {
        self.anchors.first().copied()
    }

    pub fn last(&self) -> Option<PredictionAnchor> {
        self.anchors.last().copied()
    }

    pub fn get(&self, index: usize) -> Option<PredictionAnchor> {
        self.anchors.get(index).copied()
    }

    pub fn position(&self, timestamp: DateTime<Utc>) -> Option<usize> {
        self.anchors
            .binary_search(&PredictionAnchor(timestamp))
            .ok()
    }

    pub fn contains(&self, timestamp: DateTime<Utc>) -> bool {
        self.position(timestamp).is_some()
    }

    /// Cursor at the first anchor, or `None` for an empty catalog.
    pub fn cursor(&self) -> Option<CatalogCursor> {
        CatalogCursor::new(self.len())
    }
}

/// Anchors derivable from one inverter's time-ordered points.
///
/// An anchor is a complete point whose own slot and the `len - 1` grid slots
/// before it (`step` apart) all hold complete points. Readings that fall
/// between grid slots neither qualify nor break a window.
pub fn anchors_from_points(
    points: &[TelemetryPoint],
    spec: WindowSpec,
) -> Result<Vec<PredictionAnchor>, QueryError> {
    for pair in points.windows(2) {
        if pair[1].timestamp <= pair[0].timestamp {
            return Err(QueryError::DataIntegrity(format!(
                "inverter {:?} has {} at or before {}",
                pair[1].source_key,
                format_timestamp(pair[1].timestamp),
                format_timestamp(pair[0].timestamp)
            )));
        }
    }

    let complete: HashSet<DateTime<Utc>> = points
        .iter()
        .filter(|p| p.is_complete())
        .map(|p| p.timestamp)
        .collect();

    let anchors = points
        .iter()
        .filter(|p| complete.contains(&p.timestamp))
        .filter(|p| {
            grid_slots(p.timestamp, spec.len, spec.step)
                .map(|slots| slots.iter().all(|slot| complete.contains(slot)))
                .unwrap_or(false)
        })
        .map(|p| PredictionAnchor(p.timestamp))
        .collect();

    Ok(anchors)
}

pub async fn build_catalog(
    store: &dyn PointStore,
    plant: Plant,
    inverter: &str,
    spec: WindowSpec,
) -> Result<TimestampCatalog, QueryError> {
    let points = store
        .query_range(plant, inverter, DateTime::<Utc>::MIN_UTC, DateTime::<Utc>::MAX_UTC)
        .await?;
    if points.is_empty() {
        return Err(QueryError::UnknownInverter {
            plant: plant.to_string(),
            inverter: inverter.to_string(),
        });
    }

    let anchors = anchors_from_points(&points, spec)?;
    info!(%plant, inverter, points = points.len(), anchors = anchors.len(), "catalog built");

    Ok(TimestampCatalog {
        plant,
        inverter: inverter.to_string(),
        spec,
        anchors,
    })
}

/// Index into a catalog; moves clamp at both ends.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CatalogCursor {
    index: usize,
    len: usize,
}

impl CatalogCursor {
    pub fn new(len: usize) -> Option<Self> {
        (len > 0).then_some(Self { index: 0, len })
    }

    pub fn at(index: usize, len: usize) -> Option<Self> {
        (index < len).then_some(Self { index, len })
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn next(self) -> Self {
        Self {
            index: (self.index + 1).min(self.len - 1),
            ..self
        }
    }

    pub fn previous(self) -> Self {
        Self {
            index: self.index.saturating_sub(1),
            ..self
        }
    }

    pub fn is_first(&self) -> bool {
        self.index == 0
    }

    pub fn is_last(&self) -> bool {
        self.index + 1 == self.len
    }
}

type CatalogKey = (Plant, String);

/// Read-through catalog cache keyed by (plant, inverter).
///
/// Entries are built on a miss and kept for the life of the process.
pub struct CatalogCache {
    store: Arc<dyn PointStore>,
    spec: WindowSpec,
    entries: RwLock<HashMap<CatalogKey, Arc<TimestampCatalog>>>,
}

impl CatalogCache {
    pub fn new(store: Arc<dyn PointStore>, spec: WindowSpec) -> Self {
        Self {
            store,
            spec,
            entries: RwLock::new(HashMap::new()),
        }
    }

    pub async fn get_or_build(
        &self,
        plant: Plant,
        inverter: &str,
    ) -> Result<Arc<TimestampCatalog>, QueryError> {
        let key = (plant, inverter.to_string());
        let hit = self.entries.read().get(&key).cloned();
        if let Some(hit) = hit {
            return Ok(hit);
        }

        debug!(%plant, inverter, "catalog cache miss");
        let catalog = Arc::new(build_catalog(self.store.as_ref(), plant, inverter, self.spec).await?);
        self.entries.write().insert(key, Arc::clone(&catalog));
        Ok(catalog)
    }

    pub fn cached(&self) -> usize {
        self.entries.read().len()
    }
}
