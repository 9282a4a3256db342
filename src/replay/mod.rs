//! Exact-timestamp and range replay of stored telemetry.

use chrono::{DateTime, Utc};
use std::sync::Arc;
use tracing::debug;

use crate::domain::{format_timestamp, parse_timestamp, Plant, TelemetryPoint};
use crate::error::QueryError;
use crate::repo::PointStore;

/// Result of a replay query: either matching points or a clean miss.
#[derive(Debug, Clone, PartialEq)]
pub enum ReplayOutcome {
    Found(Vec<TelemetryPoint>),
    NoData,
}

impl ReplayOutcome {
    fn from_points(points: Vec<TelemetryPoint>) -> Self {
        if points.is_empty() {
            ReplayOutcome::NoData
        } else {
            ReplayOutcome::Found(points)
        }
    }

    pub fn points(&self) -> &[TelemetryPoint] {
        match self {
            ReplayOutcome::Found(points) => points,
            ReplayOutcome::NoData => &[],
        }
    }

    pub fn is_no_data(&self) -> bool {
        matches!(self, ReplayOutcome::NoData)
    }
}

#[derive(Clone)]
pub struct ReplayResolver {
    store: Arc<dyn PointStore>,
}

impl ReplayResolver {
    pub fn new(store: Arc<dyn PointStore>) -> Self {
        Self { store }
    }

    /// All inverters' readings for `plant` at exactly `timestamp`.
    ///
    /// Off-grid timestamps are legal and simply resolve to `NoData`.
    pub async fn resolve(
        &self,
        plant: Plant,
        timestamp: DateTime<Utc>,
    ) -> Result<ReplayOutcome, QueryError> {
        let points = self.store.query_exact(plant, timestamp).await?;
        debug!(%plant, timestamp = %format_timestamp(timestamp), matched = points.len(), "replay resolved");
        Ok(ReplayOutcome::from_points(points))
    }

    /// [`resolve`](Self::resolve) from raw request parameters.
    pub async fn resolve_query(&self, plant: &str, timestamp: &str) -> Result<ReplayOutcome, QueryError> {
        let plant: Plant = plant.parse()?;
        let timestamp = parse_timestamp(timestamp)?;
        self.resolve(plant, timestamp).await
    }

    /// Every reading of the plant with `start <= time <= end`, time-ordered.
    pub async fn resolve_range(
        &self,
        plant: Plant,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<ReplayOutcome, QueryError> {
        check_range(start, end)?;
        let points = self.store.query_plant_range(plant, start, end).await?;
        Ok(ReplayOutcome::from_points(points))
    }

    /// Source keys present for the plant, ascending.
    pub async fn panels(&self, plant: Plant) -> Result<Vec<String>, QueryError> {
        Ok(self.store.source_keys(plant).await?)
    }

    /// One inverter's readings with `start <= time <= end`.
    pub async fn panel_range(
        &self,
        plant: Plant,
        source_key: &str,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<ReplayOutcome, QueryError> {
        check_range(start, end)?;
        let points = self.store.query_range(plant, source_key, start, end).await?;
        Ok(ReplayOutcome::from_points(points))
    }

    /// Keyed lookup of one inverter's record within a resolved snapshot.
    pub fn find_inverter<'a>(points: &'a [TelemetryPoint], source_key: &str) -> Option<&'a TelemetryPoint> {
        points.iter().find(|p| p.source_key == source_key)
    }
}

fn check_range(start: DateTime<Utc>, end: DateTime<Utc>) -> Result<(), QueryError> {
    if start > end {
        return Err(QueryError::InvalidTimestamp(format!(
            "range start {} is after end {}",
            format_timestamp(start),
            format_timestamp(end)
        )));
    }
    Ok(())
}
