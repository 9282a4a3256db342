use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::debug;

use super::{FeatureScaling, WindowSpec};
use crate::domain::{format_timestamp, grid_slots, FeatureWindow, Plant, TelemetryPoint};
use crate::error::QueryError;
use crate::repo::PointStore;

/// Builds model input windows straight from the store.
///
/// Gap-freedom is checked against the store on every call, whether or not
/// the anchor came from a catalog.
#[derive(Clone)]
pub struct FeatureWindowAssembler {
    store: Arc<dyn PointStore>,
    spec: WindowSpec,
    scaling: FeatureScaling,
}

impl FeatureWindowAssembler {
    pub fn new(store: Arc<dyn PointStore>, spec: WindowSpec, scaling: FeatureScaling) -> Self {
        Self {
            store,
            spec,
            scaling,
        }
    }

    pub fn spec(&self) -> WindowSpec {
        self.spec
    }

    pub fn scaling(&self) -> &FeatureScaling {
        &self.scaling
    }

    pub async fn assemble(
        &self,
        plant: Plant,
        inverter: &str,
        anchor: DateTime<Utc>,
    ) -> Result<FeatureWindow, QueryError> {
        let slots = grid_slots(anchor, self.spec.len, self.spec.step)?;
        let start = slots.first().copied().unwrap_or(anchor);

        let points = self.store.query_range(plant, inverter, start, anchor).await?;
        if points.is_empty() && !self.store.has_source(plant, inverter).await? {
            return Err(QueryError::UnknownInverter {
                plant: plant.to_string(),
                inverter: inverter.to_string(),
            });
        }

        let by_time = index_by_time(&points)?;
        let mut vectors = Vec::with_capacity(slots.len());
        for slot in &slots {
            let vector = by_time
                .get(slot)
                .and_then(|p| p.feature_vector())
                .ok_or_else(|| QueryError::IncompleteWindow {
                    inverter: inverter.to_string(),
                    anchor: format_timestamp(anchor),
                    missing: format_timestamp(*slot),
                })?;
            vectors.push(vector);
        }

        let scaled = vectors.iter().map(|v| self.scaling.scale(v)).collect();
        debug!(%plant, inverter, anchor = %format_timestamp(anchor), len = vectors.len(), "window assembled");
        FeatureWindow::try_new(anchor, self.spec.step, self.spec.len, vectors, scaled)
    }
}

fn index_by_time(points: &[TelemetryPoint]) -> Result<HashMap<DateTime<Utc>, &TelemetryPoint>, QueryError> {
    let mut by_time = HashMap::with_capacity(points.len());
    for point in points {
        if by_time.insert(point.timestamp, point).is_some() {
            return Err(QueryError::DataIntegrity(format!(
                "inverter {:?} has duplicate readings at {}",
                point.source_key,
                format_timestamp(point.timestamp)
            )));
        }
    }
    Ok(by_time)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::forecast::catalog::build_catalog;
    use crate::repo::InMemoryPointStore;
    use chrono::{Duration, TimeZone};

    fn at(minute: i64) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2020, 5, 15, 0, 0, 0).unwrap() + Duration::minutes(minute)
    }

    fn point(minute: i64) -> TelemetryPoint {
        TelemetryPoint::new(Plant::Plant1, "X", at(minute), minute as f64, 30.0, 25.0, 0.4)
    }

    fn setup(len: usize, minutes: impl IntoIterator<Item = i64>) -> (Arc<InMemoryPointStore>, FeatureWindowAssembler) {
        let store = Arc::new(InMemoryPointStore::from_points(minutes.into_iter().map(point)));
        let assembler = FeatureWindowAssembler::new(
            store.clone(),
            WindowSpec::new(len, 15).unwrap(),
            FeatureScaling::default(),
        );
        (store, assembler)
    }

    #[tokio::test]
    async fn test_window_shape_and_order() {
        let (_, assembler) = setup(4, (0..10).map(|i| i * 15));
        let window = assembler.assemble(Plant::Plant1, "X", at(90)).await.unwrap();

        assert_eq!(window.len(), 4);
        assert_eq!(window.anchor(), at(90));
        let times: Vec<_> = window.vectors().iter().map(|v| v.timestamp).collect();
        assert_eq!(times, vec![at(45), at(60), at(75), at(90)]);
        assert!(window
            .vectors()
            .windows(2)
            .all(|w| w[1].timestamp - w[0].timestamp == Duration::minutes(15)));
    }

    #[tokio::test]
    async fn test_window_is_scaled_with_frozen_constants() {
        let (_, assembler) = setup(2, [0, 15]);
        let window = assembler.assemble(Plant::Plant1, "X", at(15)).await.unwrap();
        let scaling = FeatureScaling::default();
        assert_eq!(window.scaled()[1][0], scaling.ac_power.transform(15.0));
        assert_eq!(window.scaled()[1][2], scaling.ambient_temperature.transform(25.0));
    }

    #[tokio::test]
    async fn test_deleting_interior_point_makes_window_incomplete() {
        let (store, assembler) = setup(4, (0..6).map(|i| i * 15));
        assert!(assembler.assemble(Plant::Plant1, "X", at(60)).await.is_ok());

        store.remove(Plant::Plant1, "X", at(30));
        let err = assembler.assemble(Plant::Plant1, "X", at(60)).await.unwrap_err();
        match err {
            QueryError::IncompleteWindow { missing, .. } => assert_eq!(missing, "2020-05-15T00:30:00Z"),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_missing_field_is_not_imputed() {
        let (store, assembler) = setup(2, [0]);
        let mut broken = point(15);
        broken.module_temperature = None;
        store.insert(broken);
        assert!(matches!(
            assembler.assemble(Plant::Plant1, "X", at(15)).await,
            Err(QueryError::IncompleteWindow { .. })
        ));
    }

    #[tokio::test]
    async fn test_duplicate_reading_is_integrity_error() {
        let (store, assembler) = setup(2, [0, 15]);
        store.insert(point(15));
        assert!(matches!(
            assembler.assemble(Plant::Plant1, "X", at(15)).await,
            Err(QueryError::DataIntegrity(_))
        ));
    }

    #[tokio::test]
    async fn test_off_grid_reading_inside_window_is_skipped() {
        let (_, assembler) = setup(2, [0, 15, 20, 30]);
        let window = assembler.assemble(Plant::Plant1, "X", at(30)).await.unwrap();
        let times: Vec<_> = window.vectors().iter().map(|v| v.timestamp).collect();
        assert_eq!(times, vec![at(15), at(30)]);
    }

    #[tokio::test]
    async fn test_unknown_inverter() {
        let (_, assembler) = setup(2, [0, 15]);
        assert!(matches!(
            assembler.assemble(Plant::Plant1, "Y", at(15)).await,
            Err(QueryError::UnknownInverter { .. })
        ));
        assert!(matches!(
            assembler.assemble(Plant::Plant2, "X", at(15)).await,
            Err(QueryError::UnknownInverter { .. })
        ));
    }

    #[tokio::test]
    async fn test_known_inverter_outside_history_is_incomplete() {
        let (_, assembler) = setup(2, [0, 15]);
        assert!(matches!(
            assembler.assemble(Plant::Plant1, "X", at(600)).await,
            Err(QueryError::IncompleteWindow { .. })
        ));
    }

    #[tokio::test]
    async fn test_every_catalog_anchor_assembles() {
        let minutes: Vec<i64> = (0..40).filter(|i| i % 11 != 5).map(|i| i * 15).collect();
        let (store, assembler) = setup(4, minutes);
        let catalog = build_catalog(store.as_ref(), Plant::Plant1, "X", assembler.spec())
            .await
            .unwrap();
        assert!(!catalog.is_empty());
        for anchor in catalog.anchors() {
            let window = assembler.assemble(Plant::Plant1, "X", anchor.timestamp()).await.unwrap();
            assert_eq!(window.len(), 4);
        }
    }
}
