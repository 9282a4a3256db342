#![allow(dead_code)]

use chrono::{DateTime, Duration, TimeZone, Utc};
use solar_twin::domain::{Plant, TelemetryPoint};
use solar_twin::forecast::{FeatureScaling, Forecaster, LinearWindowForecaster, WindowSpec};
use solar_twin::repo::InMemoryPointStore;
use solar_twin::state::AppState;
use std::collections::HashMap;
use std::sync::Arc;

pub const SEQUENCE_LENGTH: usize = 24;

pub fn day_start() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2020, 5, 15, 0, 0, 0).unwrap()
}

pub fn at(minute: i64) -> DateTime<Utc> {
    day_start() + Duration::minutes(minute)
}

/// A bell-shaped AC curve so every slot carries a distinct value.
pub fn ac_at(slot: i64) -> f64 {
    let x = (slot as f64 - 48.0) / 20.0;
    (1000.0 * (-x * x).exp() * 100.0).round() / 100.0
}

/// Plant 1 with InverterX on every 15-minute slot of 2020-05-15 and
/// InverterY only in the morning hours.
pub fn full_day_store() -> Arc<InMemoryPointStore> {
    let x = (0..96).map(|slot| {
        TelemetryPoint::new(Plant::Plant1, "InverterX", at(slot * 15), ac_at(slot), 35.0, 27.0, 0.4)
    });
    let y = (0..48).map(|slot| {
        TelemetryPoint::new(Plant::Plant1, "InverterY", at(slot * 15), ac_at(slot) / 2.0, 34.0, 27.0, 0.4)
    });
    Arc::new(InMemoryPointStore::from_points(x.chain(y)))
}

pub fn spec() -> WindowSpec {
    WindowSpec::new(SEQUENCE_LENGTH, 15).unwrap()
}

pub fn state_with(store: Arc<InMemoryPointStore>, forecasters: HashMap<Plant, Arc<dyn Forecaster>>) -> AppState {
    AppState::from_parts(store, spec(), FeatureScaling::default(), forecasters)
}

pub fn persistence_state(store: Arc<InMemoryPointStore>) -> AppState {
    let mut forecasters: HashMap<Plant, Arc<dyn Forecaster>> = HashMap::new();
    forecasters.insert(Plant::Plant1, Arc::new(LinearWindowForecaster::persistence(SEQUENCE_LENGTH)));
    state_with(store, forecasters)
}
