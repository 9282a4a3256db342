use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use serde::Serialize;
use strum::IntoEnumIterator;

use crate::domain::Plant;
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct BannerResponse {
    message: &'static str,
}

/// GET / - service banner
pub async fn root() -> impl IntoResponse {
    Json(BannerResponse {
        message: "Solar Twin backend is running",
    })
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    status: &'static str,
    timestamp: chrono::DateTime<chrono::Utc>,
    plants: Vec<PlantHealth>,
}

#[derive(Debug, Serialize)]
pub struct PlantHealth {
    plant: u8,
    inverters: usize,
    model: bool,
}

/// GET /healthz - per-plant data and model availability
pub async fn healthz(State(st): State<AppState>) -> impl IntoResponse {
    let mut plants = Vec::new();
    for plant in Plant::iter() {
        let inverters = match st.replay.panels(plant).await {
            Ok(keys) => keys.len(),
            Err(e) => {
                tracing::warn!(%plant, error = %e, "health check could not list inverters");
                return (
                    StatusCode::SERVICE_UNAVAILABLE,
                    Json(HealthResponse {
                        status: "unhealthy",
                        timestamp: chrono::Utc::now(),
                        plants: Vec::new(),
                    }),
                );
            }
        };
        plants.push(PlantHealth {
            plant: plant.number(),
            inverters,
            model: st.predictions.has_model(plant),
        });
    }

    let status = if plants.iter().all(|p| p.inverters > 0 && p.model) {
        "healthy"
    } else {
        "degraded"
    };
    (
        StatusCode::OK,
        Json(HealthResponse {
            status,
            timestamp: chrono::Utc::now(),
            plants,
        }),
    )
}
