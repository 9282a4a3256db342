use axum::{
    extract::{Query, State},
    Json,
};
use serde::{Deserialize, Serialize};

use super::{default_plant, error::ApiError};
use crate::domain::PredictionAnchor;
use crate::forecast::Prediction;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct TimestampsQuery {
    #[serde(default = "default_plant")]
    pub plant: String,
    pub inverter: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct TimestampsResponse {
    pub plant: u8,
    pub inverter: String,
    pub sequence_length: usize,
    pub count: usize,
    pub first: Option<PredictionAnchor>,
    pub last: Option<PredictionAnchor>,
    pub timestamps: Vec<PredictionAnchor>,
}

fn required(value: Option<String>, name: &str) -> Result<String, ApiError> {
    value
        .filter(|v| !v.trim().is_empty())
        .ok_or_else(|| ApiError::BadRequest(format!("{name} is required")))
}

/// GET /predict/timestamps - anchors with a complete history window, ascending
pub async fn timestamps(
    State(st): State<AppState>,
    Query(q): Query<TimestampsQuery>,
) -> Result<Json<TimestampsResponse>, ApiError> {
    let inverter = required(q.inverter, "inverter")?;
    let catalog = st.predictions.catalog_query(&q.plant, &inverter).await?;

    Ok(Json(TimestampsResponse {
        plant: catalog.plant.number(),
        inverter,
        sequence_length: catalog.spec.len,
        count: catalog.len(),
        first: catalog.first(),
        last: catalog.last(),
        timestamps: catalog.anchors().to_vec(),
    }))
}

#[derive(Debug, Deserialize)]
pub struct GenerateQuery {
    #[serde(default = "default_plant")]
    pub plant: String,
    pub inverter: Option<String>,
    #[serde(default)]
    pub timestamp: String,
}

/// GET /predict/generate - forecast AC power from the window ending at `timestamp`
pub async fn generate(
    State(st): State<AppState>,
    Query(q): Query<GenerateQuery>,
) -> Result<Json<Prediction>, ApiError> {
    let inverter = required(q.inverter, "inverter")?;
    let prediction = st
        .predictions
        .predict_query(&q.plant, &inverter, &q.timestamp)
        .await?;
    Ok(Json(prediction))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_required_rejects_blank() {
        assert!(required(None, "inverter").is_err());
        assert!(required(Some("  ".into()), "inverter").is_err());
        assert_eq!(required(Some("7".into()), "inverter").unwrap(), "7");
    }
}
