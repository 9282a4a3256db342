use axum::{
    extract::{Query, State},
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};

use super::{default_plant, error::ApiError};
use crate::domain::{format_timestamp, parse_timestamp, Plant, TelemetryPoint};
use crate::replay::ReplayOutcome;
use crate::state::AppState;

pub const NO_DATA_AT_TIMESTAMP: &str = "No data found for that timestamp.";
pub const NO_DATA_IN_RANGE: &str = "No data found in the given range.";
pub const NO_PANEL_DATA: &str = "No data for the specified panel in this time range.";

/// One inverter's reading as the visualization consumes it.
#[derive(Debug, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub struct ReplayRecord {
    pub date_time: String,
    pub source_key: String,
    pub ac_power: Option<f64>,
    pub module_temperature: Option<f64>,
    pub ambient_temperature: Option<f64>,
    pub irradiation: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dc_power: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub daily_yield: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total_yield: Option<f64>,
}

impl From<&TelemetryPoint> for ReplayRecord {
    fn from(p: &TelemetryPoint) -> Self {
        Self {
            date_time: format_timestamp(p.timestamp),
            source_key: p.source_key.clone(),
            ac_power: p.ac_power,
            module_temperature: p.module_temperature,
            ambient_temperature: p.ambient_temperature,
            irradiation: p.irradiation,
            dc_power: p.dc_power,
            daily_yield: p.daily_yield,
            total_yield: p.total_yield,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: &'static str,
}

fn outcome_response(outcome: ReplayOutcome, no_data: &'static str) -> Response {
    match outcome {
        ReplayOutcome::Found(points) => {
            Json(points.iter().map(ReplayRecord::from).collect::<Vec<_>>()).into_response()
        }
        ReplayOutcome::NoData => Json(MessageResponse { message: no_data }).into_response(),
    }
}

#[derive(Debug, Deserialize)]
pub struct ReplayQuery {
    #[serde(default = "default_plant")]
    pub plant: String,
    #[serde(default)]
    pub timestamp: String,
}

/// GET /replay - every inverter's reading at one exact instant
pub async fn replay(
    State(st): State<AppState>,
    Query(q): Query<ReplayQuery>,
) -> Result<Response, ApiError> {
    let outcome = st.replay.resolve_query(&q.plant, &q.timestamp).await?;
    Ok(outcome_response(outcome, NO_DATA_AT_TIMESTAMP))
}

#[derive(Debug, Deserialize)]
pub struct RangeQuery {
    #[serde(default = "default_plant")]
    pub plant: String,
    #[serde(default)]
    pub start: String,
    #[serde(default)]
    pub end: String,
}

/// GET /replay_range - every reading of a plant within `[start, end]`
pub async fn replay_range(
    State(st): State<AppState>,
    Query(q): Query<RangeQuery>,
) -> Result<Response, ApiError> {
    let plant: Plant = q.plant.parse()?;
    let start = parse_timestamp(&q.start)?;
    let end = parse_timestamp(&q.end)?;
    let outcome = st.replay.resolve_range(plant, start, end).await?;
    Ok(outcome_response(outcome, NO_DATA_IN_RANGE))
}

#[derive(Debug, Deserialize)]
pub struct PanelsQuery {
    #[serde(default = "default_plant")]
    pub plant: String,
}

#[derive(Debug, Serialize)]
pub struct PanelsResponse {
    pub panels: Vec<String>,
}

/// GET /panels - source keys of a plant
pub async fn panels(
    State(st): State<AppState>,
    Query(q): Query<PanelsQuery>,
) -> Result<Json<PanelsResponse>, ApiError> {
    let plant: Plant = q.plant.parse()?;
    let panels = st.replay.panels(plant).await?;
    tracing::debug!(%plant, count = panels.len(), "panels listed");
    Ok(Json(PanelsResponse { panels }))
}

#[derive(Debug, Deserialize)]
pub struct PanelDataQuery {
    #[serde(default = "default_plant")]
    pub plant: String,
    pub panel: Option<String>,
    #[serde(default)]
    pub start: String,
    #[serde(default)]
    pub end: String,
}

/// GET /panel_data - one inverter's readings within `[start, end]`
pub async fn panel_data(
    State(st): State<AppState>,
    Query(q): Query<PanelDataQuery>,
) -> Result<Response, ApiError> {
    let plant: Plant = q.plant.parse()?;
    let panel = q
        .panel
        .ok_or_else(|| ApiError::BadRequest("panel is required".into()))?;
    let start = parse_timestamp(&q.start)?;
    let end = parse_timestamp(&q.end)?;
    let outcome = st.replay.panel_range(plant, &panel, start, end).await?;
    Ok(outcome_response(outcome, NO_PANEL_DATA))
}
