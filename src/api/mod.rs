pub mod error;
pub mod health;
pub mod predict;
pub mod replay;

use axum::{
    http::{HeaderValue, StatusCode},
    routing::get,
    Router,
};
use std::time::Duration;
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, timeout::TimeoutLayer, trace::TraceLayer};

use crate::{config::ServerConfig, state::AppState};

pub(crate) fn default_plant() -> String {
    "1".to_string()
}

pub fn router(state: AppState, cfg: &ServerConfig) -> Router {
    let mut router = Router::new()
        .route("/", get(health::root))
        .route("/healthz", get(health::healthz))
        .route("/replay", get(replay::replay))
        .route("/replay_range", get(replay::replay_range))
        .route("/panels", get(replay::panels))
        .route("/panel_data", get(replay::panel_data))
        .route("/predict/timestamps", get(predict::timestamps))
        .route("/predict/generate", get(predict::generate))
        .with_state(state);

    if cfg.enable_cors {
        let cors = CorsLayer::new()
            .allow_origin([
                HeaderValue::from_static("http://localhost:5173"),
                HeaderValue::from_static("http://127.0.0.1:5173"),
            ])
            .allow_methods([axum::http::Method::GET]);
        router = router.layer(cors);
    }

    router.layer(
        ServiceBuilder::new()
            .layer(TraceLayer::new_for_http())
            .layer(timeout_layer(Duration::from_secs(cfg.request_timeout_secs))),
    )
}

fn timeout_layer(timeout: Duration) -> TimeoutLayer {
    TimeoutLayer::with_status_code(StatusCode::REQUEST_TIMEOUT, timeout)
}
