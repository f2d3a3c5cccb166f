use axum::{
    extract::State,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use tracing::warn;

use ecg_viewer::Selection;

use crate::state::app_state::AppState;

pub fn session_routes(state: AppState) -> Router {
    Router::new()
        .route("/consult", post(consult))
        .route("/series/bpm", get(rate_series))
        .route("/predictions", get(prediction_buckets))
        .with_state(state)
}

async fn consult(State(state): State<AppState>, Json(selection): Json<Selection>) -> impl IntoResponse {
    let report = state.session.consult(&selection).await;

    // per-slot failures are part of the report, not an HTTP error
    if report.ecg.is_failed() || report.bpm.is_failed() || report.pred.is_failed() {
        warn!("Consult finished with failures: {:?}", report);
    }

    Json(report)
}

async fn rate_series(State(state): State<AppState>) -> impl IntoResponse {
    let series = state.session.rate_series().await;
    Json(series.as_ref().clone())
}

async fn prediction_buckets(State(state): State<AppState>) -> impl IntoResponse {
    Json(state.session.prediction_buckets().await)
}
