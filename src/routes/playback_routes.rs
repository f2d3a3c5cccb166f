use axum::{
    extract::{ws::WebSocketUpgrade, State},
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use tracing::info;

use ecg_viewer::handle_ws_playback;

use crate::state::app_state::AppState;

pub fn playback_routes(state: AppState) -> Router {
    Router::new()
        .route("/playback", get(snapshot))
        .route("/playback/play", post(play))
        .route("/playback/pause", post(pause))
        .route("/playback/toggle", post(toggle))
        .route("/playback/stream", get(stream))
        .with_state(state)
}

async fn snapshot(State(state): State<AppState>) -> impl IntoResponse {
    Json(state.session.playback().snapshot())
}

async fn play(State(state): State<AppState>) -> impl IntoResponse {
    let playback = state.session.playback();
    playback.play();
    Json(playback.snapshot())
}

async fn pause(State(state): State<AppState>) -> impl IntoResponse {
    let playback = state.session.playback();
    playback.pause();
    Json(playback.snapshot())
}

async fn toggle(State(state): State<AppState>) -> impl IntoResponse {
    let playback = state.session.playback();
    playback.toggle();
    Json(playback.snapshot())
}

async fn stream(State(state): State<AppState>, ws: WebSocketUpgrade) -> impl IntoResponse {
    info!("Playback stream requested");
    let frames = state.session.playback().subscribe();
    ws.on_upgrade(move |socket| handle_ws_playback(socket, frames))
}
