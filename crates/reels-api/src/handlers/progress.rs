//! Progress snapshot.

use axum::extract::State;
use axum::Json;

use reels_models::ProgressState;

use crate::state::AppState;

pub async fn get_progress(State(state): State<AppState>) -> Json<ProgressState> {
    Json(state.controller.progress().snapshot())
}
