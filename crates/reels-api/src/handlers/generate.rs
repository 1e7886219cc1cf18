//! Job submission: full generation and single-verse preview.

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::Json;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use reels_models::job::number_or_string;
use reels_models::{JobRequest, Language, StatusMessage, Template};
use reels_worker::{preview_request, WorkerError};

use crate::error::{ApiError, ApiResult};
use crate::state::AppState;

/// Response to an accepted submission.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmitResponse {
    pub success: bool,
    pub message: String,
    pub job_id: String,
}

/// Preview body.
#[derive(Debug, Deserialize)]
pub struct PreviewBody {
    pub reciter: String,
    #[serde(default = "first", deserialize_with = "number_or_string")]
    pub surah: u32,
    #[serde(default = "first", deserialize_with = "number_or_string")]
    pub ayah: u32,
    #[serde(default)]
    pub template: Template,
    #[serde(default)]
    pub language: Language,
}

fn first() -> u32 {
    1
}

/// Start rendering a verse range.
pub async fn generate(
    State(state): State<AppState>,
    payload: Result<Json<JobRequest>, JsonRejection>,
) -> ApiResult<Json<SubmitResponse>> {
    let Json(request) = payload.map_err(|e| ApiError::bad_request(e.body_text()))?;
    let message = StatusMessage::Accepted.render(request.language);
    submit(&state, request, message)
}

/// Start rendering one verse at low quality.
pub async fn preview(
    State(state): State<AppState>,
    payload: Result<Json<PreviewBody>, JsonRejection>,
) -> ApiResult<Json<SubmitResponse>> {
    let Json(body) = payload.map_err(|e| ApiError::bad_request(e.body_text()))?;
    let request = preview_request(body.reciter, body.surah, body.ayah, body.template).with_language(body.language);
    submit(&state, request, "Preview generation started".to_string())
}

fn submit(state: &AppState, request: JobRequest, message: String) -> ApiResult<Json<SubmitResponse>> {
    let language = request.language;
    match state.controller.submit(request) {
        Ok(job_id) => {
            info!(job_id = %job_id, "Job accepted");
            Ok(Json(SubmitResponse {
                success: true,
                message,
                job_id: job_id.to_string(),
            }))
        }
        Err(WorkerError::AlreadyRunning) => {
            warn!("Rejected submission while a job is running");
            Err(ApiError::bad_request(StatusMessage::AlreadyRunning.render(language)))
        }
        Err(e) => Err(e.into()),
    }
}
