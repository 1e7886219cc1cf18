//! API routes.

use axum::middleware;
use axum::routing::{get, post};
use axum::Router;
use metrics_exporter_prometheus::PrometheusHandle;
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::services::ServeDir;

use crate::handlers::{generate, get_config, get_progress, health, preview, refresh_fonts};
use crate::metrics::metrics_middleware;
use crate::middleware::{cors_layer, request_id, request_logging};
use crate::state::AppState;

/// Create the API router.
pub fn create_router(state: AppState, metrics_handle: Option<PrometheusHandle>) -> Router {
    let api_routes = Router::new()
        .route("/generate", post(generate))
        .route("/preview", post(preview))
        .route("/progress", get(get_progress))
        .route("/config", get(get_config))
        .route("/refresh-fonts", post(refresh_fonts));

    let metrics_routes = if let Some(handle) = metrics_handle {
        Router::new().route("/metrics", get(move || async move { handle.render() }))
    } else {
        Router::new()
    };

    Router::new()
        .nest("/api", api_routes)
        .nest_service("/outputs", ServeDir::new(state.outputs_dir()))
        .route("/health", get(health))
        .merge(metrics_routes)
        .layer(RequestBodyLimitLayer::new(state.config.max_body_size))
        .layer(middleware::from_fn(metrics_middleware))
        .layer(middleware::from_fn(request_id))
        .layer(middleware::from_fn(request_logging))
        .layer(cors_layer(&state.config.cors_origins))
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ApiConfig;
    use axum::body::{to_bytes, Body};
    use axum::http::{Request, StatusCode};
    use reels_worker::{JobController, PipelineDeps, ProgressStore, WorkerConfig};
    use serde_json::{json, Value};
    use tempfile::TempDir;
    use tower::ServiceExt;

    fn app() -> (TempDir, AppState) {
        let dir = TempDir::new().unwrap();
        let mut config = WorkerConfig::with_base_dir(dir.path());
        // Nothing listens here, so accepted jobs fail fast at the first fetch
        config.audio_base_url = "http://127.0.0.1:9".to_string();
        config.text_base_url = "http://127.0.0.1:9".to_string();
        config.retry_attempts = 1;
        config.ensure_dirs().unwrap();

        let deps = PipelineDeps::from_config(&config).unwrap();
        let controller = JobController::new(config, deps, ProgressStore::new());
        (dir, AppState::new(ApiConfig::default(), controller))
    }

    async fn send(state: &AppState, request: Request<Body>) -> (StatusCode, Value) {
        let response = create_router(state.clone(), None).oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        (status, body)
    }

    fn post_json(uri: &str, body: Value) -> Request<Body> {
        Request::post(uri)
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    #[tokio::test]
    async fn test_health() {
        let (_dir, state) = app();
        let (status, body) = send(&state, Request::get("/health").body(Body::empty()).unwrap()).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "healthy");
        assert_eq!(body["job_running"], false);
    }

    #[tokio::test]
    async fn test_progress_snapshot() {
        let (_dir, state) = app();
        let (status, body) = send(&state, Request::get("/api/progress").body(Body::empty()).unwrap()).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["percent"], 0);
        assert_eq!(body["is_running"], false);
        assert_eq!(body["phase"], "idle");
        assert!(body["log"].as_array().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_config_lists_catalog() {
        let (_dir, state) = app();
        let (status, body) = send(&state, Request::get("/api/config").body(Body::empty()).unwrap()).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["surahs"].as_array().unwrap().len(), 114);
        assert_eq!(body["verseCounts"][0], 7);
        assert_eq!(body["qualityPresets"], json!(["low", "medium", "high"]));
        assert_eq!(body["templates"], json!(["ramadan", "normal", "kids"]));
        assert!(body["reciters"].as_object().unwrap().len() > 0);
    }

    #[tokio::test]
    async fn test_refresh_fonts() {
        let (_dir, state) = app();
        let fonts_dir = state.controller.config().fonts_dir.clone();
        std::fs::create_dir_all(&fonts_dir).unwrap();
        std::fs::write(fonts_dir.join("Amiri.ttf"), b"font").unwrap();

        let (status, body) = send(&state, Request::post("/api/refresh-fonts").body(Body::empty()).unwrap()).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["success"], true);
        assert_eq!(body["fontCount"], 1);
        assert_eq!(body["fonts"], json!(["Amiri.ttf"]));
    }

    #[tokio::test]
    async fn test_generate_rejected_while_running() {
        let (_dir, state) = app();
        let _guard = state.controller.progress().try_start("busy").unwrap();

        let (status, body) = send(
            &state,
            post_json("/api/generate", json!({"reciter": "Alafasy_64kbps", "surah": 1, "startAyah": 1})),
        )
        .await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "عملية إنشاء فيديو قيد التنفيذ بالفعل");
        assert_eq!(state.controller.progress().snapshot().status, "busy");
    }

    #[tokio::test]
    async fn test_preview_rejected_while_running_in_english() {
        let (_dir, state) = app();
        let _guard = state.controller.progress().try_start("busy").unwrap();

        let (status, body) = send(
            &state,
            post_json("/api/preview", json!({"reciter": "x", "surah": "2", "ayah": 255, "language": "en"})),
        )
        .await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "A video generation is already in progress");
    }

    #[tokio::test]
    async fn test_generate_invalid_surah() {
        let (_dir, state) = app();
        let (status, body) = send(
            &state,
            post_json("/api/generate", json!({"reciter": "x", "surah": 200, "startAyah": 1})),
        )
        .await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["error"].as_str().unwrap().contains("200"));
        assert!(!state.controller.progress().is_running());
    }

    #[tokio::test]
    async fn test_generate_malformed_body() {
        let (_dir, state) = app();
        let (status, body) = send(&state, post_json("/api/generate", json!({"surah": 1}))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["error"].is_string());
    }

    #[tokio::test]
    async fn test_generate_accepted() {
        let (_dir, state) = app();
        let (status, body) = send(
            &state,
            post_json(
                "/api/generate",
                json!({"reciter": "Alafasy_64kbps", "surah": "1", "startAyah": "1", "endAyah": "", "personName": "Ali"}),
            ),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["success"], true);
        assert_eq!(body["message"], "بدأ إنشاء الفيديو");
        assert!(!body["jobId"].as_str().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_outputs_are_served() {
        let (_dir, state) = app();
        let video = state.controller.config().video_dir.join("clip.mp4");
        std::fs::write(&video, b"mp4").unwrap();

        let response = create_router(state.clone(), None)
            .oneshot(Request::get("/outputs/video/clip.mp4").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        assert_eq!(&bytes[..], b"mp4");
    }
}
