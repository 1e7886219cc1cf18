//! Catalog and font endpoints used to populate the UI.

use axum::extract::State;
use axum::Json;
use serde::Serialize;
use std::collections::BTreeMap;

use reels_models::{reciters, surah_names, verse_counts, OutputFormat, QualityPreset, Template};

use crate::error::{ApiError, ApiResult};
use crate::state::AppState;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfigResponse {
    pub surahs: Vec<&'static str>,
    pub verse_counts: Vec<u32>,
    /// Display name to audio folder id
    pub reciters: BTreeMap<&'static str, &'static str>,
    pub quality_presets: Vec<&'static str>,
    pub output_formats: Vec<&'static str>,
    pub templates: Vec<&'static str>,
    pub available_fonts: Vec<String>,
}

pub async fn get_config(State(state): State<AppState>) -> Json<ConfigResponse> {
    Json(ConfigResponse {
        surahs: surah_names().to_vec(),
        verse_counts: verse_counts().to_vec(),
        reciters: reciters().iter().copied().collect(),
        quality_presets: QualityPreset::ALL.iter().map(|q| q.as_str()).collect(),
        output_formats: OutputFormat::ALL.iter().map(|f| f.as_str()).collect(),
        templates: Template::ALL.iter().map(|t| t.as_str()).collect(),
        available_fonts: state.controller.fonts().font_names(),
    })
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RefreshFontsResponse {
    pub success: bool,
    pub message: String,
    pub font_count: usize,
    pub fonts: Vec<String>,
}

/// Rescan the fonts directory.
pub async fn refresh_fonts(State(state): State<AppState>) -> ApiResult<Json<RefreshFontsResponse>> {
    let catalog = state.controller.fonts();
    let found = catalog
        .refresh()
        .await
        .map_err(|e| ApiError::internal(e.to_string()))?;

    Ok(Json(RefreshFontsResponse {
        success: true,
        message: "Font list refreshed successfully".to_string(),
        font_count: found.len(),
        fonts: catalog.font_names(),
    }))
}
