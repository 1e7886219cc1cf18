//! Application state.

use std::path::PathBuf;

use reels_worker::JobController;

use crate::config::ApiConfig;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub config: ApiConfig,
    pub controller: JobController,
}

impl AppState {
    pub fn new(config: ApiConfig, controller: JobController) -> Self {
        Self { config, controller }
    }

    /// Root served under `/outputs`.
    pub fn outputs_dir(&self) -> PathBuf {
        self.controller.config().outputs_dir.clone()
    }
}
