//! Worker configuration.

use std::path::PathBuf;
use std::time::Duration;

use reels_media::SilenceConfig;

/// Worker configuration.
#[derive(Debug, Clone)]
pub struct WorkerConfig {
    /// Root for every generated artifact
    pub outputs_dir: PathBuf,
    /// Downloaded and trimmed recitation audio, cleared per job
    pub audio_dir: PathBuf,
    /// Composed segments and overlay text files, cleared per job
    pub segments_dir: PathBuf,
    /// Final videos, kept across jobs
    pub video_dir: PathBuf,
    /// Normalized backgrounds, kept across jobs
    pub bg_cache_dir: PathBuf,
    /// `*.ttf` fonts used for the overlay
    pub fonts_dir: PathBuf,
    /// Source background clips (`<style>_part*.mp4`)
    pub backgrounds_dir: PathBuf,
    /// Base URL of the per-verse audio service
    pub audio_base_url: String,
    /// Base URL of the verse text service
    pub text_base_url: String,
    /// Text edition requested from the text service
    pub text_edition: String,
    pub http_timeout: Duration,
    /// Attempts per retried step, including the first
    pub retry_attempts: u32,
    /// Wait before the second attempt; doubles each time
    pub retry_base_delay: Duration,
    pub silence: SilenceConfig,
    pub audio_bitrate: String,
    pub text_fade: f64,
    pub audio_fade: f64,
    /// Kill any single FFmpeg call after this long
    pub ffmpeg_timeout_secs: u64,
    /// Fixed seed for asset selection; random when unset
    pub rng_seed: Option<u64>,
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self::with_base_dir(PathBuf::from("."))
    }
}

impl WorkerConfig {
    /// Default layout rooted at `base`.
    pub fn with_base_dir(base: impl Into<PathBuf>) -> Self {
        let base = base.into();
        let outputs_dir = base.join("outputs");
        Self {
            audio_dir: outputs_dir.join("audio"),
            segments_dir: outputs_dir.join("segments"),
            video_dir: outputs_dir.join("video"),
            bg_cache_dir: outputs_dir.join("bg_cache"),
            outputs_dir,
            fonts_dir: base.join("fonts"),
            backgrounds_dir: base.join("vision"),
            audio_base_url: "https://everyayah.com/data".to_string(),
            text_base_url: "https://api.alquran.cloud/v1".to_string(),
            text_edition: "quran-uthmani".to_string(),
            http_timeout: Duration::from_secs(30),
            retry_attempts: 3,
            retry_base_delay: Duration::from_secs(1),
            silence: SilenceConfig::default(),
            audio_bitrate: "192k".to_string(),
            text_fade: 0.3,
            audio_fade: 0.2,
            ffmpeg_timeout_secs: 600,
            rng_seed: None,
        }
    }

    /// Create config from environment variables.
    pub fn from_env() -> Self {
        let base = std::env::var("REELS_BASE_DIR").unwrap_or_else(|_| ".".to_string());
        let mut config = Self::with_base_dir(base);

        if let Ok(dir) = std::env::var("REELS_FONTS_DIR") {
            config.fonts_dir = PathBuf::from(dir);
        }
        if let Ok(dir) = std::env::var("REELS_BACKGROUNDS_DIR") {
            config.backgrounds_dir = PathBuf::from(dir);
        }
        if let Ok(url) = std::env::var("REELS_AUDIO_BASE_URL") {
            config.audio_base_url = url;
        }
        if let Ok(url) = std::env::var("REELS_TEXT_BASE_URL") {
            config.text_base_url = url;
        }
        if let Ok(edition) = std::env::var("REELS_TEXT_EDITION") {
            config.text_edition = edition;
        }
        config.http_timeout = Duration::from_secs(
            std::env::var("REELS_HTTP_TIMEOUT_SECS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(30),
        );
        config.retry_attempts = std::env::var("REELS_RETRY_ATTEMPTS")
            .ok()
            .and_then(|s| s.parse().ok())
            .filter(|n: &u32| *n > 0)
            .unwrap_or(3);
        config.retry_base_delay = Duration::from_millis(
            std::env::var("REELS_RETRY_BASE_DELAY_MS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(1000),
        );
        config.silence.chunk_ms = std::env::var("REELS_SILENCE_CHUNK_MS")
            .ok()
            .and_then(|s| s.parse().ok())
            .filter(|n: &u32| *n > 0)
            .unwrap_or(10);
        config.silence.threshold_db = std::env::var("REELS_SILENCE_THRESHOLD_DB")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(16.0);
        if let Ok(bitrate) = std::env::var("REELS_AUDIO_BITRATE") {
            config.audio_bitrate = bitrate;
        }
        config.ffmpeg_timeout_secs = std::env::var("REELS_FFMPEG_TIMEOUT_SECS")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(600);
        config.rng_seed = std::env::var("REELS_RNG_SEED").ok().and_then(|s| s.parse().ok());

        config
    }

    /// Directories wiped at the start of each job.
    pub fn scratch_dirs(&self) -> [&PathBuf; 2] {
        [&self.audio_dir, &self.segments_dir]
    }

    /// Every directory the worker writes to.
    pub fn output_dirs(&self) -> [&PathBuf; 5] {
        [
            &self.outputs_dir,
            &self.audio_dir,
            &self.segments_dir,
            &self.video_dir,
            &self.bg_cache_dir,
        ]
    }

    /// Create all output directories.
    pub fn ensure_dirs(&self) -> std::io::Result<()> {
        for dir in self.output_dirs() {
            std::fs::create_dir_all(dir)?;
        }
        Ok(())
    }
}
