//! Media backend capability used by the pipeline.

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

use reels_media::{
    compose_segment, concat_segments, encode_final, normalize_background, probe_duration, remove_if_exists,
    trim_silence_in_place, EncodeSettings, FfmpegRunner, SegmentSpec, SilenceConfig,
};
use reels_models::QualityPreset;

use crate::config::WorkerConfig;
use crate::error::{WorkerError, WorkerResult};

/// Everything needed to render one segment.
#[derive(Debug, Clone, PartialEq)]
pub struct ComposeRequest {
    pub background: PathBuf,
    pub audio: PathBuf,
    /// Already wrapped overlay text
    pub text: String,
    pub font: PathBuf,
    pub font_size: u32,
    pub color: String,
    pub duration: f64,
    pub width: u32,
    pub height: u32,
}

/// Media operations the pipeline depends on.
#[async_trait]
pub trait MediaBackend: Send + Sync {
    /// Duration of a media file in seconds.
    async fn probe_duration(&self, path: &Path) -> WorkerResult<f64>;

    /// Trim leading/trailing silence, replacing the file.
    async fn trim_silence(&self, path: &Path) -> WorkerResult<()>;

    /// Scale-to-cover and center-crop `src` into `dst`, without audio.
    async fn normalize_background(&self, src: &Path, dst: &Path, width: u32, height: u32) -> WorkerResult<()>;

    /// Render one segment to `output`.
    async fn compose_segment(&self, request: &ComposeRequest, output: &Path) -> WorkerResult<()>;

    /// Splice `segments` in order into `output` without re-encoding.
    async fn concat_segments(&self, segments: &[PathBuf], output: &Path) -> WorkerResult<()>;

    /// Encode the final artifact at `quality`.
    async fn encode_final(&self, input: &Path, output: &Path, quality: QualityPreset) -> WorkerResult<()>;

    /// Release a produced file. Never fails.
    async fn remove(&self, path: &Path) {
        if let Err(e) = remove_if_exists(path).await {
            warn!(path = %path.display(), error = %e, "Failed to release media file");
        }
    }
}

/// FFmpeg-backed implementation.
#[derive(Debug, Clone)]
pub struct FfmpegBackend {
    runner: FfmpegRunner,
    silence: SilenceConfig,
    audio_bitrate: String,
    text_fade: f64,
    audio_fade: f64,
}

impl FfmpegBackend {
    pub fn new(config: &WorkerConfig) -> Self {
        Self {
            runner: FfmpegRunner::new().with_timeout(config.ffmpeg_timeout_secs),
            silence: config.silence,
            audio_bitrate: config.audio_bitrate.clone(),
            text_fade: config.text_fade,
            audio_fade: config.audio_fade,
        }
    }
}

#[async_trait]
impl MediaBackend for FfmpegBackend {
    async fn probe_duration(&self, path: &Path) -> WorkerResult<f64> {
        Ok(probe_duration(path).await?)
    }

    async fn trim_silence(&self, path: &Path) -> WorkerResult<()> {
        trim_silence_in_place(&self.runner, path, &self.silence).await?;
        Ok(())
    }

    async fn normalize_background(&self, src: &Path, dst: &Path, width: u32, height: u32) -> WorkerResult<()> {
        Ok(normalize_background(&self.runner, src, dst, width, height).await?)
    }

    async fn compose_segment(&self, request: &ComposeRequest, output: &Path) -> WorkerResult<()> {
        let text_file = output.with_extension("txt");
        tokio::fs::write(&text_file, &request.text).await?;

        let spec = SegmentSpec {
            background: &request.background,
            audio: &request.audio,
            text_file: &text_file,
            font_file: &request.font,
            font_size: request.font_size,
            color: &request.color,
            duration: request.duration,
            width: request.width,
            height: request.height,
            text_fade: self.text_fade,
            audio_fade: self.audio_fade,
            audio_bitrate: &self.audio_bitrate,
        };
        let result = compose_segment(&self.runner, &spec, output).await;
        let _ = remove_if_exists(&text_file).await;

        if let Err(e) = result {
            let _ = remove_if_exists(output).await;
            return Err(WorkerError::compose(e.to_string()));
        }
        Ok(())
    }

    async fn concat_segments(&self, segments: &[PathBuf], output: &Path) -> WorkerResult<()> {
        Ok(concat_segments(&self.runner, segments, output).await?)
    }

    async fn encode_final(&self, input: &Path, output: &Path, quality: QualityPreset) -> WorkerResult<()> {
        let settings = EncodeSettings::from_preset(quality).with_audio_bitrate(self.audio_bitrate.clone());
        let output_name = output.display().to_string();
        encode_final(&self.runner, input, output, &settings, move |p| {
            debug!(output = %output_name, out_time_ms = p.out_time_ms, speed = p.speed, "Encoding");
        })
        .await?;
        Ok(())
    }
}
