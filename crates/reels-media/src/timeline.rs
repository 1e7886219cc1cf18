//! Splicing segments into one timeline and writing the final artifact.

use std::path::{Path, PathBuf};
use tracing::info;

use reels_models::presets::{QualityPreset, DEFAULT_AUDIO_BITRATE, DEFAULT_AUDIO_CODEC};

use crate::command::{FfmpegCommand, FfmpegRunner};
use crate::error::{MediaError, MediaResult};
use crate::progress::FfmpegProgress;

/// Final encode parameters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodeSettings {
    pub fps: u32,
    pub codec: String,
    pub preset: String,
    pub threads: u32,
    pub audio_codec: String,
    pub audio_bitrate: String,
}

impl EncodeSettings {
    pub fn from_preset(preset: QualityPreset) -> Self {
        Self {
            fps: preset.fps(),
            codec: preset.codec().to_string(),
            preset: preset.encoder_preset().to_string(),
            threads: preset.threads(),
            audio_codec: DEFAULT_AUDIO_CODEC.to_string(),
            audio_bitrate: DEFAULT_AUDIO_BITRATE.to_string(),
        }
    }

    pub fn with_audio_bitrate(mut self, bitrate: impl Into<String>) -> Self {
        self.audio_bitrate = bitrate.into();
        self
    }
}

/// Concat demuxer list content, one `file` line per segment in order.
pub fn concat_list(segments: &[PathBuf]) -> String {
    segments
        .iter()
        .map(|p| format!("file '{}'\n", p.to_string_lossy().replace('\'', "'\\''")))
        .collect()
}

/// Splice `segments` in order into `output` without re-encoding.
///
/// The list file is written next to `output` and removed afterwards.
pub async fn concat_segments(runner: &FfmpegRunner, segments: &[PathBuf], output: &Path) -> MediaResult<()> {
    if segments.is_empty() {
        return Err(MediaError::EmptyConcat);
    }

    let list_path = output.with_extension("txt");
    tokio::fs::write(&list_path, concat_list(segments)).await?;

    let cmd = FfmpegCommand::new(output)
        .input_args(["-f", "concat", "-safe", "0"])
        .input(&list_path)
        .stream_copy();

    let result = runner.run(&cmd).await;
    let _ = tokio::fs::remove_file(&list_path).await;
    result?;

    info!(
        segments = segments.len(),
        output = %output.display(),
        "Concatenated segments"
    );
    Ok(())
}

pub fn encode_command(input: &Path, output: &Path, settings: &EncodeSettings) -> FfmpegCommand {
    FfmpegCommand::new(output)
        .input(input)
        .frame_rate(settings.fps)
        .video_codec(settings.codec.clone())
        .preset(settings.preset.clone())
        .threads(settings.threads)
        .output_args(["-pix_fmt", "yuv420p"])
        .audio_codec(settings.audio_codec.clone())
        .audio_bitrate(settings.audio_bitrate.clone())
        .faststart()
}

/// Encode the spliced timeline into the final artifact.
pub async fn encode_final<F>(
    runner: &FfmpegRunner,
    input: &Path,
    output: &Path,
    settings: &EncodeSettings,
    progress: F,
) -> MediaResult<()>
where
    F: Fn(FfmpegProgress) + Send + 'static,
{
    if !input.exists() {
        return Err(MediaError::FileNotFound(input.to_path_buf()));
    }
    if let Some(parent) = output.parent() {
        tokio::fs::create_dir_all(parent).await?;
    }

    runner
        .run_with_progress(&encode_command(input, output, settings), progress)
        .await?;

    info!(
        output = %output.display(),
        fps = settings.fps,
        preset = %settings.preset,
        "Final video written"
    );
    Ok(())
}
