//! Relative-loudness silence trimming for recitation clips.
//!
//! The clip is decoded to mono f32 PCM, its overall loudness in dBFS is
//! measured, and fixed-size windows are scanned inward from each end while
//! they stay quieter than `overall - threshold_db`. The threshold therefore
//! follows each clip's own level rather than an absolute floor.

use std::path::Path;
use tracing::{debug, info};

use crate::command::{FfmpegCommand, FfmpegRunner, STDOUT_PIPE};
use crate::error::{MediaError, MediaResult};
use crate::fs_utils::{move_file, partial_path, remove_if_exists};

/// Silence detection parameters.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SilenceConfig {
    /// Window size in milliseconds
    pub chunk_ms: u32,
    /// dB below the clip's overall loudness that counts as silence
    pub threshold_db: f64,
    /// Sample rate used for analysis
    pub sample_rate: u32,
}

impl Default for SilenceConfig {
    fn default() -> Self {
        Self {
            chunk_ms: 10,
            threshold_db: 16.0,
            sample_rate: 16_000,
        }
    }
}

impl SilenceConfig {
    fn chunk_samples(&self) -> usize {
        ((self.sample_rate as u64 * self.chunk_ms as u64) / 1000).max(1) as usize
    }
}

/// Leading/trailing silence found in a clip.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TrimBounds {
    pub leading_ms: f64,
    pub trailing_ms: f64,
    pub total_ms: f64,
}

impl TrimBounds {
    /// Duration left after trimming both ends.
    pub fn kept_ms(&self) -> f64 {
        (self.total_ms - self.leading_ms - self.trailing_ms).max(0.0)
    }

    /// Whether trimming would change the clip.
    pub fn is_noop(&self) -> bool {
        self.leading_ms <= 0.0 && self.trailing_ms <= 0.0
    }
}

/// Loudness of `samples` relative to full scale. Empty or silent input is `-inf`.
pub fn dbfs(samples: &[f32]) -> f64 {
    if samples.is_empty() {
        return f64::NEG_INFINITY;
    }
    let sum_sq: f64 = samples.iter().map(|s| f64::from(*s) * f64::from(*s)).sum();
    let rms = (sum_sq / samples.len() as f64).sqrt();
    if rms == 0.0 {
        return f64::NEG_INFINITY;
    }
    20.0 * rms.log10()
}

/// Find leading and trailing silence in mono PCM samples.
pub fn detect_silence_bounds(samples: &[f32], config: &SilenceConfig) -> TrimBounds {
    let chunk = config.chunk_samples();
    let threshold = dbfs(samples) - config.threshold_db;
    let len = samples.len();

    let mut lead = 0;
    while lead < len && dbfs(&samples[lead..(lead + chunk).min(len)]) < threshold {
        lead += chunk;
    }

    let mut trail = 0;
    while trail < len && dbfs(&samples[len.saturating_sub(trail + chunk)..len - trail]) < threshold {
        trail += chunk;
    }

    let to_ms = |n: usize| n.min(len) as f64 * 1000.0 / config.sample_rate as f64;
    TrimBounds {
        leading_ms: to_ms(lead),
        trailing_ms: to_ms(trail),
        total_ms: to_ms(len),
    }
}

/// Decode any audio file to mono f32 PCM at `sample_rate`.
pub async fn decode_pcm(runner: &FfmpegRunner, path: &Path, sample_rate: u32) -> MediaResult<Vec<f32>> {
    let cmd = FfmpegCommand::new(STDOUT_PIPE)
        .input(path)
        .no_video()
        .output_args(["-ac", "1", "-ar"])
        .output_arg(sample_rate.to_string())
        .format("f32le");

    let bytes = runner.run_capture(&cmd).await?;
    Ok(samples_from_le_bytes(&bytes))
}

fn samples_from_le_bytes(bytes: &[u8]) -> Vec<f32> {
    bytes
        .chunks_exact(4)
        .map(|b| f32::from_le_bytes([b[0], b[1], b[2], b[3]]))
        .collect()
}

/// Trim leading/trailing silence from `path`, replacing the file.
///
/// Clips that are silent throughout or have nothing to trim are left as-is.
pub async fn trim_silence_in_place(
    runner: &FfmpegRunner,
    path: &Path,
    config: &SilenceConfig,
) -> MediaResult<TrimBounds> {
    let samples = decode_pcm(runner, path, config.sample_rate).await?;
    if samples.is_empty() {
        return Err(MediaError::invalid_media(format!("No audio decoded from {}", path.display())));
    }

    let bounds = detect_silence_bounds(&samples, config);
    debug!(
        path = %path.display(),
        leading_ms = bounds.leading_ms,
        trailing_ms = bounds.trailing_ms,
        total_ms = bounds.total_ms,
        "Silence bounds detected"
    );

    if bounds.is_noop() || bounds.kept_ms() <= 0.0 {
        return Ok(bounds);
    }

    let tmp = partial_path(path);
    let cmd = FfmpegCommand::new(&tmp)
        .input(path)
        .output_arg("-ss")
        .output_arg(format!("{:.3}", bounds.leading_ms / 1000.0))
        .duration(bounds.kept_ms() / 1000.0)
        .no_video()
        .audio_codec(audio_codec_for(path));

    if let Err(e) = runner.run(&cmd).await {
        let _ = remove_if_exists(&tmp).await;
        return Err(e);
    }
    move_file(&tmp, path).await?;

    info!(
        path = %path.display(),
        kept_ms = bounds.kept_ms(),
        "Trimmed silence"
    );
    Ok(bounds)
}

fn audio_codec_for(path: &Path) -> &'static str {
    match path.extension().and_then(|e| e.to_str()).map(|e| e.to_ascii_lowercase()) {
        Some(ext) if ext == "mp3" => "libmp3lame",
        Some(ext) if ext == "wav" => "pcm_s16le",
        _ => "aac",
    }
}
