//! Background geometry normalization.

use std::path::Path;
use tracing::info;

use crate::command::{FfmpegCommand, FfmpegRunner};
use crate::error::{MediaError, MediaResult};
use crate::filters::filter_cover_crop;

/// Encoder settings for normalized backgrounds.
const NORMALIZE_PRESET: &str = "veryfast";
const NORMALIZE_CRF: u8 = 23;

/// Build the command that scales `src` to cover `width`x`height`, center-crops
/// it to exactly that size and drops its audio.
pub fn normalize_command(src: &Path, dst: &Path, width: u32, height: u32) -> FfmpegCommand {
    FfmpegCommand::new(dst)
        .input(src)
        .video_filter(filter_cover_crop(width, height))
        .no_audio()
        .video_codec("libx264")
        .preset(NORMALIZE_PRESET)
        .crf(NORMALIZE_CRF)
        .faststart()
}

/// Normalize a background clip into `dst`.
pub async fn normalize_background(
    runner: &FfmpegRunner,
    src: &Path,
    dst: &Path,
    width: u32,
    height: u32,
) -> MediaResult<()> {
    if !src.exists() {
        return Err(MediaError::FileNotFound(src.to_path_buf()));
    }

    info!(
        src = %src.display(),
        dst = %dst.display(),
        width,
        height,
        "Normalizing background"
    );

    runner.run(&normalize_command(src, dst, width, height)).await
}
