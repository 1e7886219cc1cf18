//! FFmpeg CLI wrapper for rendering verse reels.
//!
//! This crate provides:
//! - Command builder and runner for FFmpeg, plus FFprobe duration probing
//! - Relative-loudness silence trimming of recitation audio
//! - Background normalization (scale-to-cover and center-crop)
//! - Segment composition with text overlay and audio fades
//! - Stream-copy concatenation and the final quality-preset encode

pub mod background;
pub mod command;
pub mod error;
pub mod filters;
pub mod fs_utils;
pub mod probe;
pub mod progress;
pub mod segment;
pub mod silence;
pub mod timeline;

pub use background::normalize_background;
pub use command::{check_ffmpeg, check_ffprobe, FfmpegCommand, FfmpegRunner};
pub use error::{MediaError, MediaResult};
pub use fs_utils::{clear_dir, move_file, partial_path, remove_if_exists};
pub use probe::{probe_duration, probe_media, MediaInfo};
pub use progress::FfmpegProgress;
pub use segment::{compose_segment, SegmentSpec};
pub use silence::{detect_silence_bounds, trim_silence_in_place, SilenceConfig, TrimBounds};
pub use timeline::{concat_segments, encode_final, EncodeSettings};
