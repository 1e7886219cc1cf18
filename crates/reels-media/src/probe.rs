//! FFprobe media information.

use serde::{Deserialize, Serialize};
use std::path::Path;
use std::process::Stdio;
use tokio::process::Command;

use crate::command::check_ffprobe;
use crate::error::{MediaError, MediaResult};

/// Audio/video file information.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MediaInfo {
    /// Duration in seconds
    pub duration: f64,
    pub has_video: bool,
    pub has_audio: bool,
    /// Width of the first video stream, 0 when audio-only
    pub width: u32,
    /// Height of the first video stream, 0 when audio-only
    pub height: u32,
}

/// FFprobe JSON output format.
#[derive(Debug, Deserialize)]
struct FfprobeOutput {
    format: FfprobeFormat,
    #[serde(default)]
    streams: Vec<FfprobeStream>,
}

#[derive(Debug, Deserialize)]
struct FfprobeFormat {
    duration: Option<String>,
}

#[derive(Debug, Deserialize)]
struct FfprobeStream {
    codec_type: String,
    width: Option<u32>,
    height: Option<u32>,
    duration: Option<String>,
}

/// Probe a media file.
pub async fn probe_media(path: impl AsRef<Path>) -> MediaResult<MediaInfo> {
    let path = path.as_ref();

    if !path.exists() {
        return Err(MediaError::FileNotFound(path.to_path_buf()));
    }

    check_ffprobe()?;

    let output = Command::new("ffprobe")
        .args(["-v", "quiet", "-print_format", "json", "-show_format", "-show_streams"])
        .arg(path)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .output()
        .await?;

    if !output.status.success() {
        return Err(MediaError::FfprobeFailed {
            message: format!("FFprobe failed for {}", path.display()),
            stderr: Some(String::from_utf8_lossy(&output.stderr).to_string()),
        });
    }

    parse_probe_output(&output.stdout)
}

/// Get media duration in seconds.
pub async fn probe_duration(path: impl AsRef<Path>) -> MediaResult<f64> {
    let info = probe_media(path).await?;
    Ok(info.duration)
}

fn parse_probe_output(stdout: &[u8]) -> MediaResult<MediaInfo> {
    let probe: FfprobeOutput = serde_json::from_slice(stdout)?;

    let video = probe.streams.iter().find(|s| s.codec_type == "video");
    let audio = probe.streams.iter().find(|s| s.codec_type == "audio");

    if video.is_none() && audio.is_none() {
        return Err(MediaError::invalid_media("No audio or video stream found"));
    }

    // Container duration first, stream duration as fallback
    let duration = probe
        .format
        .duration
        .as_deref()
        .or_else(|| audio.and_then(|s| s.duration.as_deref()))
        .or_else(|| video.and_then(|s| s.duration.as_deref()))
        .and_then(|d| d.parse::<f64>().ok())
        .filter(|d| d.is_finite() && *d > 0.0)
        .ok_or_else(|| MediaError::invalid_media("Missing or zero duration"))?;

    Ok(MediaInfo {
        duration,
        has_video: video.is_some(),
        has_audio: audio.is_some(),
        width: video.and_then(|s| s.width).unwrap_or(0),
        height: video.and_then(|s| s.height).unwrap_or(0),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_audio_only() {
        let json = br#"{
            "streams": [{"codec_type": "audio", "codec_name": "mp3", "duration": "4.200000"}],
            "format": {"duration": "4.205000"}
        }"#;
        let info = parse_probe_output(json).unwrap();
        assert!((info.duration - 4.205).abs() < 1e-9);
        assert!(info.has_audio && !info.has_video);
        assert_eq!((info.width, info.height), (0, 0));
    }

    #[test]
    fn test_parse_falls_back_to_stream_duration() {
        let json = br#"{
            "streams": [{"codec_type": "video", "width": 1080, "height": 1920, "duration": "12.5"}],
            "format": {}
        }"#;
        let info = parse_probe_output(json).unwrap();
        assert!((info.duration - 12.5).abs() < 1e-9);
        assert_eq!((info.width, info.height), (1080, 1920));
    }

    #[test]
    fn test_parse_rejects_streamless() {
        let json = br#"{"streams": [], "format": {"duration": "1.0"}}"#;
        assert!(matches!(parse_probe_output(json), Err(MediaError::InvalidMedia(_))));
    }

    #[test]
    fn test_parse_rejects_zero_duration() {
        let json = br#"{"streams": [{"codec_type": "audio"}], "format": {"duration": "0.000"}}"#;
        assert!(parse_probe_output(json).is_err());
    }
}
