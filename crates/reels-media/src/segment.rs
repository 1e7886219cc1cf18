//! Per-verse segment composition: looped background, text overlay, audio.

use std::path::Path;
use tracing::info;

use crate::command::{FfmpegCommand, FfmpegRunner};
use crate::error::{MediaError, MediaResult};
use crate::filters::{filter_audio_fades, filter_cover_crop, DrawText};

/// Intermediate segments share one stream layout so they can be spliced
/// without re-encoding.
pub const SEGMENT_FPS: u32 = 30;
const SEGMENT_PRESET: &str = "veryfast";
const SEGMENT_CRF: u8 = 20;
const SEGMENT_SAMPLE_RATE: &str = "44100";

/// Inputs and styling for one segment.
#[derive(Debug, Clone)]
pub struct SegmentSpec<'a> {
    /// Normalized background clip, looped as needed
    pub background: &'a Path,
    /// Trimmed recitation audio
    pub audio: &'a Path,
    /// UTF-8 file holding the wrapped verse text
    pub text_file: &'a Path,
    pub font_file: &'a Path,
    pub font_size: u32,
    pub color: &'a str,
    /// Segment length in seconds, equal to the audio duration
    pub duration: f64,
    pub width: u32,
    pub height: u32,
    pub text_fade: f64,
    pub audio_fade: f64,
    pub audio_bitrate: &'a str,
}

impl SegmentSpec<'_> {
    /// Build the filtergraph for this segment.
    pub fn filter_graph(&self) -> String {
        let font = self.font_file.to_string_lossy();
        let text = self.text_file.to_string_lossy();
        let drawtext = DrawText {
            font_file: &font,
            text_file: &text,
            font_size: self.font_size,
            color: self.color,
            duration: self.duration,
            fade: self.text_fade,
        };

        format!(
            "[0:v]trim=duration={dur:.3},setpts=PTS-STARTPTS,{cover},{text},format=yuv420p[v];\
             [1:a]{fades}[a]",
            dur = self.duration,
            cover = filter_cover_crop(self.width, self.height),
            text = drawtext.to_filter(),
            fades = filter_audio_fades(self.duration, self.audio_fade),
        )
    }

    /// Build the full command writing to `output`.
    pub fn command(&self, output: &Path) -> FfmpegCommand {
        FfmpegCommand::new(output)
            .loop_input()
            .input(self.background)
            .input(self.audio)
            .filter_complex(self.filter_graph())
            .map("[v]")
            .map("[a]")
            .duration(self.duration)
            .frame_rate(SEGMENT_FPS)
            .video_codec("libx264")
            .preset(SEGMENT_PRESET)
            .crf(SEGMENT_CRF)
            .audio_codec("aac")
            .audio_bitrate(self.audio_bitrate)
            .output_args(["-ar", SEGMENT_SAMPLE_RATE, "-ac", "2"])
    }
}

/// Render one segment to `output`.
pub async fn compose_segment(runner: &FfmpegRunner, spec: &SegmentSpec<'_>, output: &Path) -> MediaResult<()> {
    for input in [spec.background, spec.audio, spec.text_file, spec.font_file] {
        if !input.exists() {
            return Err(MediaError::FileNotFound(input.to_path_buf()));
        }
    }
    if spec.duration <= 0.0 {
        return Err(MediaError::invalid_media(format!(
            "Segment duration must be positive, got {}",
            spec.duration
        )));
    }

    runner.run(&spec.command(output)).await?;

    info!(
        output = %output.display(),
        duration = spec.duration,
        "Composed segment"
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn spec<'a>(bg: &'a Path, audio: &'a Path, text: &'a Path, font: &'a Path) -> SegmentSpec<'a> {
        SegmentSpec {
            background: bg,
            audio,
            text_file: text,
            font_file: font,
            font_size: 90,
            color: "#FFD700",
            duration: 4.25,
            width: 1080,
            height: 1920,
            text_fade: 0.3,
            audio_fade: 0.2,
            audio_bitrate: "192k",
        }
    }

    #[test]
    fn test_filter_graph() {
        let (bg, a, t, f) = (Path::new("bg.mp4"), Path::new("a.mp3"), Path::new("t.txt"), Path::new("f.ttf"));
        let graph = spec(bg, a, t, f).filter_graph();
        assert!(graph.starts_with("[0:v]trim=duration=4.250,setpts=PTS-STARTPTS,scale=1080:1920"));
        assert!(graph.contains("drawtext=fontfile=f.ttf:textfile=t.txt:fontsize=90:fontcolor=#FFD700"));
        assert!(graph.ends_with("[1:a]afade=t=in:st=0:d=0.200,afade=t=out:st=4.050:d=0.200[a]"));
    }

    #[test]
    fn test_command_loops_background_and_caps_duration() {
        let (bg, a, t, f) = (Path::new("bg.mp4"), Path::new("a.mp3"), Path::new("t.txt"), Path::new("f.ttf"));
        let args = spec(bg, a, t, f).command(Path::new("seg_0001.mp4")).build_args();
        let joined = args.join(" ");
        assert!(joined.contains("-stream_loop -1 -i bg.mp4 -i a.mp3"));
        assert!(joined.contains("-map [v] -map [a] -t 4.250 -r 30"));
        assert_eq!(args.last().unwrap(), "seg_0001.mp4");
    }

    #[tokio::test]
    async fn test_missing_input_fails_fast() {
        let (bg, a, t, f) = (Path::new("/nope/bg.mp4"), Path::new("a.mp3"), Path::new("t.txt"), Path::new("f.ttf"));
        let err = compose_segment(&FfmpegRunner::new(), &spec(bg, a, t, f), Path::new("/tmp/x.mp4"))
            .await
            .unwrap_err();
        assert!(matches!(err, MediaError::FileNotFound(p) if p == Path::new("/nope/bg.mp4")));
    }
}
