//! FFmpeg filter expressions used to build verse segments.

use reels_models::text_style::{STROKE_COLOR, STROKE_WIDTH, TEXT_MARGIN};

/// Extra pixels between wrapped lines.
pub const LINE_SPACING: u32 = 10;

/// Scale to cover the canvas, then center-crop to it.
pub fn filter_cover_crop(width: u32, height: u32) -> String {
    format!(
        "scale={w}:{h}:force_original_aspect_ratio=increase,crop={w}:{h}",
        w = width,
        h = height
    )
}

/// Escape a value placed inside a filtergraph option.
///
/// The value passes through the graph parser and then the option parser,
/// so option separators need a doubled backslash.
pub fn escape_filter_value(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '\\' => out.push_str("\\\\\\\\"),
            ':' => out.push_str("\\\\:"),
            '\'' => out.push_str("\\\\\\'"),
            ',' | ';' | '[' | ']' => {
                out.push('\\');
                out.push(c);
            }
            c => out.push(c),
        }
    }
    out
}

/// Opacity ramp: fade in over `fade`, hold, fade out over the last `fade`.
///
/// Commas are graph-escaped so the expression survives inside a filter chain.
pub fn alpha_fade_expr(duration: f64, fade: f64) -> String {
    if fade <= 0.0 {
        return "1".to_string();
    }
    format!(
        "if(lt(t\\,{fade:.3})\\,t/{fade:.3}\\,if(gt(t\\,{end:.3})\\,max({dur:.3}-t\\,0)/{fade:.3}\\,1))",
        fade = fade,
        end = (duration - fade).max(0.0),
        dur = duration
    )
}

/// Centered `drawtext` reading its text from a file.
///
/// Each wrapped line is centered within the block (`text_align`, FFmpeg 6.1+).
/// Blocks wider than the canvas minus [`TEXT_MARGIN`] stay pinned to the left margin.
pub struct DrawText<'a> {
    pub font_file: &'a str,
    pub text_file: &'a str,
    pub font_size: u32,
    pub color: &'a str,
    pub duration: f64,
    pub fade: f64,
}

impl DrawText<'_> {
    pub fn to_filter(&self) -> String {
        format!(
            "drawtext=fontfile={font}:textfile={text}:fontsize={size}:fontcolor={color}:\
             borderw={bw}:bordercolor={bc}:line_spacing={ls}:text_align=C:\
             x=max((w-text_w)/2\\,{inset}):y=(h-text_h)/2:alpha={alpha}",
            font = escape_filter_value(self.font_file),
            text = escape_filter_value(self.text_file),
            size = self.font_size,
            color = escape_filter_value(self.color),
            bw = STROKE_WIDTH,
            bc = STROKE_COLOR,
            ls = LINE_SPACING,
            inset = TEXT_MARGIN / 2,
            alpha = alpha_fade_expr(self.duration, self.fade),
        )
    }
}

/// Audio fade in at the start and out at the end.
pub fn filter_audio_fades(duration: f64, fade: f64) -> String {
    if fade <= 0.0 {
        return "anull".to_string();
    }
    format!(
        "afade=t=in:st=0:d={fade:.3},afade=t=out:st={start:.3}:d={fade:.3}",
        fade = fade,
        start = (duration - fade).max(0.0)
    )
}
