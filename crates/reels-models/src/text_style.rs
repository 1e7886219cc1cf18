//! Word-count driven text layout.

use serde::{Deserialize, Serialize};

use crate::presets::Template;

/// Stroke width around overlay glyphs.
pub const STROKE_WIDTH: u32 = 2;
/// Stroke color around overlay glyphs.
pub const STROKE_COLOR: &str = "black";
/// Horizontal margin subtracted from the canvas width.
pub const TEXT_MARGIN: u32 = 100;

/// Font size and wrapping chosen for one verse.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TextStyle {
    pub font_size: u32,
    pub words_per_line: usize,
}

impl TextStyle {
    /// Pick the tier for `text` and scale it by the template multiplier.
    pub fn for_text(text: &str, template: Template) -> Self {
        let (base, words_per_line) = tier(text.split_whitespace().count());
        let font_size = (f64::from(base) * template.font_size_multiplier()).floor() as u32;
        Self {
            font_size,
            words_per_line,
        }
    }

    /// Apply the wrapping to `text`.
    pub fn wrap(&self, text: &str) -> String {
        wrap_words(text, self.words_per_line)
    }
}

fn tier(word_count: usize) -> (u32, usize) {
    match word_count {
        n if n > 60 => (45, 7),
        n if n > 40 => (55, 6),
        n if n > 25 => (65, 5),
        n if n > 15 => (75, 4),
        _ => (90, 3),
    }
}

/// Join words `per_line` at a time, separating lines with `\n`.
pub fn wrap_words(text: &str, per_line: usize) -> String {
    let words: Vec<&str> = text.split_whitespace().collect();
    words
        .chunks(per_line.max(1))
        .map(|line| line.join(" "))
        .collect::<Vec<_>>()
        .join("\n")
}
