//! Encoding presets, output formats and visual templates.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Default audio codec for rendered output.
pub const DEFAULT_AUDIO_CODEC: &str = "aac";
/// Default audio bitrate for rendered output.
pub const DEFAULT_AUDIO_BITRATE: &str = "192k";
/// Default video codec.
pub const DEFAULT_VIDEO_CODEC: &str = "libx264";

/// Encoder settings for the final write, selected by name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case", from = "String")]
pub enum QualityPreset {
    Low,
    #[default]
    Medium,
    High,
}

impl QualityPreset {
    pub const ALL: [QualityPreset; 3] = [QualityPreset::Low, QualityPreset::Medium, QualityPreset::High];

    /// Parse a preset name, falling back to `Medium` for unknown names.
    pub fn from_name(name: &str) -> Self {
        match name.trim().to_lowercase().as_str() {
            "low" => QualityPreset::Low,
            "high" => QualityPreset::High,
            _ => QualityPreset::Medium,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            QualityPreset::Low => "low",
            QualityPreset::Medium => "medium",
            QualityPreset::High => "high",
        }
    }

    /// Output frame rate.
    pub fn fps(&self) -> u32 {
        match self {
            QualityPreset::Low => 15,
            QualityPreset::Medium => 24,
            QualityPreset::High => 30,
        }
    }

    /// Video codec.
    pub fn codec(&self) -> &'static str {
        DEFAULT_VIDEO_CODEC
    }

    /// Encoder speed/quality preset.
    pub fn encoder_preset(&self) -> &'static str {
        match self {
            QualityPreset::Low => "ultrafast",
            QualityPreset::Medium => "fast",
            QualityPreset::High => "medium",
        }
    }

    /// Encoder thread count.
    pub fn threads(&self) -> u32 {
        match self {
            QualityPreset::Low => 2,
            QualityPreset::Medium => 4,
            QualityPreset::High => 6,
        }
    }
}

impl From<String> for QualityPreset {
    fn from(name: String) -> Self {
        Self::from_name(&name)
    }
}

impl fmt::Display for QualityPreset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Target container shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case", from = "String")]
pub enum OutputFormat {
    #[default]
    Reels,
    Story,
    Post,
}

impl OutputFormat {
    pub const ALL: [OutputFormat; 3] = [OutputFormat::Reels, OutputFormat::Story, OutputFormat::Post];

    /// Parse a format name, falling back to `Reels` for unknown names.
    pub fn from_name(name: &str) -> Self {
        match name.trim().to_lowercase().as_str() {
            "story" => OutputFormat::Story,
            "post" => OutputFormat::Post,
            _ => OutputFormat::Reels,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            OutputFormat::Reels => "reels",
            OutputFormat::Story => "story",
            OutputFormat::Post => "post",
        }
    }

    /// Canvas size (width, height).
    pub fn size(&self) -> (u32, u32) {
        match self {
            OutputFormat::Reels | OutputFormat::Story => (1080, 1920),
            OutputFormat::Post => (1080, 1080),
        }
    }

    /// Advisory maximum duration in seconds. Only logged.
    pub fn max_duration_secs(&self) -> u32 {
        match self {
            OutputFormat::Reels => 30,
            OutputFormat::Story => 15,
            OutputFormat::Post => 60,
        }
    }

    /// Container extension of the written artifact.
    pub fn extension(&self) -> &'static str {
        "mp4"
    }
}

impl From<String> for OutputFormat {
    fn from(name: String) -> Self {
        Self::from_name(&name)
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Background clip family, matched by filename prefix.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum BackgroundStyle {
    #[default]
    Nature,
    Islamic,
    Masjid,
    Night,
    Colorful,
}

impl BackgroundStyle {
    /// Filename prefix of background clips in this style.
    pub fn prefix(&self) -> &'static str {
        match self {
            BackgroundStyle::Nature => "nature_part",
            BackgroundStyle::Islamic => "islamic_part",
            BackgroundStyle::Masjid => "masjid_part",
            BackgroundStyle::Night => "night_part",
            BackgroundStyle::Colorful => "colorful_part",
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            BackgroundStyle::Nature => "nature",
            BackgroundStyle::Islamic => "islamic",
            BackgroundStyle::Masjid => "masjid",
            BackgroundStyle::Night => "night",
            BackgroundStyle::Colorful => "colorful",
        }
    }
}

impl fmt::Display for BackgroundStyle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Overlay text color family.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TextColor {
    White,
    Gold,
    Bright,
}

impl TextColor {
    /// Color value accepted by the `drawtext` filter.
    pub fn ffmpeg_color(&self) -> &'static str {
        match self {
            TextColor::White => "white",
            TextColor::Gold => "#FFD700",
            TextColor::Bright => "#00FFFF",
        }
    }
}

/// Named bundle of visual choices applied across a job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case", from = "String")]
pub enum Template {
    Ramadan,
    #[default]
    Normal,
    Kids,
}

impl Template {
    pub const ALL: [Template; 3] = [Template::Ramadan, Template::Normal, Template::Kids];

    /// Parse a template name, falling back to `Normal` for unknown names.
    pub fn from_name(name: &str) -> Self {
        match name.trim().to_lowercase().as_str() {
            "ramadan" => Template::Ramadan,
            "kids" => Template::Kids,
            _ => Template::Normal,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Template::Ramadan => "ramadan",
            Template::Normal => "normal",
            Template::Kids => "kids",
        }
    }

    pub fn background_style(&self) -> BackgroundStyle {
        match self {
            Template::Ramadan => BackgroundStyle::Night,
            Template::Normal => BackgroundStyle::Nature,
            Template::Kids => BackgroundStyle::Colorful,
        }
    }

    pub fn text_color(&self) -> TextColor {
        match self {
            Template::Ramadan => TextColor::Gold,
            Template::Normal => TextColor::White,
            Template::Kids => TextColor::Bright,
        }
    }

    /// Multiplier applied on top of the word-count font size tier.
    pub fn font_size_multiplier(&self) -> f64 {
        match self {
            Template::Ramadan => 1.2,
            Template::Normal => 1.0,
            Template::Kids => 1.3,
        }
    }
}

impl From<String> for Template {
    fn from(name: String) -> Self {
        Self::from_name(&name)
    }
}

impl fmt::Display for Template {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
