//! Generation requests and per-verse unit tasks.

use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use uuid::Uuid;

use crate::catalog::verse_count;
use crate::error::ModelResult;
use crate::presets::{BackgroundStyle, OutputFormat, QualityPreset, Template};

/// Default number of verses covered when no end verse is given.
pub const DEFAULT_SPAN: u32 = 10;

/// Unique identifier for a job.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct JobId(pub String);

impl JobId {
    /// Generate a new random job ID.
    pub fn new() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for JobId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Language used for user-facing status messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case", from = "String")]
pub enum Language {
    #[default]
    Ar,
    En,
}

impl From<String> for Language {
    fn from(code: String) -> Self {
        match code.trim().to_lowercase().as_str() {
            "en" => Language::En,
            _ => Language::Ar,
        }
    }
}

/// A request to render one video.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobRequest {
    /// Audio service folder id of the reciter
    pub reciter: String,
    #[serde(deserialize_with = "number_or_string")]
    pub surah: u32,
    #[serde(deserialize_with = "number_or_string")]
    pub start_ayah: u32,
    #[serde(default, deserialize_with = "optional_number_or_string")]
    pub end_ayah: Option<u32>,
    #[serde(default)]
    pub quality: QualityPreset,
    #[serde(default)]
    pub format: OutputFormat,
    #[serde(default)]
    pub template: Template,
    /// Free-form requester label placed at the start of the filename
    #[serde(default)]
    pub person_name: String,
    #[serde(default)]
    pub language: Language,
}

impl JobRequest {
    pub fn new(reciter: impl Into<String>, surah: u32, start_ayah: u32, end_ayah: Option<u32>) -> Self {
        Self {
            reciter: reciter.into(),
            surah,
            start_ayah,
            end_ayah,
            quality: QualityPreset::default(),
            format: OutputFormat::default(),
            template: Template::default(),
            person_name: String::new(),
            language: Language::default(),
        }
    }

    pub fn with_quality(mut self, quality: QualityPreset) -> Self {
        self.quality = quality;
        self
    }

    pub fn with_format(mut self, format: OutputFormat) -> Self {
        self.format = format;
        self
    }

    pub fn with_template(mut self, template: Template) -> Self {
        self.template = template;
        self
    }

    pub fn with_person_name(mut self, name: impl Into<String>) -> Self {
        self.person_name = name.into();
        self
    }

    pub fn with_language(mut self, language: Language) -> Self {
        self.language = language;
        self
    }

    /// Resolve the verse range against the catalog.
    pub fn resolve_range(&self) -> ModelResult<UnitRange> {
        UnitRange::resolve(self.surah, self.start_ayah, self.end_ayah)
    }

    /// Build one task per verse in `range`, in output order.
    pub fn unit_tasks(&self, range: UnitRange) -> Vec<UnitTask> {
        range
            .iter()
            .enumerate()
            .map(|(i, ayah)| UnitTask {
                sequence_index: i + 1,
                surah: self.surah,
                ayah,
                reciter: self.reciter.clone(),
                template: self.template,
                background_style: self.template.background_style(),
            })
            .collect()
    }
}

/// Inclusive, clamped verse range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnitRange {
    pub start: u32,
    pub end: u32,
}

impl UnitRange {
    /// Clamp a requested range into the surah's verse bounds.
    ///
    /// A missing end covers [`DEFAULT_SPAN`] verses; an end before the start
    /// collapses to a single verse.
    pub fn resolve(surah: u32, start: u32, end: Option<u32>) -> ModelResult<Self> {
        let max = verse_count(surah)?;
        let start = start.clamp(1, max);
        let end = match end {
            Some(end) => end.min(max),
            None => start.saturating_add(DEFAULT_SPAN - 1).min(max),
        };
        let end = end.max(start);
        Ok(Self { start, end })
    }

    /// Number of verses; a resolved range always holds at least one.
    #[allow(clippy::len_without_is_empty)]
    pub fn len(&self) -> usize {
        (self.end - self.start + 1) as usize
    }

    pub fn iter(&self) -> impl Iterator<Item = u32> {
        self.start..=self.end
    }
}

/// One verse of work. `sequence_index` is the only ordering authority.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnitTask {
    /// 1-based position in the output
    pub sequence_index: usize,
    pub surah: u32,
    pub ayah: u32,
    pub reciter: String,
    pub template: Template,
    pub background_style: BackgroundStyle,
}

/// Accept a JSON number or a numeric string.
pub fn number_or_string<'de, D>(deserializer: D) -> Result<u32, D::Error>
where
    D: Deserializer<'de>,
{
    optional_number_or_string(deserializer)?
        .ok_or_else(|| serde::de::Error::custom("expected a number"))
}

/// Like [`number_or_string`]; `null` and empty strings read as `None`.
pub fn optional_number_or_string<'de, D>(deserializer: D) -> Result<Option<u32>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    match value {
        serde_json::Value::Null => Ok(None),
        serde_json::Value::Number(n) => n
            .as_u64()
            .and_then(|n| u32::try_from(n).ok())
            .map(Some)
            .ok_or_else(|| serde::de::Error::custom(format!("invalid number: {}", n))),
        serde_json::Value::String(s) if s.trim().is_empty() => Ok(None),
        serde_json::Value::String(s) => s
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| serde::de::Error::custom(format!("invalid number: {}", s))),
        other => Err(serde::de::Error::custom(format!("expected a number, got {}", other))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ModelError;

    #[test]
    fn test_range_defaults_to_ten() {
        let range = UnitRange::resolve(2, 1, None).unwrap();
        assert_eq!(range, UnitRange { start: 1, end: 10 });
        assert_eq!(range.len(), 10);
    }

    #[test]
    fn test_range_clamps_to_surah() {
        // Al-Fatiha has 7 verses
        assert_eq!(UnitRange::resolve(1, 3, None).unwrap(), UnitRange { start: 3, end: 7 });
        assert_eq!(UnitRange::resolve(1, 2, Some(50)).unwrap(), UnitRange { start: 2, end: 7 });
        assert_eq!(UnitRange::resolve(1, 20, Some(30)).unwrap(), UnitRange { start: 7, end: 7 });
        assert_eq!(UnitRange::resolve(1, 0, Some(1)).unwrap(), UnitRange { start: 1, end: 1 });
    }

    #[test]
    fn test_range_end_before_start() {
        let range = UnitRange::resolve(2, 20, Some(5)).unwrap();
        assert_eq!(range, UnitRange { start: 20, end: 20 });
        assert_eq!(range.len(), 1);
    }

    #[test]
    fn test_range_invariants_hold_everywhere() {
        for surah in [1, 2, 108, 114] {
            let max = verse_count(surah).unwrap();
            for start in 0..=max + 2 {
                for end in [None, Some(0), Some(1), Some(start), Some(max), Some(max + 5)] {
                    let range = UnitRange::resolve(surah, start, end).unwrap();
                    assert!(range.end >= range.start);
                    assert!(range.start >= 1 && range.end <= max);
                    assert_eq!(range.iter().count(), range.len());
                }
            }
        }
    }

    #[test]
    fn test_unknown_surah_rejected() {
        assert_eq!(UnitRange::resolve(0, 1, None), Err(ModelError::UnknownSurah(0)));
        assert_eq!(UnitRange::resolve(115, 1, None), Err(ModelError::UnknownSurah(115)));
    }

    #[test]
    fn test_unit_tasks_are_sequenced() {
        let request = JobRequest::new("Alafasy_64kbps", 1, 2, Some(4)).with_template(Template::Ramadan);
        let tasks = request.unit_tasks(request.resolve_range().unwrap());
        assert_eq!(tasks.len(), 3);
        assert_eq!(
            tasks.iter().map(|t| (t.sequence_index, t.ayah)).collect::<Vec<_>>(),
            vec![(1, 2), (2, 3), (3, 4)]
        );
        assert!(tasks.iter().all(|t| t.background_style == BackgroundStyle::Night));
    }

    #[test]
    fn test_request_from_form_json() {
        let json = r#"{
            "reciter": "Husary_64kbps",
            "surah": "18",
            "startAyah": 1,
            "endAyah": "",
            "quality": "high",
            "format": "story",
            "template": "kids",
            "personName": "Ali"
        }"#;
        let request: JobRequest = serde_json::from_str(json).unwrap();
        assert_eq!(request.surah, 18);
        assert_eq!(request.end_ayah, None);
        assert_eq!(request.quality, QualityPreset::High);
        assert_eq!(request.format, OutputFormat::Story);
        assert_eq!(request.template, Template::Kids);
        assert_eq!(request.language, Language::Ar);
    }

    #[test]
    fn test_request_defaults() {
        let request: JobRequest =
            serde_json::from_str(r#"{"reciter": "x", "surah": 1, "startAyah": 1, "language": "en"}"#).unwrap();
        assert_eq!(request.quality, QualityPreset::Medium);
        assert_eq!(request.template, Template::Normal);
        assert_eq!(request.language, Language::En);
        assert!(request.person_name.is_empty());
    }
}
