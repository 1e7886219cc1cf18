//! Output filename derivation.

use chrono::NaiveDate;

use crate::job::UnitRange;
use crate::presets::{QualityPreset, Template};

/// Label used when the requester left the name empty.
pub const DEFAULT_LABEL: &str = "User";

/// Replace path separators and spaces so the label is a single path component.
pub fn sanitize_label(label: &str) -> String {
    let label = label.trim();
    if label.is_empty() {
        return DEFAULT_LABEL.to_string();
    }
    label
        .chars()
        .map(|c| match c {
            ' ' | '/' | '\\' => '_',
            c => c,
        })
        .collect()
}

/// `{label}_{DD-MM-YYYY}_{surah}_Ayah{start}-{end}_{quality}_{template}.{ext}`
pub fn output_filename(
    label: &str,
    date: NaiveDate,
    surah_name: &str,
    range: UnitRange,
    quality: QualityPreset,
    template: Template,
    extension: &str,
) -> String {
    format!(
        "{}_{}_{}_Ayah{}-{}_{}_{}.{}",
        sanitize_label(label),
        date.format("%d-%m-%Y"),
        surah_name,
        range.start,
        range.end,
        quality.as_str(),
        template.as_str(),
        extension
    )
}
