//! User-facing status messages in the request's display language.

use crate::job::Language;
use crate::presets::QualityPreset;

/// A status update shown to the requester.
#[derive(Debug, Clone, PartialEq)]
pub enum StatusMessage<'a> {
    Preparing,
    Clearing,
    PreparingUnits { total: usize, quality: QualityPreset },
    Processed { done: usize, total: usize },
    Concatenating,
    Writing,
    Success,
    Failed(&'a str),
    AlreadyRunning,
    Accepted,
}

impl StatusMessage<'_> {
    pub fn render(&self, language: Language) -> String {
        match language {
            Language::Ar => self.arabic(),
            Language::En => self.english(),
        }
    }

    fn arabic(&self) -> String {
        match self {
            StatusMessage::Preparing => "جاري التحضير...".to_string(),
            StatusMessage::Clearing => "جاري تنظيف ملفات الإخراج...".to_string(),
            StatusMessage::PreparingUnits { total, quality } => {
                format!("جاري تحضير {} آيات بجودة {}...", total, quality)
            }
            StatusMessage::Processed { done, total } => format!("تم معالجة {}/{} آيات...", done, total),
            StatusMessage::Concatenating => "جاري دمج المقاطع...".to_string(),
            StatusMessage::Writing => "جاري كتابة الفيديو النهائي...".to_string(),
            StatusMessage::Success => "تم بنجاح!".to_string(),
            StatusMessage::Failed(msg) => format!("خطأ: {}", msg),
            StatusMessage::AlreadyRunning => "عملية إنشاء فيديو قيد التنفيذ بالفعل".to_string(),
            StatusMessage::Accepted => "بدأ إنشاء الفيديو".to_string(),
        }
    }

    fn english(&self) -> String {
        match self {
            StatusMessage::Preparing => "Preparing...".to_string(),
            StatusMessage::Clearing => "Clearing output files...".to_string(),
            StatusMessage::PreparingUnits { total, quality } => {
                format!("Preparing {} verses at {} quality...", total, quality)
            }
            StatusMessage::Processed { done, total } => format!("Processed {}/{} verses...", done, total),
            StatusMessage::Concatenating => "Merging segments...".to_string(),
            StatusMessage::Writing => "Writing final video...".to_string(),
            StatusMessage::Success => "Done!".to_string(),
            StatusMessage::Failed(msg) => format!("Error: {}", msg),
            StatusMessage::AlreadyRunning => "A video generation is already in progress".to_string(),
            StatusMessage::Accepted => "Video generation started".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_languages() {
        let msg = StatusMessage::Processed { done: 2, total: 5 };
        assert_eq!(msg.render(Language::Ar), "تم معالجة 2/5 آيات...");
        assert_eq!(msg.render(Language::En), "Processed 2/5 verses...");
    }

    #[test]
    fn test_failure_carries_message() {
        assert_eq!(StatusMessage::Failed("boom").render(Language::En), "Error: boom");
        assert!(StatusMessage::Failed("boom").render(Language::Ar).ends_with("boom"));
    }

    #[test]
    fn test_preparing_units_mentions_quality() {
        let msg = StatusMessage::PreparingUnits {
            total: 3,
            quality: QualityPreset::High,
        };
        assert_eq!(msg.render(Language::En), "Preparing 3 verses at high quality...");
    }
}
