//! Static surah and reciter catalog.

use crate::error::{ModelError, ModelResult};

/// Number of surahs in the catalog.
pub const SURAH_COUNT: u32 = 114;

/// Verse counts indexed by `surah - 1`.
const VERSE_COUNTS: [u32; SURAH_COUNT as usize] = [
    7, 286, 200, 176, 120, 165, 206, 75, 129, 109, //
    123, 111, 43, 52, 99, 128, 111, 110, 98, 135, //
    112, 78, 118, 64, 77, 227, 93, 88, 69, 60, //
    34, 30, 73, 54, 45, 83, 182, 88, 75, 85, //
    54, 53, 89, 59, 37, 35, 38, 29, 18, 45, //
    60, 49, 62, 55, 78, 96, 29, 22, 24, 13, //
    14, 11, 11, 18, 12, 12, 30, 52, 52, 44, //
    28, 28, 20, 56, 40, 31, 50, 40, 46, 42, //
    29, 19, 36, 25, 22, 17, 19, 26, 30, 20, //
    15, 21, 11, 8, 8, 19, 5, 8, 8, 11, //
    11, 8, 3, 9, 5, 4, 7, 3, 6, 3, //
    5, 4, 5, 6,
];

/// Arabic surah names indexed by `surah - 1`.
const SURAH_NAMES: [&str; SURAH_COUNT as usize] = [
    "الفاتحة", "البقرة", "آل عمران", "النساء", "المائدة", "الأنعام", "الأعراف", "الأنفال", "التوبة", "يونس",
    "هود", "يوسف", "الرعد", "إبراهيم", "الحجر", "النحل", "الإسراء", "الكهف", "مريم", "طه",
    "الأنبياء", "الحج", "المؤمنون", "النور", "الفرقان", "الشعراء", "النمل", "القصص", "العنكبوت", "الروم",
    "لقمان", "السجدة", "الأحزاب", "سبأ", "فاطر", "يس", "الصافات", "ص", "الزمر", "غافر",
    "فصلت", "الشورى", "الزخرف", "الدخان", "الجاثية", "الأحقاف", "محمد", "الفتح", "الحجرات", "ق",
    "الذاريات", "الطور", "النجم", "القمر", "الرحمن", "الواقعة", "الحديد", "المجادلة", "الحشر", "الممتحنة",
    "الصف", "الجمعة", "المنافقون", "التغابن", "الطلاق", "التحريم", "الملك", "القلم", "الحاقة", "المعارج",
    "نوح", "الجن", "المزمل", "المدثر", "القيامة", "الإنسان", "المرسلات", "النبأ", "النازعات", "عبس",
    "التكوير", "الانفطار", "المطففين", "الانشقاق", "البروج", "الطارق", "الأعلى", "الغاشية", "الفجر", "البلد",
    "الشمس", "الليل", "الضحى", "الشرح", "التين", "العلق", "القدر", "البينة", "الزلزلة", "العاديات",
    "القارعة", "التكاثر", "العصر", "الهمزة", "الفيل", "قريش", "الماعون", "الكوثر", "الكافرون", "النصر",
    "المسد", "الإخلاص", "الفلق", "الناس",
];

/// Reciter display names mapped to the audio service folder id.
const RECITERS: [(&str, &str); 11] = [
    ("الشيخ عبدالباسط عبدالصمد", "AbdulSamad_64kbps_QuranExplorer.Com"),
    ("الشيخ عبدالباسط عبدالصمد (مرتل)", "Abdul_Basit_Murattal_64kbps"),
    ("الشيخ عبدالرحمن السديس", "Abdurrahmaan_As-Sudais_64kbps"),
    ("الشيخ ماهر المعيقلي", "Maher_AlMuaiqly_64kbps"),
    ("الشيخ محمد صديق المنشاوي (مجود)", "Minshawy_Mujawwad_64kbps"),
    ("الشيخ سعود الشريم", "Saood_ash-Shuraym_64kbps"),
    ("الشيخ مشاري العفاسي", "Alafasy_64kbps"),
    ("الشيخ محمود خليل الحصري", "Husary_64kbps"),
    ("الشيخ عبدالله الحذيفي", "Hudhaify_64kbps"),
    ("الشيخ أبو بكر الشاطري", "Abu_Bakr_Ash-Shaatree_128kbps"),
    ("الشيخ محمود علي البنا", "mahmoud_ali_al_banna_32kbps"),
];

/// Number of verses in a surah.
pub fn verse_count(surah: u32) -> ModelResult<u32> {
    if surah == 0 || surah > SURAH_COUNT {
        return Err(ModelError::UnknownSurah(surah));
    }
    Ok(VERSE_COUNTS[(surah - 1) as usize])
}

/// Arabic name of a surah, or `Surah<n>` outside the catalog.
pub fn surah_name(surah: u32) -> String {
    if surah == 0 || surah > SURAH_COUNT {
        return format!("Surah{}", surah);
    }
    SURAH_NAMES[(surah - 1) as usize].to_string()
}

/// All surah names in catalog order.
pub fn surah_names() -> &'static [&'static str] {
    &SURAH_NAMES
}

/// All verse counts in catalog order.
pub fn verse_counts() -> &'static [u32] {
    &VERSE_COUNTS
}

/// Reciter display name / folder id pairs.
pub fn reciters() -> &'static [(&'static str, &'static str)] {
    &RECITERS
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_verse_count_bounds() {
        assert_eq!(verse_count(1).unwrap(), 7);
        assert_eq!(verse_count(2).unwrap(), 286);
        assert_eq!(verse_count(114).unwrap(), 6);
        assert_eq!(verse_count(0), Err(ModelError::UnknownSurah(0)));
        assert_eq!(verse_count(115), Err(ModelError::UnknownSurah(115)));
    }

    #[test]
    fn test_total_verses() {
        let total: u32 = verse_counts().iter().sum();
        assert_eq!(total, 6236);
    }

    #[test]
    fn test_surah_name_fallback() {
        assert_eq!(surah_name(1), "الفاتحة");
        assert_eq!(surah_name(114), "الناس");
        assert_eq!(surah_name(200), "Surah200");
    }
}
