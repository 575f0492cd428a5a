//! 积分计算
//!
//! 固定的活动积分表和纯函数 [`score`]：把某一天提交的各项活动次数映射为整数总分。
//!
//! 积分表中只有 salawat 是"每 10 次 1 分"，其余都是整数倍率，
//! 因此内部以 0.1 分为单位累加，最后一次性四舍五入（0.5 向上）。

use serde::{Deserialize, Serialize};
use validator::Validate;

/// 单项活动的上限（防止恶意数值溢出）
pub const MAX_GENERIC_COUNT: i32 = 100_000;

/// 活动类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ActivityKind {
    DailyPrayer,
    Tahajud,
    Tarawih20,
    Tarawih8,
    Fasting,
    QuranArabic,
    QuranOtherLanguage,
    IslamicBook,
    OtherBook,
    Podcast,
    Salawat,
}

/// 积分倍率：每 `per_units` 次得 `points` 分
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PointRate {
    pub points: i64,
    pub per_units: i64,
}

impl PointRate {
    const fn each(points: i64) -> Self {
        Self { points, per_units: 1 }
    }

    /// 每单位对应的 0.1 分数
    const fn tenths_per_unit(self) -> i64 {
        self.points * 10 / self.per_units
    }
}

impl ActivityKind {
    pub const ALL: [ActivityKind; 11] = [
        ActivityKind::DailyPrayer,
        ActivityKind::Tahajud,
        ActivityKind::Tarawih20,
        ActivityKind::Tarawih8,
        ActivityKind::Fasting,
        ActivityKind::QuranArabic,
        ActivityKind::QuranOtherLanguage,
        ActivityKind::IslamicBook,
        ActivityKind::OtherBook,
        ActivityKind::Podcast,
        ActivityKind::Salawat,
    ];

    /// 积分表
    pub const fn rate(self) -> PointRate {
        match self {
            Self::DailyPrayer => PointRate::each(10),
            Self::Tahajud => PointRate::each(30),
            Self::Tarawih20 => PointRate::each(100),
            Self::Tarawih8 => PointRate::each(40),
            Self::Fasting => PointRate::each(100),
            Self::QuranArabic => PointRate::each(20),
            Self::QuranOtherLanguage => PointRate::each(10),
            Self::IslamicBook => PointRate::each(8),
            Self::OtherBook => PointRate::each(4),
            Self::Podcast => PointRate::each(3),
            Self::Salawat => PointRate { points: 1, per_units: 10 },
        }
    }
}

/// 某一天的各项活动次数
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, Validate, sqlx::FromRow,
)]
#[serde(rename_all = "camelCase", default)]
pub struct ActivityCounts {
    /// 五次礼拜中完成的次数
    #[validate(range(min = 0, max = 5, message = "dailyPrayers must be between 0 and 5"))]
    pub daily_prayers: i32,
    #[validate(range(min = 0, max = 12, message = "tahajud must be between 0 and 12"))]
    pub tahajud: i32,
    #[validate(range(min = 0, max = 1, message = "tarawih20 must be 0 or 1"))]
    pub tarawih20: i32,
    #[validate(range(min = 0, max = 1, message = "tarawih8 must be 0 or 1"))]
    pub tarawih8: i32,
    #[validate(range(min = 0, max = 1, message = "fasting must be 0 or 1"))]
    pub fasting: i32,
    #[validate(range(min = 0, max = 100_000, message = "quranArabicPages is out of range"))]
    pub quran_arabic_pages: i32,
    #[validate(range(min = 0, max = 100_000, message = "quranOtherLanguagePages is out of range"))]
    pub quran_other_language_pages: i32,
    #[validate(range(min = 0, max = 100_000, message = "islamicBookPages is out of range"))]
    pub islamic_book_pages: i32,
    #[validate(range(min = 0, max = 100_000, message = "otherBookPages is out of range"))]
    pub other_book_pages: i32,
    #[validate(range(min = 0, max = 100_000, message = "podcastMinutes is out of range"))]
    pub podcast_minutes: i32,
    #[validate(range(min = 0, max = 100_000, message = "salawat is out of range"))]
    pub salawat: i32,
}

impl ActivityCounts {
    /// 读取某项活动的次数
    pub fn get(&self, kind: ActivityKind) -> i32 {
        match kind {
            ActivityKind::DailyPrayer => self.daily_prayers,
            ActivityKind::Tahajud => self.tahajud,
            ActivityKind::Tarawih20 => self.tarawih20,
            ActivityKind::Tarawih8 => self.tarawih8,
            ActivityKind::Fasting => self.fasting,
            ActivityKind::QuranArabic => self.quran_arabic_pages,
            ActivityKind::QuranOtherLanguage => self.quran_other_language_pages,
            ActivityKind::IslamicBook => self.islamic_book_pages,
            ActivityKind::OtherBook => self.other_book_pages,
            ActivityKind::Podcast => self.podcast_minutes,
            ActivityKind::Salawat => self.salawat,
        }
    }

    /// 设置某项活动的次数
    pub fn with(mut self, kind: ActivityKind, count: i32) -> Self {
        let slot = match kind {
            ActivityKind::DailyPrayer => &mut self.daily_prayers,
            ActivityKind::Tahajud => &mut self.tahajud,
            ActivityKind::Tarawih20 => &mut self.tarawih20,
            ActivityKind::Tarawih8 => &mut self.tarawih8,
            ActivityKind::Fasting => &mut self.fasting,
            ActivityKind::QuranArabic => &mut self.quran_arabic_pages,
            ActivityKind::QuranOtherLanguage => &mut self.quran_other_language_pages,
            ActivityKind::IslamicBook => &mut self.islamic_book_pages,
            ActivityKind::OtherBook => &mut self.other_book_pages,
            ActivityKind::Podcast => &mut self.podcast_minutes,
            ActivityKind::Salawat => &mut self.salawat,
        };
        *slot = count;
        self
    }
}

/// 计算一天的总积分
///
/// 结果等于 Σ 次数 × 倍率，再按 0.5 向上取整。
pub fn score(counts: &ActivityCounts) -> i64 {
    let tenths: i64 = ActivityKind::ALL
        .iter()
        .map(|kind| i64::from(counts.get(*kind)) * kind.rate().tenths_per_unit())
        .sum();

    (tenths + 5).div_euclid(10)
}

/// 积分表条目（用于前端展示规则）
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PointTableEntry {
    pub kind: ActivityKind,
    pub rate: PointRate,
}

/// 完整积分表
pub fn point_table() -> Vec<PointTableEntry> {
    ActivityKind::ALL
        .iter()
        .map(|kind| PointTableEntry {
            kind: *kind,
            rate: kind.rate(),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn only(kind: ActivityKind, count: i32) -> ActivityCounts {
        ActivityCounts::default().with(kind, count)
    }

    #[test]
    fn test_single_activity_points() {
        assert_eq!(score(&only(ActivityKind::DailyPrayer, 5)), 50);
        assert_eq!(score(&only(ActivityKind::QuranArabic, 5)), 100);
        assert_eq!(score(&only(ActivityKind::Fasting, 1)), 100);
        assert_eq!(score(&only(ActivityKind::Tahajud, 2)), 60);
        assert_eq!(score(&only(ActivityKind::Tarawih8, 1)), 40);
        assert_eq!(score(&only(ActivityKind::OtherBook, 10)), 40);
    }

    #[test]
    fn test_combined_day() {
        let counts = ActivityCounts {
            daily_prayers: 5,
            tahajud: 1,
            tarawih20: 1,
            fasting: 1,
            quran_arabic_pages: 3,
            islamic_book_pages: 5,
            podcast_minutes: 10,
            salawat: 100,
            ..Default::default()
        };
        // 50 + 30 + 100 + 100 + 60 + 40 + 30 + 10
        assert_eq!(score(&counts), 420);
    }

    #[test]
    fn test_salawat_rounds_half_up() {
        assert_eq!(score(&only(ActivityKind::Salawat, 4)), 0);
        assert_eq!(score(&only(ActivityKind::Salawat, 5)), 1);
        assert_eq!(score(&only(ActivityKind::Salawat, 14)), 1);
        assert_eq!(score(&only(ActivityKind::Salawat, 15)), 2);
        assert_eq!(score(&only(ActivityKind::Salawat, 33)), 3);
    }

    #[test]
    fn test_empty_day_scores_zero() {
        assert_eq!(score(&ActivityCounts::default()), 0);
    }

    #[test]
    fn test_maximum_day_does_not_overflow() {
        let counts = ActivityKind::ALL.iter().fold(ActivityCounts::default(), |c, k| {
            c.with(*k, MAX_GENERIC_COUNT)
        });
        assert!(score(&counts) > 0);
    }

    #[test]
    fn test_validation_limits() {
        assert!(only(ActivityKind::DailyPrayer, 5).validate().is_ok());
        assert!(only(ActivityKind::DailyPrayer, 6).validate().is_err());
        assert!(only(ActivityKind::Fasting, 2).validate().is_err());
        assert!(only(ActivityKind::Podcast, -1).validate().is_err());
    }

    #[test]
    fn test_counts_deserialize_with_defaults() {
        let counts: ActivityCounts =
            serde_json::from_str(r#"{"dailyPrayers": 3, "salawat": 20}"#).unwrap();
        assert_eq!(counts.daily_prayers, 3);
        assert_eq!(counts.salawat, 20);
        assert_eq!(counts.fasting, 0);
        assert_eq!(score(&counts), 32);
    }

    #[test]
    fn test_point_table_covers_every_kind() {
        let table = point_table();
        assert_eq!(table.len(), ActivityKind::ALL.len());
        let salawat = table.iter().find(|e| e.kind == ActivityKind::Salawat).unwrap();
        assert_eq!(salawat.rate, PointRate { points: 1, per_units: 10 });
    }
}
