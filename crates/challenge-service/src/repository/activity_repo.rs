//! 每日活动仓储

use async_trait::async_trait;
use chrono::NaiveDate;
use sqlx::PgPool;

use super::traits::ActivityRepositoryTrait;
use crate::error::Result;
use crate::models::{DailyActivity, UserTotal};
use crate::scoring::ActivityCounts;

const ACTIVITY_COLUMNS: &str = r#"
    id, user_id, activity_date, daily_prayers, tahajud, tarawih20, tarawih8, fasting,
    quran_arabic_pages, quran_other_language_pages, islamic_book_pages, other_book_pages,
    podcast_minutes, salawat, total_points, notes, created_at, updated_at
"#;

/// upsert 返回行，`inserted` 由 `xmax = 0` 判断
#[derive(sqlx::FromRow)]
struct UpsertRow {
    #[sqlx(flatten)]
    activity: DailyActivity,
    inserted: bool,
}

pub struct ActivityRepository {
    pool: PgPool,
}

impl ActivityRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ActivityRepositoryTrait for ActivityRepository {
    async fn upsert(
        &self,
        user_id: i64,
        date: NaiveDate,
        counts: ActivityCounts,
        total_points: i32,
        notes: Option<String>,
    ) -> Result<(DailyActivity, bool)> {
        let sql = format!(
            r#"
            INSERT INTO daily_activities (
                user_id, activity_date, daily_prayers, tahajud, tarawih20, tarawih8, fasting,
                quran_arabic_pages, quran_other_language_pages, islamic_book_pages,
                other_book_pages, podcast_minutes, salawat, total_points, notes
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15)
            ON CONFLICT (user_id, activity_date) DO UPDATE SET
                daily_prayers = EXCLUDED.daily_prayers,
                tahajud = EXCLUDED.tahajud,
                tarawih20 = EXCLUDED.tarawih20,
                tarawih8 = EXCLUDED.tarawih8,
                fasting = EXCLUDED.fasting,
                quran_arabic_pages = EXCLUDED.quran_arabic_pages,
                quran_other_language_pages = EXCLUDED.quran_other_language_pages,
                islamic_book_pages = EXCLUDED.islamic_book_pages,
                other_book_pages = EXCLUDED.other_book_pages,
                podcast_minutes = EXCLUDED.podcast_minutes,
                salawat = EXCLUDED.salawat,
                total_points = EXCLUDED.total_points,
                notes = EXCLUDED.notes,
                updated_at = NOW()
            RETURNING {}, (xmax = 0) AS inserted
            "#,
            ACTIVITY_COLUMNS
        );

        let row = sqlx::query_as::<_, UpsertRow>(&sql)
            .bind(user_id)
            .bind(date)
            .bind(counts.daily_prayers)
            .bind(counts.tahajud)
            .bind(counts.tarawih20)
            .bind(counts.tarawih8)
            .bind(counts.fasting)
            .bind(counts.quran_arabic_pages)
            .bind(counts.quran_other_language_pages)
            .bind(counts.islamic_book_pages)
            .bind(counts.other_book_pages)
            .bind(counts.podcast_minutes)
            .bind(counts.salawat)
            .bind(total_points)
            .bind(notes)
            .fetch_one(&self.pool)
            .await?;

        Ok((row.activity, row.inserted))
    }

    async fn list_by_user(&self, user_id: i64) -> Result<Vec<DailyActivity>> {
        let sql = format!(
            "SELECT {} FROM daily_activities WHERE user_id = $1 ORDER BY activity_date DESC",
            ACTIVITY_COLUMNS
        );
        let activities = sqlx::query_as::<_, DailyActivity>(&sql)
            .bind(user_id)
            .fetch_all(&self.pool)
            .await?;
        Ok(activities)
    }

    async fn find_by_date(&self, user_id: i64, date: NaiveDate) -> Result<Option<DailyActivity>> {
        let sql = format!(
            "SELECT {} FROM daily_activities WHERE user_id = $1 AND activity_date = $2",
            ACTIVITY_COLUMNS
        );
        let activity = sqlx::query_as::<_, DailyActivity>(&sql)
            .bind(user_id)
            .bind(date)
            .fetch_optional(&self.pool)
            .await?;
        Ok(activity)
    }

    async fn delete(&self, user_id: i64, date: NaiveDate) -> Result<bool> {
        let result =
            sqlx::query("DELETE FROM daily_activities WHERE user_id = $1 AND activity_date = $2")
                .bind(user_id)
                .bind(date)
                .execute(&self.pool)
                .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn user_totals(&self) -> Result<Vec<UserTotal>> {
        let totals = sqlx::query_as::<_, UserTotal>(
            r#"
            SELECT u.id AS user_id, u.name AS user_name,
                   SUM(a.total_points)::BIGINT AS total_points
            FROM daily_activities a
            JOIN users u ON u.id = a.user_id
            GROUP BY u.id, u.name
            ORDER BY total_points DESC, u.id ASC
            "#,
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(totals)
    }
}
