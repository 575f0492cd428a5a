//! 用户偏好仓储

use async_trait::async_trait;
use sqlx::PgPool;

use super::traits::PreferenceRepositoryTrait;
use crate::error::Result;
use crate::models::UserPreferences;

pub struct PreferenceRepository {
    pool: PgPool,
}

impl PreferenceRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl PreferenceRepositoryTrait for PreferenceRepository {
    async fn find(&self, user_id: i64) -> Result<Option<UserPreferences>> {
        let prefs = sqlx::query_as::<_, UserPreferences>(
            r#"
            SELECT id, user_id, notify_on_leaderboard, notify_on_announcements, created_at, updated_at
            FROM user_preferences
            WHERE user_id = $1
            "#,
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(prefs)
    }

    async fn create_default(&self, user_id: i64) -> Result<()> {
        sqlx::query(
            "INSERT INTO user_preferences (user_id) VALUES ($1) ON CONFLICT (user_id) DO NOTHING",
        )
        .bind(user_id)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn upsert(
        &self,
        user_id: i64,
        notify_on_leaderboard: Option<bool>,
        notify_on_announcements: Option<bool>,
    ) -> Result<UserPreferences> {
        // NULL 表示保持原值；新建时未提供的字段取 TRUE
        let prefs = sqlx::query_as::<_, UserPreferences>(
            r#"
            INSERT INTO user_preferences (user_id, notify_on_leaderboard, notify_on_announcements)
            VALUES ($1, COALESCE($2, TRUE), COALESCE($3, TRUE))
            ON CONFLICT (user_id) DO UPDATE SET
                notify_on_leaderboard = COALESCE($2, user_preferences.notify_on_leaderboard),
                notify_on_announcements = COALESCE($3, user_preferences.notify_on_announcements),
                updated_at = NOW()
            RETURNING id, user_id, notify_on_leaderboard, notify_on_announcements, created_at, updated_at
            "#,
        )
        .bind(user_id)
        .bind(notify_on_leaderboard)
        .bind(notify_on_announcements)
        .fetch_one(&self.pool)
        .await?;
        Ok(prefs)
    }
}
