//! 排行榜快照仓储

use async_trait::async_trait;
use chrono::NaiveDate;
use sqlx::PgPool;
use sqlx::types::Json;

use super::traits::SnapshotRepositoryTrait;
use crate::error::Result;
use crate::models::{LeaderboardEntry, LeaderboardSnapshot};

pub struct SnapshotRepository {
    pool: PgPool,
}

impl SnapshotRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl SnapshotRepositoryTrait for SnapshotRepository {
    async fn upsert(
        &self,
        publish_date: NaiveDate,
        rankings: &[LeaderboardEntry],
        published_by: i64,
    ) -> Result<LeaderboardSnapshot> {
        let snapshot = sqlx::query_as::<_, LeaderboardSnapshot>(
            r#"
            INSERT INTO leaderboard_snapshots (publish_date, rankings, published_by)
            VALUES ($1, $2, $3)
            ON CONFLICT (publish_date) DO UPDATE SET
                rankings = EXCLUDED.rankings,
                published_by = EXCLUDED.published_by,
                created_at = NOW()
            RETURNING id, publish_date, rankings, published_by, created_at
            "#,
        )
        .bind(publish_date)
        .bind(Json(rankings))
        .bind(published_by)
        .fetch_one(&self.pool)
        .await?;
        Ok(snapshot)
    }

    async fn find_by_date(&self, publish_date: NaiveDate) -> Result<Option<LeaderboardSnapshot>> {
        let snapshot = sqlx::query_as::<_, LeaderboardSnapshot>(
            r#"
            SELECT id, publish_date, rankings, published_by, created_at
            FROM leaderboard_snapshots
            WHERE publish_date = $1
            "#,
        )
        .bind(publish_date)
        .fetch_optional(&self.pool)
        .await?;
        Ok(snapshot)
    }

    async fn latest(&self) -> Result<Option<LeaderboardSnapshot>> {
        let snapshot = sqlx::query_as::<_, LeaderboardSnapshot>(
            r#"
            SELECT id, publish_date, rankings, published_by, created_at
            FROM leaderboard_snapshots
            ORDER BY created_at DESC, id DESC
            LIMIT 1
            "#,
        )
        .fetch_optional(&self.pool)
        .await?;
        Ok(snapshot)
    }
}
