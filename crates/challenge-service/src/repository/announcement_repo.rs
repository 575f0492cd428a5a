//! 公告与投递仓储

use async_trait::async_trait;
use sqlx::PgPool;

use super::traits::AnnouncementRepositoryTrait;
use crate::error::{ApiError, Result};
use crate::models::{
    Announcement, AnnouncementStatus, DeliveryStats, DeliveryStatus, InboxItem, PendingDelivery,
};

const ANNOUNCEMENT_COLUMNS: &str =
    "id, created_by, title, content, status, sent_at, created_at, updated_at";

pub struct AnnouncementRepository {
    pool: PgPool,
}

impl AnnouncementRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl AnnouncementRepositoryTrait for AnnouncementRepository {
    async fn create(&self, created_by: i64, title: &str, content: &str) -> Result<Announcement> {
        let sql = format!(
            r#"
            INSERT INTO announcements (created_by, title, content, status)
            VALUES ($1, $2, $3, 'draft')
            RETURNING {}
            "#,
            ANNOUNCEMENT_COLUMNS
        );
        let announcement = sqlx::query_as::<_, Announcement>(&sql)
            .bind(created_by)
            .bind(title)
            .bind(content)
            .fetch_one(&self.pool)
            .await?;
        Ok(announcement)
    }

    async fn list(&self) -> Result<Vec<Announcement>> {
        let sql = format!(
            "SELECT {} FROM announcements ORDER BY created_at DESC, id DESC",
            ANNOUNCEMENT_COLUMNS
        );
        let announcements = sqlx::query_as::<_, Announcement>(&sql)
            .fetch_all(&self.pool)
            .await?;
        Ok(announcements)
    }

    async fn find(&self, id: i64) -> Result<Option<Announcement>> {
        let sql = format!("SELECT {} FROM announcements WHERE id = $1", ANNOUNCEMENT_COLUMNS);
        let announcement = sqlx::query_as::<_, Announcement>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(announcement)
    }

    async fn mark_sent(&self, id: i64) -> Result<(Announcement, u64)> {
        let mut tx = self.pool.begin().await?;

        // 状态条件放在 UPDATE 里，并发发送时只有一个事务成功
        let sql = format!(
            r#"
            UPDATE announcements
            SET status = 'sent', sent_at = NOW(), updated_at = NOW()
            WHERE id = $1 AND status = 'draft'
            RETURNING {}
            "#,
            ANNOUNCEMENT_COLUMNS
        );
        let announcement = sqlx::query_as::<_, Announcement>(&sql)
            .bind(id)
            .fetch_optional(&mut *tx)
            .await?
            .ok_or_else(|| ApiError::AnnouncementNotDraft {
                id,
                status: "sent".to_string(),
            })?;

        let inserted = sqlx::query(
            r#"
            INSERT INTO announcement_deliveries (announcement_id, user_id, status)
            SELECT $1, id, 'pending' FROM users
            ON CONFLICT (announcement_id, user_id) DO NOTHING
            "#,
        )
        .bind(id)
        .execute(&mut *tx)
        .await?
        .rows_affected();

        tx.commit().await?;

        Ok((announcement, inserted))
    }

    async fn set_status(
        &self,
        id: i64,
        status: AnnouncementStatus,
    ) -> Result<Option<Announcement>> {
        let sql = format!(
            r#"
            UPDATE announcements SET status = $2, updated_at = NOW()
            WHERE id = $1
            RETURNING {}
            "#,
            ANNOUNCEMENT_COLUMNS
        );
        let announcement = sqlx::query_as::<_, Announcement>(&sql)
            .bind(id)
            .bind(status)
            .fetch_optional(&self.pool)
            .await?;
        Ok(announcement)
    }

    async fn delivery_stats(&self, id: i64) -> Result<DeliveryStats> {
        let stats = sqlx::query_as::<_, DeliveryStats>(
            r#"
            SELECT COUNT(*) AS total,
                   COUNT(*) FILTER (WHERE status = 'pending') AS pending,
                   COUNT(*) FILTER (WHERE status = 'delivered') AS delivered,
                   COUNT(*) FILTER (WHERE status = 'read') AS read,
                   COUNT(*) FILTER (WHERE status = 'failed') AS failed
            FROM announcement_deliveries
            WHERE announcement_id = $1
            "#,
        )
        .bind(id)
        .fetch_one(&self.pool)
        .await?;
        Ok(stats)
    }

    async fn claim_pending_deliveries(
        &self,
        limit: i64,
        lease_secs: i64,
    ) -> Result<Vec<PendingDelivery>> {
        // SKIP LOCKED 保证多个实例并行轮询时不会认领同一条
        let deliveries = sqlx::query_as::<_, PendingDelivery>(
            r#"
            WITH claimed AS (
                UPDATE announcement_deliveries
                SET claimed_at = NOW()
                WHERE id IN (
                    SELECT id FROM announcement_deliveries
                    WHERE status = 'pending'
                      AND (claimed_at IS NULL
                           OR claimed_at < NOW() - make_interval(secs => $2))
                    ORDER BY created_at, id
                    LIMIT $1
                    FOR UPDATE SKIP LOCKED
                )
                RETURNING id, announcement_id, user_id, created_at
            )
            SELECT c.id AS delivery_id, c.announcement_id, c.user_id,
                   u.email, u.name AS user_name, a.title, a.content,
                   COALESCE(p.notify_on_announcements, TRUE) AS notify_on_announcements
            FROM claimed c
            JOIN users u ON u.id = c.user_id
            JOIN announcements a ON a.id = c.announcement_id
            LEFT JOIN user_preferences p ON p.user_id = c.user_id
            ORDER BY c.created_at, c.id
            "#,
        )
        .bind(limit)
        .bind(lease_secs as f64)
        .fetch_all(&self.pool)
        .await?;
        Ok(deliveries)
    }

    async fn update_delivery_status(
        &self,
        delivery_id: i64,
        status: DeliveryStatus,
    ) -> Result<bool> {
        // 用户可能已在收件箱标记已读，已读状态不能被覆盖
        let result = sqlx::query(
            r#"
            UPDATE announcement_deliveries
            SET status = $2,
                delivered_at = CASE WHEN $2 = 'delivered' THEN NOW() ELSE delivered_at END,
                updated_at = NOW()
            WHERE id = $1 AND status = 'pending'
            "#,
        )
        .bind(delivery_id)
        .bind(status)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn inbox(&self, user_id: i64) -> Result<Vec<InboxItem>> {
        let items = sqlx::query_as::<_, InboxItem>(
            r#"
            SELECT a.id AS announcement_id, a.title, a.content, a.sent_at,
                   d.status AS delivery_status, d.read_at
            FROM announcement_deliveries d
            JOIN announcements a ON a.id = d.announcement_id
            WHERE d.user_id = $1 AND a.status = 'sent'
            ORDER BY a.sent_at DESC NULLS LAST, a.id DESC
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(items)
    }

    async fn mark_read(&self, user_id: i64, announcement_id: i64) -> Result<bool> {
        let result = sqlx::query(
            r#"
            UPDATE announcement_deliveries
            SET status = 'read', read_at = COALESCE(read_at, NOW()), updated_at = NOW()
            WHERE user_id = $1 AND announcement_id = $2
            "#,
        )
        .bind(user_id)
        .bind(announcement_id)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }
}
