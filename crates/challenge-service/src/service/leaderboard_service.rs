//! 排行榜服务
//!
//! 实时排名每次从数据库计算；发布时保存快照并通知订阅用户。

use std::sync::Arc;

use chrono::NaiveDate;
use futures::StreamExt;
use tracing::{error, info, instrument, warn};

use crate::email::{EmailSender, templates};
use crate::error::Result;
use crate::models::{LeaderboardEntry, LeaderboardSnapshot, TOP_FIVE, rank_standings};
use crate::notifier::OwnerNotifier;
use crate::realtime::{BroadcastReport, ConnectionRegistry};
use crate::repository::{ActivityRepositoryTrait, SnapshotRepositoryTrait, UserRepositoryTrait};

/// 发布通知邮件的并发数
const PUBLISH_EMAIL_CONCURRENCY: usize = 8;

pub struct LeaderboardService {
    activity_repo: Arc<dyn ActivityRepositoryTrait>,
    snapshot_repo: Arc<dyn SnapshotRepositoryTrait>,
    user_repo: Arc<dyn UserRepositoryTrait>,
    email: Arc<dyn EmailSender>,
    notifier: Arc<dyn OwnerNotifier>,
    registry: Arc<ConnectionRegistry>,
    public_base_url: String,
}

impl LeaderboardService {
    pub fn new(
        activity_repo: Arc<dyn ActivityRepositoryTrait>,
        snapshot_repo: Arc<dyn SnapshotRepositoryTrait>,
        user_repo: Arc<dyn UserRepositoryTrait>,
        email: Arc<dyn EmailSender>,
        notifier: Arc<dyn OwnerNotifier>,
        registry: Arc<ConnectionRegistry>,
        public_base_url: impl Into<String>,
    ) -> Self {
        Self {
            activity_repo,
            snapshot_repo,
            user_repo,
            email,
            notifier,
            registry,
            public_base_url: public_base_url.into(),
        }
    }

    /// 当前排名
    pub async fn current(&self) -> Result<Vec<LeaderboardEntry>> {
        let totals = self.activity_repo.user_totals().await?;
        Ok(rank_standings(totals))
    }

    /// 重新计算排名并推送给所有实时连接
    ///
    /// 推送失败不影响触发它的写操作，只记录日志。
    pub async fn broadcast_current(&self) -> Option<BroadcastReport> {
        match self.current().await {
            Ok(entries) => Some(self.registry.broadcast(&entries)),
            Err(e) => {
                error!(error = %e, "排行榜计算失败，跳过广播");
                None
            }
        }
    }

    /// 发布指定日期的排行榜快照
    #[instrument(skip(self))]
    pub async fn publish(&self, date: NaiveDate, published_by: i64) -> Result<Vec<LeaderboardEntry>> {
        let entries = self.current().await?;
        self.snapshot_repo.upsert(date, &entries, published_by).await?;

        info!(%date, participants = entries.len(), "排行榜快照已发布");

        let summary = entries
            .iter()
            .take(TOP_FIVE)
            .map(|e| format!("#{} {} ({} pts)", e.rank, e.user_name, e.total_points))
            .collect::<Vec<_>>()
            .join("\n");
        self.notifier
            .notify(
                "Leaderboard Published",
                &format!("Leaderboard for {} published.\n{}", date, summary),
            )
            .await;

        self.email_subscribers(date, &entries).await;

        Ok(entries)
    }

    async fn email_subscribers(&self, date: NaiveDate, entries: &[LeaderboardEntry]) {
        let recipients = match self.user_repo.list_leaderboard_recipients().await {
            Ok(recipients) => recipients,
            Err(e) => {
                warn!(error = %e, "查询排行榜通知收件人失败");
                return;
            }
        };

        let top = &entries[..entries.len().min(TOP_FIVE)];
        let url = format!("{}/leaderboard", self.public_base_url.trim_end_matches('/'));

        let failed = futures::stream::iter(recipients)
            .map(|recipient| {
                let message = templates::leaderboard_published(
                    &recipient.email,
                    recipient.name.as_deref().unwrap_or("Participant"),
                    date,
                    top,
                    &url,
                );
                async move { self.email.send("leaderboard_published", message).await.is_err() }
            })
            .buffer_unordered(PUBLISH_EMAIL_CONCURRENCY)
            .filter(|failed| std::future::ready(*failed))
            .count()
            .await;

        if failed > 0 {
            warn!(%date, failed, "部分排行榜通知邮件发送失败");
        }
    }

    /// 指定日期的快照排名
    pub async fn history(&self, date: NaiveDate) -> Result<Option<Vec<LeaderboardEntry>>> {
        let snapshot = self.snapshot_repo.find_by_date(date).await?;
        Ok(snapshot.map(|s| s.rankings.0))
    }

    /// 最近一次发布的快照
    pub async fn latest(&self) -> Result<Option<LeaderboardSnapshot>> {
        self.snapshot_repo.latest().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::email::{EmailError, MockEmailSender};
    use crate::models::UserTotal;
    use crate::notifier::MockOwnerNotifier;
    use crate::repository::{
        MockActivityRepositoryTrait, MockSnapshotRepositoryTrait, MockUserRepositoryTrait,
        Recipient,
    };
    use chrono::Utc;
    use sqlx::types::Json;

    struct Mocks {
        activity: MockActivityRepositoryTrait,
        snapshot: MockSnapshotRepositoryTrait,
        user: MockUserRepositoryTrait,
        email: MockEmailSender,
        notifier: MockOwnerNotifier,
    }

    impl Mocks {
        fn new() -> Self {
            Self {
                activity: MockActivityRepositoryTrait::new(),
                snapshot: MockSnapshotRepositoryTrait::new(),
                user: MockUserRepositoryTrait::new(),
                email: MockEmailSender::new(),
                notifier: MockOwnerNotifier::new(),
            }
        }

        fn build(self, registry: Arc<ConnectionRegistry>) -> LeaderboardService {
            LeaderboardService::new(
                Arc::new(self.activity),
                Arc::new(self.snapshot),
                Arc::new(self.user),
                Arc::new(self.email),
                Arc::new(self.notifier),
                registry,
                "https://challenge.example.com/",
            )
        }
    }

    fn totals() -> Vec<UserTotal> {
        vec![
            UserTotal { user_id: 1, user_name: Some("Amina".into()), total_points: 300 },
            UserTotal { user_id: 2, user_name: None, total_points: 420 },
        ]
    }

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 3, 10).unwrap()
    }

    #[tokio::test]
    async fn test_current_ranks_totals() {
        let mut mocks = Mocks::new();
        mocks.activity.expect_user_totals().returning(|| Ok(totals()));
        let service = mocks.build(Arc::new(ConnectionRegistry::new(4)));

        let entries = service.current().await.unwrap();
        assert_eq!(entries[0].user_id, 2);
        assert_eq!(entries[0].user_name, "Anonymous");
        assert_eq!(entries[1].rank, 2);
    }

    #[tokio::test]
    async fn test_broadcast_current_pushes_to_clients() {
        let mut mocks = Mocks::new();
        mocks.activity.expect_user_totals().returning(|| Ok(totals()));
        let registry = Arc::new(ConnectionRegistry::new(4));
        let (_, _, mut rx) = registry.register();
        let service = mocks.build(registry);

        let report = service.broadcast_current().await.unwrap();
        assert_eq!(report.sent, 1);
        assert!(rx.recv().await.is_some());
    }

    #[tokio::test]
    async fn test_broadcast_skipped_when_query_fails() {
        let mut mocks = Mocks::new();
        mocks
            .activity
            .expect_user_totals()
            .returning(|| Err(crate::error::ApiError::Internal("db down".into())));
        let service = mocks.build(Arc::new(ConnectionRegistry::new(4)));

        assert!(service.broadcast_current().await.is_none());
    }

    #[tokio::test]
    async fn test_publish_stores_snapshot_and_notifies() {
        let mut mocks = Mocks::new();
        mocks.activity.expect_user_totals().returning(|| Ok(totals()));
        mocks
            .snapshot
            .expect_upsert()
            .withf(|d, rankings, by| *d == date() && rankings.len() == 2 && *by == 99)
            .times(1)
            .returning(|d, rankings, by| {
                Ok(LeaderboardSnapshot {
                    id: 1,
                    publish_date: d,
                    rankings: Json(rankings.to_vec()),
                    published_by: by,
                    created_at: Utc::now(),
                })
            });
        mocks
            .notifier
            .expect_notify()
            .withf(|title, _| title.to_string() == "Leaderboard Published")
            .times(1)
            .returning(|_, _| true);
        mocks.user.expect_list_leaderboard_recipients().returning(|| {
            Ok(vec![
                Recipient { user_id: 1, email: "a@example.com".into(), name: Some("Amina".into()) },
                Recipient { user_id: 2, email: "b@example.com".into(), name: None },
            ])
        });
        mocks
            .email
            .expect_send()
            .withf(|kind, message| {
                kind.to_string() == "leaderboard_published"
                    && message.html.contains("https://challenge.example.com/leaderboard")
            })
            .times(2)
            .returning(|_, message| {
                if message.to == "b@example.com" {
                    Err(EmailError::NotConfigured)
                } else {
                    Ok(())
                }
            });
        let service = mocks.build(Arc::new(ConnectionRegistry::new(4)));

        let entries = service.publish(date(), 99).await.unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].total_points, 420);
    }

    #[tokio::test]
    async fn test_history_returns_stored_rankings() {
        let mut mocks = Mocks::new();
        mocks.snapshot.expect_find_by_date().returning(|d| {
            Ok(Some(LeaderboardSnapshot {
                id: 3,
                publish_date: d,
                rankings: Json(rank_standings(totals())),
                published_by: 1,
                created_at: Utc::now(),
            }))
        });
        let service = mocks.build(Arc::new(ConnectionRegistry::new(4)));

        let rankings = service.history(date()).await.unwrap().unwrap();
        assert_eq!(rankings.len(), 2);
    }

    #[tokio::test]
    async fn test_latest_none_when_nothing_published() {
        let mut mocks = Mocks::new();
        mocks.snapshot.expect_latest().returning(|| Ok(None));
        let service = mocks.build(Arc::new(ConnectionRegistry::new(4)));

        assert!(service.latest().await.unwrap().is_none());
    }
}
