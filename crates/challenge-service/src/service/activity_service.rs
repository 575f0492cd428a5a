//! 每日活动服务

use std::sync::Arc;

use challenge_shared::observability::metrics;
use chrono::NaiveDate;
use tracing::{info, instrument};

use super::LeaderboardService;
use crate::dto::SubmitActivityResponse;
use crate::error::{ApiError, Result};
use crate::models::{DailyActivity, User};
use crate::notifier::OwnerNotifier;
use crate::repository::ActivityRepositoryTrait;
use crate::scoring::{ActivityCounts, score};

/// 解析严格的 YYYY-MM-DD 日期，并要求是真实存在的日期
pub fn parse_activity_date(value: &str) -> Result<NaiveDate> {
    let well_formed = value.len() == 10
        && value.bytes().enumerate().all(|(i, b)| match i {
            4 | 7 => b == b'-',
            _ => b.is_ascii_digit(),
        });

    if !well_formed {
        return Err(ApiError::Validation(
            "Date must be in YYYY-MM-DD format".to_string(),
        ));
    }

    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .map_err(|_| ApiError::Validation(format!("Invalid date: {}", value)))
}

pub struct ActivityService {
    activity_repo: Arc<dyn ActivityRepositoryTrait>,
    leaderboard: Arc<LeaderboardService>,
    notifier: Arc<dyn OwnerNotifier>,
}

impl ActivityService {
    pub fn new(
        activity_repo: Arc<dyn ActivityRepositoryTrait>,
        leaderboard: Arc<LeaderboardService>,
        notifier: Arc<dyn OwnerNotifier>,
    ) -> Self {
        Self {
            activity_repo,
            leaderboard,
            notifier,
        }
    }

    /// 提交（或覆盖）某一天的活动
    ///
    /// 保存后通知所有者并推送最新排行榜。
    #[instrument(skip(self, user, counts, notes), fields(user_id = user.id))]
    pub async fn submit_daily(
        &self,
        user: &User,
        date: &str,
        counts: ActivityCounts,
        notes: Option<String>,
    ) -> Result<SubmitActivityResponse> {
        let date = parse_activity_date(date)?;
        let total_points = score(&counts);
        let stored_points = i32::try_from(total_points)
            .map_err(|_| ApiError::Validation("Activity counts are too large".to_string()))?;

        let notes = notes.map(|n| n.trim().to_string()).filter(|n| !n.is_empty());
        let (_, created) = self
            .activity_repo
            .upsert(user.id, date, counts, stored_points, notes)
            .await?;

        metrics::record_activity_submission(!created, total_points);
        info!(%date, total_points, created, "每日活动已保存");

        self.notifier
            .notify(
                "New Daily Activity Submitted",
                &format!(
                    "{} ({}) submitted activities for {}: {} points",
                    user.display_name(),
                    user.email,
                    date,
                    total_points
                ),
            )
            .await;

        self.leaderboard.broadcast_current().await;

        Ok(SubmitActivityResponse {
            success: true,
            total_points,
        })
    }

    /// 当前用户的全部记录，日期倒序
    pub async fn list_mine(&self, user_id: i64) -> Result<Vec<DailyActivity>> {
        self.activity_repo.list_by_user(user_id).await
    }

    pub async fn get_by_date(&self, user_id: i64, date: &str) -> Result<Option<DailyActivity>> {
        let date = parse_activity_date(date)?;
        self.activity_repo.find_by_date(user_id, date).await
    }

    /// 删除某一天的记录并推送排行榜
    #[instrument(skip(self))]
    pub async fn delete(&self, user_id: i64, date: &str) -> Result<()> {
        let date = parse_activity_date(date)?;
        if !self.activity_repo.delete(user_id, date).await? {
            return Err(ApiError::ActivityNotFound);
        }

        info!(%date, "每日活动已删除");
        self.leaderboard.broadcast_current().await;
        Ok(())
    }
}
