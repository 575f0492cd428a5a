//! 排行榜模型与排名规则

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::types::Json;

/// 前五名标记阈值
pub const TOP_FIVE: usize = 5;

/// 用户累计积分（聚合查询结果）
#[derive(Debug, Clone, PartialEq, Eq, sqlx::FromRow)]
pub struct UserTotal {
    pub user_id: i64,
    pub user_name: Option<String>,
    pub total_points: i64,
}

/// 排行榜条目
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LeaderboardEntry {
    /// 从 1 开始的名次
    pub rank: u32,
    pub user_id: i64,
    pub user_name: String,
    pub total_points: i64,
    pub is_top_five: bool,
}

/// 生成排名
///
/// 按总分降序，同分按用户 ID 升序；名次即排序后的位置。
pub fn rank_standings(mut totals: Vec<UserTotal>) -> Vec<LeaderboardEntry> {
    totals.sort_by(|a, b| {
        b.total_points
            .cmp(&a.total_points)
            .then_with(|| a.user_id.cmp(&b.user_id))
    });

    totals
        .into_iter()
        .enumerate()
        .map(|(index, total)| LeaderboardEntry {
            rank: index as u32 + 1,
            user_id: total.user_id,
            user_name: total.user_name.unwrap_or_else(|| "Anonymous".to_string()),
            total_points: total.total_points,
            is_top_five: index < TOP_FIVE,
        })
        .collect()
}

/// 已发布的排行榜快照
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct LeaderboardSnapshot {
    pub id: i64,
    pub publish_date: NaiveDate,
    pub rankings: Json<Vec<LeaderboardEntry>>,
    pub published_by: i64,
    pub created_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn total(user_id: i64, name: Option<&str>, points: i64) -> UserTotal {
        UserTotal {
            user_id,
            user_name: name.map(str::to_string),
            total_points: points,
        }
    }

    #[test]
    fn test_rank_orders_by_points_desc() {
        let entries = rank_standings(vec![
            total(1, Some("A"), 100),
            total(2, Some("B"), 420),
            total(3, Some("C"), 250),
        ]);

        let ids: Vec<i64> = entries.iter().map(|e| e.user_id).collect();
        assert_eq!(ids, vec![2, 3, 1]);
        assert_eq!(entries[0].rank, 1);
        assert_eq!(entries[2].rank, 3);
    }

    #[test]
    fn test_ties_broken_by_user_id() {
        let entries = rank_standings(vec![total(9, None, 50), total(4, None, 50)]);
        assert_eq!(entries[0].user_id, 4);
        assert_eq!(entries[1].user_id, 9);
        assert_eq!(entries[1].rank, 2);
    }

    #[test]
    fn test_top_five_flag_and_anonymous_name() {
        let totals = (1..=7).map(|id| total(id, None, 100 - id)).collect();
        let entries = rank_standings(totals);

        assert_eq!(entries.len(), 7);
        assert!(entries[..5].iter().all(|e| e.is_top_five));
        assert!(entries[5..].iter().all(|e| !e.is_top_five));
        assert!(entries.iter().all(|e| e.user_name == "Anonymous"));
    }

    #[test]
    fn test_empty_standings() {
        assert!(rank_standings(Vec::new()).is_empty());
    }

    #[test]
    fn test_entry_json_shape() {
        let entries = rank_standings(vec![total(1, Some("Amina"), 420)]);
        let json = serde_json::to_value(&entries[0]).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "rank": 1,
                "userId": 1,
                "userName": "Amina",
                "totalPoints": 420,
                "isTopFive": true
            })
        );
    }
}
