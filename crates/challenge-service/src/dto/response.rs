//! 响应体定义

use serde::Serialize;

use crate::models::{Announcement, PublicUser};

/// API 统一响应
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiResponse<T> {
    pub success: bool,
    pub code: String,
    pub message: String,
    pub data: Option<T>,
}

impl<T> ApiResponse<T> {
    /// 创建成功响应
    pub fn success(data: T) -> Self {
        Self::success_with_message(data, "OK")
    }

    /// 创建成功响应（自定义消息）
    pub fn success_with_message(data: T, message: impl Into<String>) -> Self {
        Self {
            success: true,
            code: "SUCCESS".to_string(),
            message: message.into(),
            data: Some(data),
        }
    }
}

impl ApiResponse<()> {
    /// 创建成功响应（无数据）
    pub fn success_empty() -> Self {
        Self::message("OK")
    }

    /// 只携带提示信息的成功响应
    pub fn message(message: impl Into<String>) -> Self {
        Self {
            success: true,
            code: "SUCCESS".to_string(),
            message: message.into(),
            data: None,
        }
    }
}

/// 登录响应
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginResponse {
    pub token: String,
    /// 过期时间（Unix 时间戳，秒）
    pub expires_at: i64,
    pub user: PublicUser,
}

/// 活动提交结果
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmitActivityResponse {
    pub success: bool,
    pub total_points: i64,
}

/// 实时连接统计
#[derive(Debug, Clone, Copy, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RealtimeStats {
    pub connected_clients: usize,
}

/// 公告发送结果
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SendAnnouncementResponse {
    pub announcement: Announcement,
    pub deliveries: u64,
}

/// 所有者通知结果
#[derive(Debug, Clone, Copy, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NotifyOwnerResponse {
    pub delivered: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_success_envelope() {
        let json = serde_json::to_value(ApiResponse::success(SubmitActivityResponse {
            success: true,
            total_points: 420,
        }))
        .unwrap();

        assert_eq!(json["success"], true);
        assert_eq!(json["code"], "SUCCESS");
        assert_eq!(json["data"]["totalPoints"], 420);
    }

    #[test]
    fn test_null_data_is_serialized() {
        let json = serde_json::to_value(ApiResponse::<Option<i32>>::success(None)).unwrap();
        assert!(json["data"].is_null());

        let json = serde_json::to_value(ApiResponse::message("done")).unwrap();
        assert_eq!(json["message"], "done");
        assert!(json["data"].is_null());
    }
}
