//! 挑战赛服务错误类型定义
//!
//! 所有 HTTP 处理器、服务层和仓储层共用同一个错误枚举，
//! 通过 `IntoResponse` 统一转换为 `{success, code, message, data}` 响应体。

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;

/// 服务错误类型
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    // 认证错误
    #[error("{0}")]
    Unauthorized(String),
    #[error("{0}")]
    Forbidden(String),
    #[error("Invalid email or password")]
    InvalidCredentials,

    // 验证错误
    #[error("{0}")]
    Validation(String),
    #[error("Email already registered")]
    EmailTaken,
    #[error("Invalid or expired reset token")]
    InvalidResetToken,
    #[error("Reset token has expired. Please request a new one.")]
    ResetTokenExpired,

    // 资源不存在
    #[error("Activity not found for this date")]
    ActivityNotFound,
    #[error("Announcement not found: {0}")]
    AnnouncementNotFound(i64),
    #[error("{0}")]
    NotFound(String),

    // 业务冲突
    #[error("Announcement {id} has already been {status}")]
    AnnouncementNotDraft { id: i64, status: String },

    // 外部依赖
    #[error("{0}")]
    EmailDelivery(String),

    // 系统错误
    #[error("数据库错误: {0}")]
    Database(#[from] sqlx::Error),
    #[error("内部错误: {0}")]
    Internal(String),
}

impl ApiError {
    /// 返回对应的 HTTP 状态码
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::Unauthorized(_) | Self::InvalidCredentials => StatusCode::UNAUTHORIZED,
            Self::Forbidden(_) => StatusCode::FORBIDDEN,

            Self::Validation(_)
            | Self::EmailTaken
            | Self::InvalidResetToken
            | Self::ResetTokenExpired => StatusCode::BAD_REQUEST,

            Self::ActivityNotFound
            | Self::AnnouncementNotFound(_)
            | Self::NotFound(_) => StatusCode::NOT_FOUND,

            Self::AnnouncementNotDraft { .. } => StatusCode::CONFLICT,

            Self::EmailDelivery(_) | Self::Database(_) | Self::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    /// 返回错误码（用于 API 响应）
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::Unauthorized(_) => "UNAUTHORIZED",
            Self::Forbidden(_) => "FORBIDDEN",
            Self::InvalidCredentials => "INVALID_CREDENTIALS",
            Self::Validation(_) => "VALIDATION_ERROR",
            Self::EmailTaken => "EMAIL_TAKEN",
            Self::InvalidResetToken => "INVALID_RESET_TOKEN",
            Self::ResetTokenExpired => "RESET_TOKEN_EXPIRED",
            Self::ActivityNotFound => "ACTIVITY_NOT_FOUND",
            Self::AnnouncementNotFound(_) => "ANNOUNCEMENT_NOT_FOUND",
            Self::NotFound(_) => "NOT_FOUND",
            Self::AnnouncementNotDraft { .. } => "ANNOUNCEMENT_NOT_DRAFT",
            Self::EmailDelivery(_) => "EMAIL_DELIVERY_FAILED",
            Self::Database(_) => "DATABASE_ERROR",
            Self::Internal(_) => "INTERNAL_ERROR",
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();

        // 系统级错误只返回通用提示，详细信息仅记录日志
        let message = match &self {
            Self::Database(e) => {
                tracing::error!(error = %e, "数据库操作失败");
                "Internal server error, please try again later".to_string()
            }
            Self::Internal(e) => {
                tracing::error!(error = %e, "内部错误");
                "Internal server error, please try again later".to_string()
            }
            other => other.to_string(),
        };

        let body = json!({
            "success": false,
            "code": self.error_code(),
            "message": message,
            "data": serde_json::Value::Null
        });

        (status, axum::Json(body)).into_response()
    }
}

/// 从 validator 错误转换
///
/// 优先使用字段上声明的 message，便于前端直接展示
impl From<validator::ValidationErrors> for ApiError {
    fn from(errors: validator::ValidationErrors) -> Self {
        Self::Validation(first_message(&errors).unwrap_or_else(|| errors.to_string()))
    }
}

/// 递归查找第一条声明过的错误信息（含嵌套结构体）
fn first_message(errors: &validator::ValidationErrors) -> Option<String> {
    use validator::ValidationErrorsKind;

    errors.errors().values().find_map(|kind| match kind {
        ValidationErrorsKind::Field(errs) => errs
            .iter()
            .find_map(|e| e.message.as_ref().map(|m| m.to_string())),
        ValidationErrorsKind::Struct(nested) => first_message(nested),
        ValidationErrorsKind::List(items) => items.values().find_map(|nested| first_message(nested)),
    })
}

/// 从 JSON 序列化错误转换
impl From<serde_json::Error> for ApiError {
    fn from(err: serde_json::Error) -> Self {
        Self::Internal(format!("JSON 处理错误: {}", err))
    }
}

/// 服务层 Result 类型别名
pub type Result<T> = std::result::Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;
    use validator::Validate;

    fn all_error_variants() -> Vec<(ApiError, StatusCode, &'static str)> {
        vec![
            (ApiError::Unauthorized("missing token".into()), StatusCode::UNAUTHORIZED, "UNAUTHORIZED"),
            (ApiError::Forbidden("admin only".into()), StatusCode::FORBIDDEN, "FORBIDDEN"),
            (ApiError::InvalidCredentials, StatusCode::UNAUTHORIZED, "INVALID_CREDENTIALS"),
            (ApiError::Validation("bad date".into()), StatusCode::BAD_REQUEST, "VALIDATION_ERROR"),
            (ApiError::EmailTaken, StatusCode::BAD_REQUEST, "EMAIL_TAKEN"),
            (ApiError::InvalidResetToken, StatusCode::BAD_REQUEST, "INVALID_RESET_TOKEN"),
            (ApiError::ResetTokenExpired, StatusCode::BAD_REQUEST, "RESET_TOKEN_EXPIRED"),
            (ApiError::ActivityNotFound, StatusCode::NOT_FOUND, "ACTIVITY_NOT_FOUND"),
            (ApiError::AnnouncementNotFound(3), StatusCode::NOT_FOUND, "ANNOUNCEMENT_NOT_FOUND"),
            (ApiError::NotFound("snapshot".into()), StatusCode::NOT_FOUND, "NOT_FOUND"),
            (
                ApiError::AnnouncementNotDraft { id: 1, status: "sent".into() },
                StatusCode::CONFLICT,
                "ANNOUNCEMENT_NOT_DRAFT",
            ),
            (ApiError::EmailDelivery("smtp down".into()), StatusCode::INTERNAL_SERVER_ERROR, "EMAIL_DELIVERY_FAILED"),
            (ApiError::Internal("boom".into()), StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR"),
        ]
    }

    #[test]
    fn test_status_and_code_mapping() {
        for (err, status, code) in all_error_variants() {
            assert_eq!(err.status_code(), status, "status for {:?}", err);
            assert_eq!(err.error_code(), code, "code for {:?}", err);
        }
    }

    #[tokio::test]
    async fn test_internal_details_are_hidden() {
        let response = ApiError::Internal("secret connection string".into()).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["success"], false);
        assert_eq!(json["code"], "INTERNAL_ERROR");
        assert!(!json["message"].as_str().unwrap().contains("secret"));
    }

    #[tokio::test]
    async fn test_business_message_is_exposed() {
        let response = ApiError::ActivityNotFound.into_response();
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["message"], "Activity not found for this date");
    }

    #[derive(Validate)]
    struct SubjectForm {
        #[validate(length(min = 1, message = "Subject is required"))]
        subject: String,
    }

    #[test]
    fn test_validation_uses_field_message() {
        let err: ApiError = SubjectForm { subject: String::new() }.validate().unwrap_err().into();
        assert_eq!(err.to_string(), "Subject is required");
    }
}
