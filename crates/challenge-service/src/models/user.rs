use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// 用户角色
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(type_name = "varchar", rename_all = "lowercase")]
pub enum UserRole {
    #[default]
    User,
    Admin,
}

/// 用户表行
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct User {
    pub id: i64,
    pub name: Option<String>,
    pub email: String,
    pub password_hash: Option<String>,
    pub email_verified: bool,
    pub password_reset_token_hash: Option<String>,
    pub password_reset_expires_at: Option<DateTime<Utc>>,
    pub login_method: String,
    pub role: UserRole,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub last_signed_in_at: Option<DateTime<Utc>>,
}

impl User {
    pub fn is_admin(&self) -> bool {
        self.role == UserRole::Admin
    }

    /// 排行榜与邮件中使用的称呼
    pub fn display_name(&self) -> &str {
        self.name.as_deref().unwrap_or("Anonymous")
    }
}

/// 返回给客户端的用户信息（不含密码和重置 Token）
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PublicUser {
    pub id: i64,
    pub name: Option<String>,
    pub email: String,
    pub role: UserRole,
    pub login_method: String,
    pub created_at: DateTime<Utc>,
    pub last_signed_in_at: Option<DateTime<Utc>>,
}

impl From<User> for PublicUser {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            name: user.name,
            email: user.email,
            role: user.role,
            login_method: user.login_method,
            created_at: user.created_at,
            last_signed_in_at: user.last_signed_in_at,
        }
    }
}

/// 管理端用户概览（含活动统计）
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct UserOverview {
    pub id: i64,
    pub name: Option<String>,
    pub email: String,
    pub role: UserRole,
    pub created_at: DateTime<Utc>,
    pub last_signed_in_at: Option<DateTime<Utc>>,
    pub activity_count: i64,
    pub total_points: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_user() -> User {
        let now = Utc::now();
        User {
            id: 1,
            name: None,
            email: "user@example.com".to_string(),
            password_hash: Some("$2b$12$hash".to_string()),
            email_verified: false,
            password_reset_token_hash: Some("abc".to_string()),
            password_reset_expires_at: None,
            login_method: "email".to_string(),
            role: UserRole::User,
            created_at: now,
            updated_at: now,
            last_signed_in_at: None,
        }
    }

    #[test]
    fn test_display_name_falls_back_to_anonymous() {
        let mut user = sample_user();
        assert_eq!(user.display_name(), "Anonymous");
        user.name = Some("Yusuf".to_string());
        assert_eq!(user.display_name(), "Yusuf");
    }

    #[test]
    fn test_public_user_hides_secrets() {
        let json = serde_json::to_value(PublicUser::from(sample_user())).unwrap();
        assert_eq!(json["role"], "user");
        assert_eq!(json["loginMethod"], "email");
        assert!(json.get("passwordHash").is_none());
        assert!(json.get("passwordResetTokenHash").is_none());
    }
}
