//! 账号服务
//!
//! 邮箱密码注册与登录、密码重置、显示名称修改。

use std::sync::Arc;

use chrono::{Duration, Utc};
use tracing::{info, instrument, warn};

use super::LeaderboardService;
use crate::auth::{
    JwtManager, generate_reset_token, hash_password, hash_reset_token, verify_password,
};
use crate::email::{EmailSender, templates};
use crate::error::{ApiError, Result};
use crate::models::{PublicUser, User, UserRole};
use crate::repository::{NewUser, PreferenceRepositoryTrait, UserRepositoryTrait};

/// 无论邮箱是否存在都返回同一提示
pub const RESET_REQUEST_MESSAGE: &str =
    "If an account exists with this email, you will receive a password reset link shortly.";

/// 登录结果
#[derive(Debug)]
pub struct LoginOutcome {
    pub token: String,
    pub expires_at: i64,
    pub user: PublicUser,
}

pub struct AuthService {
    user_repo: Arc<dyn UserRepositoryTrait>,
    preference_repo: Arc<dyn PreferenceRepositoryTrait>,
    email: Arc<dyn EmailSender>,
    jwt: JwtManager,
    leaderboard: Arc<LeaderboardService>,
    owner_email: Option<String>,
    reset_ttl: Duration,
}

impl AuthService {
    pub fn new(
        user_repo: Arc<dyn UserRepositoryTrait>,
        preference_repo: Arc<dyn PreferenceRepositoryTrait>,
        email: Arc<dyn EmailSender>,
        jwt: JwtManager,
        leaderboard: Arc<LeaderboardService>,
        owner_email: Option<String>,
        reset_ttl_seconds: i64,
    ) -> Self {
        Self {
            user_repo,
            preference_repo,
            email,
            jwt,
            leaderboard,
            owner_email: owner_email.map(|e| e.trim().to_lowercase()),
            reset_ttl: Duration::seconds(reset_ttl_seconds),
        }
    }

    fn normalize_email(email: &str) -> String {
        email.trim().to_lowercase()
    }

    /// 注册新账号
    ///
    /// 所有者邮箱自动获得管理员角色；欢迎邮件失败不影响注册结果。
    #[instrument(skip(self, name, password))]
    pub async fn register(
        &self,
        email: &str,
        name: &str,
        password: &str,
        origin: &str,
    ) -> Result<PublicUser> {
        let email = Self::normalize_email(email);
        if self.user_repo.find_by_email(&email).await?.is_some() {
            return Err(ApiError::EmailTaken);
        }

        let role = if self.owner_email.as_deref() == Some(email.as_str()) {
            UserRole::Admin
        } else {
            UserRole::User
        };

        let new_user = NewUser {
            email: email.clone(),
            name: name.trim().to_string(),
            password_hash: hash_password(password)?,
            role,
        };
        let user = self.user_repo.create(&new_user).await.map_err(|e| match e {
            // 并发注册同一邮箱时由唯一约束兜底
            ApiError::Database(sqlx::Error::Database(db)) if db.is_unique_violation() => {
                ApiError::EmailTaken
            }
            other => other,
        })?;

        self.preference_repo.create_default(user.id).await?;

        info!(user_id = user.id, role = ?user.role, "新用户注册");

        let welcome = templates::welcome(
            &user.email,
            user.display_name(),
            &format!("{}/dashboard", origin.trim_end_matches('/')),
        );
        if let Err(e) = self.email.send("welcome", welcome).await {
            warn!(user_id = user.id, error = %e, "欢迎邮件发送失败");
        }

        Ok(user.into())
    }

    /// 邮箱密码登录
    #[instrument(skip(self, password))]
    pub async fn login(&self, email: &str, password: &str) -> Result<LoginOutcome> {
        let email = Self::normalize_email(email);
        let user = self
            .user_repo
            .find_by_email(&email)
            .await?
            .ok_or(ApiError::InvalidCredentials)?;

        let Some(hash) = user.password_hash.as_deref() else {
            return Err(ApiError::InvalidCredentials);
        };
        if !verify_password(password, hash)? {
            return Err(ApiError::InvalidCredentials);
        }

        self.user_repo.touch_last_signed_in(user.id).await?;
        let (token, expires_at) = self.jwt.generate_token(user.id, &user.email, user.role)?;

        info!(user_id = user.id, "用户登录");

        Ok(LoginOutcome {
            token,
            expires_at,
            user: user.into(),
        })
    }

    /// 按会话中的用户 ID 加载用户（已删除的用户返回 None）
    pub async fn current_user(&self, user_id: i64) -> Result<Option<User>> {
        self.user_repo.find_by_id(user_id).await
    }

    /// 申请密码重置
    ///
    /// 未知邮箱直接返回成功，不暴露账号是否存在。
    #[instrument(skip(self))]
    pub async fn request_password_reset(&self, email: &str, origin: &str) -> Result<()> {
        let email = Self::normalize_email(email);
        let Some(user) = self.user_repo.find_by_email(&email).await? else {
            info!("密码重置请求的邮箱不存在");
            return Ok(());
        };

        let token = generate_reset_token();
        let expires_at = Utc::now() + self.reset_ttl;
        self.user_repo
            .set_reset_token(user.id, &hash_reset_token(&token), expires_at)
            .await?;

        let reset_url = format!(
            "{}/reset-password?token={}",
            origin.trim_end_matches('/'),
            token
        );
        let message = templates::password_reset(&user.email, user.display_name(), &reset_url);

        self.email.send("password_reset", message).await.map_err(|e| {
            warn!(user_id = user.id, error = %e, "密码重置邮件发送失败");
            ApiError::EmailDelivery("Failed to send password reset email".to_string())
        })?;

        info!(user_id = user.id, "密码重置邮件已发送");
        Ok(())
    }

    /// 使用重置 Token 设置新密码
    #[instrument(skip_all)]
    pub async fn reset_password(&self, token: &str, password: &str) -> Result<()> {
        let user = self
            .user_repo
            .find_by_reset_token_hash(&hash_reset_token(token))
            .await?
            .ok_or(ApiError::InvalidResetToken)?;

        match user.password_reset_expires_at {
            Some(expires_at) if expires_at > Utc::now() => {}
            _ => return Err(ApiError::ResetTokenExpired),
        }

        self.user_repo
            .update_password(user.id, &hash_password(password)?)
            .await?;

        info!(user_id = user.id, "密码已重置");
        Ok(())
    }

    /// 修改显示名称并推送排行榜
    #[instrument(skip(self))]
    pub async fn update_display_name(&self, user_id: i64, name: &str) -> Result<()> {
        self.user_repo.update_name(user_id, name.trim()).await?;
        self.leaderboard.broadcast_current().await;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::JwtConfig;
    use crate::email::{EmailError, MockEmailSender};
    use crate::notifier::MockOwnerNotifier;
    use crate::realtime::ConnectionRegistry;
    use crate::repository::{
        MockActivityRepositoryTrait, MockPreferenceRepositoryTrait, MockSnapshotRepositoryTrait,
        MockUserRepositoryTrait,
    };

    const ORIGIN: &str = "https://challenge.example.com";

    fn user(id: i64, email: &str, password_hash: Option<String>) -> User {
        let now = Utc::now();
        User {
            id,
            name: Some("Amina".to_string()),
            email: email.to_string(),
            password_hash,
            email_verified: false,
            password_reset_token_hash: None,
            password_reset_expires_at: None,
            login_method: "email".to_string(),
            role: UserRole::User,
            created_at: now,
            updated_at: now,
            last_signed_in_at: None,
        }
    }

    struct Mocks {
        users: MockUserRepositoryTrait,
        prefs: MockPreferenceRepositoryTrait,
        email: MockEmailSender,
        leaderboard_activity: MockActivityRepositoryTrait,
    }

    impl Mocks {
        fn new() -> Self {
            Self {
                users: MockUserRepositoryTrait::new(),
                prefs: MockPreferenceRepositoryTrait::new(),
                email: MockEmailSender::new(),
                leaderboard_activity: MockActivityRepositoryTrait::new(),
            }
        }

        fn build(self) -> AuthService {
            let leaderboard = Arc::new(LeaderboardService::new(
                Arc::new(self.leaderboard_activity),
                Arc::new(MockSnapshotRepositoryTrait::new()),
                Arc::new(MockUserRepositoryTrait::new()),
                Arc::new(MockEmailSender::new()),
                Arc::new(MockOwnerNotifier::new()),
                Arc::new(ConnectionRegistry::new(4)),
                ORIGIN,
            ));
            AuthService::new(
                Arc::new(self.users),
                Arc::new(self.prefs),
                Arc::new(self.email),
                JwtManager::new(JwtConfig::default()),
                leaderboard,
                Some("Owner@Example.com".to_string()),
                3600,
            )
        }
    }

    fn expect_create(users: &mut MockUserRepositoryTrait) {
        users.expect_create().returning(|new_user| {
            let mut created = user(10, &new_user.email, Some(new_user.password_hash.clone()));
            created.name = Some(new_user.name.clone());
            created.role = new_user.role;
            Ok(created)
        });
    }

    #[tokio::test]
    async fn test_register_creates_user_with_defaults() {
        let mut mocks = Mocks::new();
        mocks.users.expect_find_by_email().returning(|_| Ok(None));
        expect_create(&mut mocks.users);
        mocks.prefs.expect_create_default().times(1).returning(|_| Ok(()));
        mocks
            .email
            .expect_send()
            .withf(|kind, message| kind.to_string() == "welcome" && message.to == "new@example.com")
            .times(1)
            .returning(|_, _| Ok(()));

        let user = mocks
            .build()
            .register(" New@Example.com ", "  Amina  ", "secret1", ORIGIN)
            .await
            .unwrap();

        assert_eq!(user.email, "new@example.com");
        assert_eq!(user.name.as_deref(), Some("Amina"));
        assert_eq!(user.role, UserRole::User);
    }

    #[tokio::test]
    async fn test_register_owner_becomes_admin_and_email_failure_is_ignored() {
        let mut mocks = Mocks::new();
        mocks.users.expect_find_by_email().returning(|_| Ok(None));
        expect_create(&mut mocks.users);
        mocks.prefs.expect_create_default().returning(|_| Ok(()));
        mocks
            .email
            .expect_send()
            .returning(|_, _| Err(EmailError::NotConfigured));

        let user = mocks
            .build()
            .register("owner@example.com", "Owner", "secret1", ORIGIN)
            .await
            .unwrap();

        assert_eq!(user.role, UserRole::Admin);
    }

    #[tokio::test]
    async fn test_register_duplicate_email() {
        let mut mocks = Mocks::new();
        mocks
            .users
            .expect_find_by_email()
            .returning(|email| Ok(Some(user(1, email, None))));

        let err = mocks
            .build()
            .register("taken@example.com", "Amina", "secret1", ORIGIN)
            .await
            .unwrap_err();

        assert!(matches!(err, ApiError::EmailTaken));
        assert_eq!(err.to_string(), "Email already registered");
    }

    #[tokio::test]
    async fn test_login_success_issues_token() {
        let hash = hash_password("secret1").unwrap();
        let mut mocks = Mocks::new();
        mocks
            .users
            .expect_find_by_email()
            .returning(move |email| Ok(Some(user(5, email, Some(hash.clone())))));
        mocks
            .users
            .expect_touch_last_signed_in()
            .withf(|id| *id == 5)
            .times(1)
            .returning(|_| Ok(()));

        let service = mocks.build();
        let outcome = service.login("amina@example.com", "secret1").await.unwrap();

        assert_eq!(outcome.user.id, 5);
        let claims = JwtManager::new(JwtConfig::default())
            .verify_token(&outcome.token)
            .unwrap();
        assert_eq!(claims.user_id().unwrap(), 5);
    }

    #[tokio::test]
    async fn test_login_wrong_password_or_unknown_email() {
        let hash = hash_password("secret1").unwrap();
        let mut mocks = Mocks::new();
        mocks.users.expect_find_by_email().returning(move |email| {
            if email == "amina@example.com" {
                Ok(Some(user(5, email, Some(hash.clone()))))
            } else {
                Ok(None)
            }
        });
        let service = mocks.build();

        let wrong = service.login("amina@example.com", "nope").await.unwrap_err();
        let unknown = service.login("ghost@example.com", "secret1").await.unwrap_err();

        for err in [wrong, unknown] {
            assert!(matches!(err, ApiError::InvalidCredentials));
            assert_eq!(err.to_string(), "Invalid email or password");
        }
    }

    #[tokio::test]
    async fn test_reset_request_unknown_email_is_silent() {
        let mut mocks = Mocks::new();
        mocks.users.expect_find_by_email().returning(|_| Ok(None));
        mocks.users.expect_set_reset_token().never();
        mocks.email.expect_send().never();

        mocks
            .build()
            .request_password_reset("ghost@example.com", ORIGIN)
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_reset_request_stores_hash_and_emails_link() {
        let mut mocks = Mocks::new();
        mocks
            .users
            .expect_find_by_email()
            .returning(|email| Ok(Some(user(5, email, None))));
        mocks
            .users
            .expect_set_reset_token()
            .withf(|id, token_hash, expires_at| {
                *id == 5 && token_hash.len() == 64 && *expires_at > Utc::now() + Duration::minutes(59)
            })
            .times(1)
            .returning(|_, _, _| Ok(()));
        mocks
            .email
            .expect_send()
            .withf(|_, message| {
                message
                    .html
                    .contains("https://challenge.example.com/reset-password?token=")
            })
            .times(1)
            .returning(|_, _| Ok(()));

        mocks
            .build()
            .request_password_reset("amina@example.com", ORIGIN)
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_reset_request_email_failure_is_error() {
        let mut mocks = Mocks::new();
        mocks
            .users
            .expect_find_by_email()
            .returning(|email| Ok(Some(user(5, email, None))));
        mocks.users.expect_set_reset_token().returning(|_, _, _| Ok(()));
        mocks
            .email
            .expect_send()
            .returning(|_, _| Err(EmailError::Request("timeout".into())));

        let err = mocks
            .build()
            .request_password_reset("amina@example.com", ORIGIN)
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "Failed to send password reset email");
    }

    #[tokio::test]
    async fn test_reset_password_token_states() {
        let mut mocks = Mocks::new();
        let valid_hash = hash_reset_token("valid-token");
        let expired_hash = hash_reset_token("expired-token");
        mocks
            .users
            .expect_find_by_reset_token_hash()
            .returning(move |hash| {
                let mut found = user(5, "amina@example.com", None);
                if hash == valid_hash {
                    found.password_reset_expires_at = Some(Utc::now() + Duration::minutes(30));
                    Ok(Some(found))
                } else if hash == expired_hash {
                    found.password_reset_expires_at = Some(Utc::now() - Duration::minutes(1));
                    Ok(Some(found))
                } else {
                    Ok(None)
                }
            });
        mocks
            .users
            .expect_update_password()
            .withf(|id, hash| *id == 5 && hash.starts_with("$2"))
            .times(1)
            .returning(|_, _| Ok(()));
        let service = mocks.build();

        service.reset_password("valid-token", "newpass1").await.unwrap();

        let expired = service.reset_password("expired-token", "newpass1").await.unwrap_err();
        assert_eq!(
            expired.to_string(),
            "Reset token has expired. Please request a new one."
        );

        let unknown = service.reset_password("bogus", "newpass1").await.unwrap_err();
        assert_eq!(unknown.to_string(), "Invalid or expired reset token");
    }

    #[tokio::test]
    async fn test_update_display_name_trims_and_broadcasts() {
        let mut mocks = Mocks::new();
        mocks
            .users
            .expect_update_name()
            .withf(|id, name| *id == 5 && name.to_string() == "Yusuf")
            .times(1)
            .returning(|_, _| Ok(()));
        mocks
            .leaderboard_activity
            .expect_user_totals()
            .times(1)
            .returning(|| Ok(vec![]));

        mocks.build().update_display_name(5, "  Yusuf ").await.unwrap();
    }
}
