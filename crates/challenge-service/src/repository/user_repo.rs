//! 用户仓储

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;

use super::traits::{NewUser, Recipient, UserRepositoryTrait};
use crate::error::Result;
use crate::models::{User, UserOverview};

const USER_COLUMNS: &str = r#"
    id, name, email, password_hash, email_verified, password_reset_token_hash,
    password_reset_expires_at, login_method, role, created_at, updated_at, last_signed_in_at
"#;

pub struct UserRepository {
    pool: PgPool,
}

impl UserRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn find_one(&self, condition: &str, value: &str) -> Result<Option<User>> {
        let sql = format!("SELECT {} FROM users WHERE {} = $1", USER_COLUMNS, condition);
        let user = sqlx::query_as::<_, User>(&sql)
            .bind(value)
            .fetch_optional(&self.pool)
            .await?;
        Ok(user)
    }
}

#[async_trait]
impl UserRepositoryTrait for UserRepository {
    async fn find_by_id(&self, id: i64) -> Result<Option<User>> {
        let sql = format!("SELECT {} FROM users WHERE id = $1", USER_COLUMNS);
        let user = sqlx::query_as::<_, User>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(user)
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>> {
        self.find_one("email", email).await
    }

    async fn find_by_reset_token_hash(&self, token_hash: &str) -> Result<Option<User>> {
        self.find_one("password_reset_token_hash", token_hash).await
    }

    async fn create(&self, user: &NewUser) -> Result<User> {
        let sql = format!(
            r#"
            INSERT INTO users (email, name, password_hash, login_method, role)
            VALUES ($1, $2, $3, 'email', $4)
            RETURNING {}
            "#,
            USER_COLUMNS
        );
        let created = sqlx::query_as::<_, User>(&sql)
            .bind(&user.email)
            .bind(&user.name)
            .bind(&user.password_hash)
            .bind(user.role)
            .fetch_one(&self.pool)
            .await?;
        Ok(created)
    }

    async fn touch_last_signed_in(&self, id: i64) -> Result<()> {
        sqlx::query("UPDATE users SET last_signed_in_at = NOW(), updated_at = NOW() WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn set_reset_token(
        &self,
        id: i64,
        token_hash: &str,
        expires_at: DateTime<Utc>,
    ) -> Result<()> {
        sqlx::query(
            r#"
            UPDATE users
            SET password_reset_token_hash = $2, password_reset_expires_at = $3, updated_at = NOW()
            WHERE id = $1
            "#,
        )
        .bind(id)
        .bind(token_hash)
        .bind(expires_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn update_password(&self, id: i64, password_hash: &str) -> Result<()> {
        sqlx::query(
            r#"
            UPDATE users
            SET password_hash = $2,
                password_reset_token_hash = NULL,
                password_reset_expires_at = NULL,
                updated_at = NOW()
            WHERE id = $1
            "#,
        )
        .bind(id)
        .bind(password_hash)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn update_name(&self, id: i64, name: &str) -> Result<()> {
        sqlx::query("UPDATE users SET name = $2, updated_at = NOW() WHERE id = $1")
            .bind(id)
            .bind(name)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn list_overview(&self) -> Result<Vec<UserOverview>> {
        let users = sqlx::query_as::<_, UserOverview>(
            r#"
            SELECT u.id, u.name, u.email, u.role, u.created_at, u.last_signed_in_at,
                   COUNT(a.id) AS activity_count,
                   COALESCE(SUM(a.total_points), 0)::BIGINT AS total_points
            FROM users u
            LEFT JOIN daily_activities a ON a.user_id = u.id
            GROUP BY u.id
            ORDER BY total_points DESC, u.id ASC
            "#,
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(users)
    }

    async fn list_leaderboard_recipients(&self) -> Result<Vec<Recipient>> {
        let recipients = sqlx::query_as::<_, Recipient>(
            r#"
            SELECT u.id AS user_id, u.email, u.name
            FROM users u
            LEFT JOIN user_preferences p ON p.user_id = u.id
            WHERE COALESCE(p.notify_on_leaderboard, TRUE)
            ORDER BY u.id
            "#,
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(recipients)
    }
}
